//! Collaborator seams of the optimization core.
//!
//! The controller only talks to the outside world through these traits.
//! Concrete apps (or tests) plug in their own implementations.

use std::sync::Arc;

use serde_json::Value;

use crate::errors::{CollaboratorError, FailureSignal};
use crate::model::{CandidatePoint, Route};
use crate::request::OptimizationRequest;

/// The external route optimizer.
///
/// Returns the raw response body; no shape is assumed.
pub trait Optimizer: Send + Sync {
    fn optimize(&self, request: &OptimizationRequest) -> Result<Value, FailureSignal>;
}

/// Pre-flight health check run before every optimization request.
pub trait ConnectivityProbe: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Best-effort storage for reconciled routes.
pub trait RouteStore: Send + Sync {
    fn save_route(&self, route: &Route) -> Result<(), CollaboratorError>;
}

/// Supplies the selectable water points. Read-only to the core.
pub trait CandidateSource: Send + Sync {
    fn candidates(&self) -> Result<Vec<CandidatePoint>, CollaboratorError>;
}

impl CandidateSource for Vec<CandidatePoint> {
    fn candidates(&self) -> Result<Vec<CandidatePoint>, CollaboratorError> {
        Ok(self.clone())
    }
}

impl<T: Optimizer + ?Sized> Optimizer for Arc<T> {
    fn optimize(&self, request: &OptimizationRequest) -> Result<Value, FailureSignal> {
        (**self).optimize(request)
    }
}

impl<T: ConnectivityProbe + ?Sized> ConnectivityProbe for Arc<T> {
    fn is_reachable(&self) -> bool {
        (**self).is_reachable()
    }
}

impl<T: RouteStore + ?Sized> RouteStore for Arc<T> {
    fn save_route(&self, route: &Route) -> Result<(), CollaboratorError> {
        (**self).save_route(route)
    }
}

impl<T: CandidateSource + ?Sized> CandidateSource for Arc<T> {
    fn candidates(&self) -> Result<Vec<CandidatePoint>, CollaboratorError> {
        (**self).candidates()
    }
}

/// A probe that always passes, for deployments without a health endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

impl ConnectivityProbe for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}
