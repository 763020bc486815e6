//! Orchestrates one user's optimization session.
//!
//! The controller owns the selection and the [`Session`] reducer behind a
//! single lock. The optimizer call is the only place it blocks, and it does
//! so without holding the lock, so selection edits and newer `optimize`
//! calls are never held up by a slow service.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use crate::errors::{CollaboratorError, ErrorCategory, translate};
use crate::model::{CandidatePoint, GeoPoint, Route};
use crate::params::{Hyperparameters, Preset};
use crate::reconcile::{ReconcileContext, reconcile};
use crate::request::{OptimizationRequest, RequestBuilder, ValidationError};
use crate::selection::SelectionState;
use crate::session::{Outcome, Session, SessionState};
use crate::telemetry;
use crate::traits::{CandidateSource, ConnectivityProbe, Optimizer, RouteStore};

/// External services handed to the controller.
pub struct Collaborators<O, P, S, C> {
    pub optimizer: O,
    pub probe: P,
    pub store: S,
    pub source: C,
}

/// What became of one `optimize` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The call's result is now the visible state.
    Applied(SessionState),
    /// A newer call or a selection change overtook this one.
    Discarded { sequence: u64 },
}

#[derive(Debug, Default)]
struct Inner {
    selection: SelectionState,
    session: Session,
    origin: Option<GeoPoint>,
    params: Hyperparameters,
}

impl Inner {
    fn build_request(&self, owner_id: &str) -> Result<OptimizationRequest, ValidationError> {
        RequestBuilder::new(owner_id)
            .candidates(self.selection.selected())
            .origin(self.origin)
            .params(self.params)
            .build()
    }
}

pub struct OptimizationSessionController<O, P, S, C> {
    owner_id: String,
    optimizer: O,
    probe: P,
    store: S,
    source: C,
    inner: Mutex<Inner>,
}

impl<O, P, S, C> OptimizationSessionController<O, P, S, C>
where
    O: Optimizer,
    P: ConnectivityProbe,
    S: RouteStore,
    C: CandidateSource,
{
    /// Creates an idle controller with no candidates loaded yet.
    pub fn new(owner_id: impl Into<String>, collaborators: Collaborators<O, P, S, C>) -> Self {
        let Collaborators {
            optimizer,
            probe,
            store,
            source,
        } = collaborators;

        Self {
            owner_id: owner_id.into(),
            optimizer,
            probe,
            store,
            source,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reloads candidates from the source. Returns how many were loaded.
    pub fn refresh_candidates(&self) -> Result<usize, CollaboratorError> {
        let candidates = self.source.candidates()?;
        let count = candidates.len();
        let mut inner = self.lock();
        inner.selection.replace_candidates(candidates);
        inner.session.invalidate();
        Ok(count)
    }

    pub fn candidates(&self) -> Vec<CandidatePoint> {
        self.lock().selection.candidates().to_vec()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.lock().selection.selected_ids()
    }

    pub fn toggle(&self, id: &str) {
        self.mutate_selection(|selection| selection.toggle(id));
    }

    pub fn select_all(&self) {
        self.mutate_selection(SelectionState::select_all);
    }

    pub fn deselect_all(&self) {
        self.mutate_selection(SelectionState::deselect_all);
    }

    fn mutate_selection(&self, mutate: impl FnOnce(&mut SelectionState)) {
        let mut inner = self.lock();
        mutate(&mut inner.selection);
        inner.session.invalidate();
        debug!(selected = inner.selection.len(), "selection changed, session idle");
    }

    pub fn set_origin(&self, origin: Option<GeoPoint>) {
        self.lock().origin = origin;
    }

    pub fn set_params(&self, params: Hyperparameters) {
        self.lock().params = params;
    }

    pub fn apply_preset(&self, preset: Preset) {
        self.set_params(preset.hyperparameters());
    }

    pub fn params(&self) -> Hyperparameters {
        self.lock().params
    }

    pub fn state(&self) -> SessionState {
        self.lock().session.state().clone()
    }

    pub fn sequence(&self) -> u64 {
        self.lock().session.sequence()
    }

    /// Runs one optimization. A call made while another is in flight
    /// supersedes it; the older call still finishes but its result is dropped.
    #[instrument(level = "debug", skip(self), fields(owner_id = %self.owner_id))]
    pub fn optimize(&self) -> RunOutcome {
        let (sequence, request) = {
            let mut inner = self.lock();
            let sequence = inner.session.begin();
            match inner.build_request(&self.owner_id) {
                Ok(request) => {
                    inner.session.requesting(sequence);
                    (sequence, request)
                }
                Err(err) => {
                    debug!(sequence, error = %err, "request rejected before sending");
                    inner
                        .session
                        .complete(sequence, Outcome::Failed(ErrorCategory::Validation(err)));
                    return RunOutcome::Applied(inner.session.state().clone());
                }
            }
        };

        let raw = match self.call_optimizer(&request) {
            Ok(raw) => raw,
            Err(category) => return self.finish(sequence, Outcome::Failed(category)),
        };

        if !self.lock().session.reconciling(sequence) {
            return self.discarded(sequence);
        }

        let context = ReconcileContext::new(request.owner_id(), request.candidate_ids());
        let reconciled = reconcile(&raw, &context);
        debug!(
            sequence,
            tier = ?reconciled.tier,
            route_id = %reconciled.route.id,
            "response reconciled"
        );
        let route = reconciled.route;
        let telemetry = telemetry::extract(&raw);

        let outcome = self.finish(
            sequence,
            Outcome::Ready {
                route: route.clone(),
                telemetry,
            },
        );
        if matches!(outcome, RunOutcome::Applied(_)) {
            self.persist(&route);
        }
        outcome
    }

    fn call_optimizer(
        &self,
        request: &OptimizationRequest,
    ) -> Result<serde_json::Value, ErrorCategory> {
        if !self.probe.is_reachable() {
            return Err(ErrorCategory::NetworkError);
        }
        self.optimizer.optimize(request).map_err(|signal| {
            let category = translate(&signal);
            warn!(?signal, %category, "optimization request failed");
            category
        })
    }

    fn finish(&self, sequence: u64, outcome: Outcome) -> RunOutcome {
        let mut inner = self.lock();
        if inner.session.complete(sequence, outcome) {
            debug!(sequence, "result applied");
            RunOutcome::Applied(inner.session.state().clone())
        } else {
            drop(inner);
            self.discarded(sequence)
        }
    }

    fn discarded(&self, sequence: u64) -> RunOutcome {
        debug!(sequence, "stale result discarded");
        RunOutcome::Discarded { sequence }
    }

    fn persist(&self, route: &Route) {
        if let Err(err) = self.store.save_route(route) {
            warn!(route_id = %route.id, error = %err, "failed to persist route");
        }
    }
}
