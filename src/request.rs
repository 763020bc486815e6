//! Validated, immutable optimization requests.

use serde::Serialize;

use crate::model::{CandidatePoint, GeoPoint};
use crate::params::Hyperparameters;

/// Why a request could not be built. Raised before any network call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("no water points selected")]
    EmptySelection,
    #[error("origin location is missing")]
    MissingOrigin,
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Everything the optimizer needs for one run. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRequest {
    candidates: Vec<CandidatePoint>,
    origin: GeoPoint,
    owner_id: String,
    params: Hyperparameters,
}

impl OptimizationRequest {
    pub fn candidates(&self) -> &[CandidatePoint] {
        &self.candidates
    }

    pub fn candidate_ids(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.id.clone()).collect()
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    /// Wire body for the optimizer service.
    pub fn payload(&self) -> RequestPayload<'_> {
        RequestPayload {
            candidates: self
                .candidates
                .iter()
                .map(|candidate| CandidatePayload {
                    id: &candidate.id,
                    latitude: candidate.location.latitude,
                    longitude: candidate.location.longitude,
                    address: &candidate.address,
                })
                .collect(),
            origin: self.origin,
            owner_id: &self.owner_id,
            hyperparameters: HyperparametersPayload::from(&self.params),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestPayload<'a> {
    pub candidates: Vec<CandidatePayload<'a>>,
    pub origin: GeoPoint,
    pub owner_id: &'a str,
    pub hyperparameters: HyperparametersPayload,
}

#[derive(Debug, Serialize)]
pub struct CandidatePayload<'a> {
    pub id: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub address: &'a str,
}

#[derive(Debug, Serialize)]
pub struct HyperparametersPayload {
    pub population_size: u32,
    pub max_generations: u32,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elite_size: u32,
    pub tournament_size: u32,
    pub max_route_length: u32,
    pub time_limit: u32,
    pub convergence_threshold: f64,
}

impl From<&Hyperparameters> for HyperparametersPayload {
    fn from(params: &Hyperparameters) -> Self {
        Self {
            population_size: params.population_size,
            max_generations: params.max_generations,
            mutation_rate: params.mutation_rate,
            crossover_rate: params.crossover_rate,
            elite_size: params.elite_size(),
            tournament_size: params.tournament_size(),
            max_route_length: params.max_route_length,
            time_limit: params.time_limit_secs,
            convergence_threshold: params.convergence_threshold,
        }
    }
}

/// Assembles an [`OptimizationRequest`], rejecting (never clamping) bad input.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    owner_id: String,
    candidates: Vec<CandidatePoint>,
    origin: Option<GeoPoint>,
    params: Hyperparameters,
}

impl RequestBuilder {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            candidates: Vec::new(),
            origin: None,
            params: Hyperparameters::default(),
        }
    }

    pub fn candidates(mut self, candidates: Vec<CandidatePoint>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn origin(mut self, origin: Option<GeoPoint>) -> Self {
        self.origin = origin;
        self
    }

    pub fn params(mut self, params: Hyperparameters) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<OptimizationRequest, ValidationError> {
        if self.candidates.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        let origin = self.origin.ok_or(ValidationError::MissingOrigin)?;
        if let Some((range, value)) = self.params.first_violation() {
            return Err(ValidationError::OutOfRange {
                field: range.field,
                value,
                min: range.min,
                max: range.max,
            });
        }

        Ok(OptimizationRequest {
            candidates: self.candidates,
            origin,
            owner_id: self.owner_id,
            params: self.params,
        })
    }
}
