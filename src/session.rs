//! Optimization session state machine.
//!
//! `Session` is a plain reducer: every transition is a method call and
//! nothing here touches the network. Results carry the sequence number of
//! the request that produced them and are dropped when that number is no
//! longer current or the session has been invalidated meanwhile.

use crate::errors::ErrorCategory;
use crate::model::Route;
use crate::telemetry::OptimizationTelemetry;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Validating,
    Requesting,
    Reconciling,
    /// Route and telemetry always come from the same run.
    Ready {
        route: Route,
        telemetry: Option<OptimizationTelemetry>,
    },
    Error(ErrorCategory),
}

impl SessionState {
    /// True while a request owns the session.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::Validating | SessionState::Requesting | SessionState::Reconciling
        )
    }

    pub fn route(&self) -> Option<&Route> {
        match self {
            SessionState::Ready { route, .. } => Some(route),
            _ => None,
        }
    }

    pub fn telemetry(&self) -> Option<&OptimizationTelemetry> {
        match self {
            SessionState::Ready { telemetry, .. } => telemetry.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorCategory> {
        match self {
            SessionState::Error(category) => Some(category),
            _ => None,
        }
    }
}

/// The terminal result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ready {
        route: Route,
        telemetry: Option<OptimizationTelemetry>,
    },
    Failed(ErrorCategory),
}

impl From<Outcome> for SessionState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Ready { route, telemetry } => SessionState::Ready { route, telemetry },
            Outcome::Failed(category) => SessionState::Error(category),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    sequence: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Sequence number of the most recently started request.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Starts a new request, superseding any in flight. Returns its sequence.
    pub fn begin(&mut self) -> u64 {
        self.sequence += 1;
        self.state = SessionState::Validating;
        self.sequence
    }

    fn is_current(&self, sequence: u64) -> bool {
        sequence == self.sequence && self.state.is_busy()
    }

    /// Moves a current request on to `Requesting`.
    pub fn requesting(&mut self, sequence: u64) -> bool {
        self.advance(sequence, SessionState::Requesting)
    }

    /// Moves a current request on to `Reconciling`.
    pub fn reconciling(&mut self, sequence: u64) -> bool {
        self.advance(sequence, SessionState::Reconciling)
    }

    fn advance(&mut self, sequence: u64, next: SessionState) -> bool {
        if !self.is_current(sequence) {
            return false;
        }
        self.state = next;
        true
    }

    /// Applies a terminal outcome. Stale or invalidated requests are ignored.
    pub fn complete(&mut self, sequence: u64, outcome: Outcome) -> bool {
        self.advance(sequence, outcome.into())
    }

    /// Drops any result or in-flight request and returns to `Idle`.
    ///
    /// The sequence is left alone; in-flight requests are shut out because
    /// the session is no longer busy.
    pub fn invalidate(&mut self) {
        self.state = SessionState::Idle;
    }
}
