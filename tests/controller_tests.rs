//! Session controller tests
//!
//! Validation, pre-flight checks, staleness, invalidation and best-effort
//! persistence, all against mock collaborators.

mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{Value, json};

use aquaroute::controller::{Collaborators, OptimizationSessionController, RunOutcome};
use aquaroute::errors::{CollaboratorError, ErrorCategory, FailureSignal};
use aquaroute::model::{CandidatePoint, Route};
use aquaroute::params::{Hyperparameters, Preset};
use aquaroute::request::{OptimizationRequest, ValidationError};
use aquaroute::session::SessionState;
use aquaroute::store::MemoryRouteStore;
use aquaroute::traits::{AlwaysReachable, ConnectivityProbe, Optimizer, RouteStore};

use fixtures::{ORIGIN, candidates, full_response, ids};

// ============================================================================
// Mock collaborators
// ============================================================================

/// Answers every call with the same canned result and counts calls.
struct ScriptedOptimizer {
    response: Result<Value, FailureSignal>,
    calls: AtomicUsize,
    last_request: Mutex<Option<OptimizationRequest>>,
}

impl ScriptedOptimizer {
    fn ok(response: Value) -> Self {
        Self {
            response: Ok(response),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    fn failing(signal: FailureSignal) -> Self {
        Self {
            response: Err(signal),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }
}

impl Optimizer for ScriptedOptimizer {
    fn optimize(&self, request: &OptimizationRequest) -> Result<Value, FailureSignal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.response.clone()
    }
}

/// Blocks the first call until released; later calls answer immediately.
///
/// Each call answers with a route id and fitness derived from its call number.
struct GatedOptimizer {
    calls: AtomicUsize,
    started: Mutex<Sender<usize>>,
    release: Mutex<Receiver<()>>,
}

impl GatedOptimizer {
    fn new() -> (Self, Receiver<usize>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let optimizer = Self {
            calls: AtomicUsize::new(0),
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        (optimizer, started_rx, release_tx)
    }
}

impl Optimizer for GatedOptimizer {
    fn optimize(&self, _request: &OptimizationRequest) -> Result<Value, FailureSignal> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.started.lock().unwrap().send(call).unwrap();
        if call == 1 {
            self.release.lock().unwrap().recv().unwrap();
        }
        let mut response = full_response(&format!("route-{}", call));
        response["optimization_stats"]["best_fitness"] = json!(call as f64);
        Ok(response)
    }
}

struct Unreachable;

impl ConnectivityProbe for Unreachable {
    fn is_reachable(&self) -> bool {
        false
    }
}

struct BrokenStore;

impl RouteStore for BrokenStore {
    fn save_route(&self, _route: &Route) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Storage("disk full".to_string()))
    }
}

type Controller<O, P, S> = OptimizationSessionController<O, P, S, Vec<CandidatePoint>>;

fn controller<O, P, S>(optimizer: O, probe: P, store: S) -> Controller<O, P, S>
where
    O: Optimizer,
    P: ConnectivityProbe,
    S: RouteStore,
{
    let controller = OptimizationSessionController::new(
        "inspector-7",
        Collaborators {
            optimizer,
            probe,
            store,
            source: candidates(),
        },
    );
    controller.refresh_candidates().unwrap();
    controller.set_origin(Some(ORIGIN));
    controller
}

/// Selects the first three fixture water points.
fn select_three<O, P, S>(controller: &Controller<O, P, S>)
where
    O: Optimizer,
    P: ConnectivityProbe,
    S: RouteStore,
{
    for id in ids(3) {
        controller.toggle(&id);
    }
}

fn route_id(state: &SessionState) -> Option<&str> {
    state.route().map(|route| route.id.as_str())
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn population_below_minimum_fails_without_network_call() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(full_response("r1")));
    let controller = controller(optimizer.clone(), AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);
    controller.set_params(Hyperparameters {
        population_size: 10,
        ..Preset::Balanced.hyperparameters()
    });

    let outcome = controller.optimize();

    let expected = SessionState::Error(ErrorCategory::Validation(ValidationError::OutOfRange {
        field: "populationSize",
        value: 10.0,
        min: 20.0,
        max: 200.0,
    }));
    assert_eq!(outcome, RunOutcome::Applied(expected.clone()));
    assert_eq!(controller.state(), expected);
    assert_eq!(optimizer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_selection_and_missing_origin_are_distinct() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(full_response("r1")));
    let controller = controller(optimizer.clone(), AlwaysReachable, MemoryRouteStore::new());

    controller.optimize();
    assert_eq!(
        controller.state().error(),
        Some(&ErrorCategory::Validation(ValidationError::EmptySelection))
    );

    select_three(&controller);
    controller.set_origin(None);
    controller.optimize();
    assert_eq!(
        controller.state().error(),
        Some(&ErrorCategory::Validation(ValidationError::MissingOrigin))
    );
    assert_eq!(optimizer.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Happy path and failures
// ============================================================================

#[test]
fn successful_run_is_ready_and_persisted() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(full_response("r-ok")));
    let store = Arc::new(MemoryRouteStore::new());
    let controller = controller(optimizer.clone(), AlwaysReachable, store.clone());
    select_three(&controller);
    controller.apply_preset(Preset::Fast);

    let outcome = controller.optimize();

    let RunOutcome::Applied(state) = outcome.clone() else {
        panic!("expected applied outcome, got {:?}", outcome);
    };
    assert_eq!(route_id(&state), Some("r-ok"));
    assert_eq!(state.telemetry().and_then(|t| t.best_fitness), Some(0.81));
    assert_eq!(controller.state(), state);
    assert!(store.get("r-ok").is_some());

    let sent = optimizer.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(sent.candidate_ids(), ids(3));
    assert_eq!(sent.params().population_size, 50);
    assert_eq!(sent.owner_id(), "inspector-7");
}

#[test]
fn partial_response_fills_selection() {
    let mut response = full_response("r-partial");
    response.as_object_mut().unwrap().remove("segments");
    let optimizer = Arc::new(ScriptedOptimizer::ok(response));
    let controller = controller(optimizer, AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);

    controller.optimize();

    let state = controller.state();
    let route = state.route().unwrap();
    assert!(route.segments.is_empty());
    assert_eq!(route.candidate_ids, ids(3));
}

#[test]
fn garbage_response_still_ends_ready() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(json!("<html>502 Bad Gateway</html>")));
    let controller = controller(optimizer, AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);

    controller.optimize();

    let state = controller.state();
    let route = state.route().expect("ready state");
    assert_eq!(route.candidate_ids, ids(3));
    assert!(route.points.is_empty());
    assert!(state.telemetry().is_none());
}

#[test]
fn service_failure_is_translated() {
    let optimizer = Arc::new(ScriptedOptimizer::failing(FailureSignal::Http {
        status: 503,
        body: "upstream busy".to_string(),
    }));
    let controller = controller(optimizer, AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);

    controller.optimize();

    assert_eq!(controller.state().error(), Some(&ErrorCategory::ServerError));
}

#[test]
fn failed_probe_short_circuits_to_network_error() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(full_response("r1")));
    let controller = controller(optimizer.clone(), Unreachable, MemoryRouteStore::new());
    select_three(&controller);

    controller.optimize();

    assert_eq!(controller.state().error(), Some(&ErrorCategory::NetworkError));
    assert_eq!(optimizer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn persistence_failure_keeps_ready() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(full_response("r-kept")));
    let controller = controller(optimizer, AlwaysReachable, BrokenStore);
    select_three(&controller);

    controller.optimize();

    assert_eq!(route_id(&controller.state()), Some("r-kept"));
}

#[test]
fn retry_after_error_issues_fresh_request() {
    let optimizer = Arc::new(ScriptedOptimizer::failing(FailureSignal::Timeout));
    let controller = controller(optimizer.clone(), AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);

    controller.optimize();
    controller.optimize();

    assert_eq!(controller.state().error(), Some(&ErrorCategory::Timeout));
    assert_eq!(controller.sequence(), 2);
    assert_eq!(optimizer.calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Selection invalidation
// ============================================================================

#[test]
fn every_selection_mutation_returns_to_idle() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(full_response("r1")));
    let controller = controller(optimizer, AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);

    let mutations: [&dyn Fn(); 4] = [
        &|| controller.toggle("wp-dunga"),
        &|| controller.select_all(),
        &|| controller.deselect_all(),
        &|| controller.toggle("wp-not-a-point"),
    ];
    for mutate in mutations {
        controller.select_all();
        controller.optimize();
        assert!(controller.state().route().is_some());
        mutate();
        assert_eq!(controller.state(), SessionState::Idle);
    }
}

#[test]
fn error_state_is_cleared_by_selection_change() {
    let optimizer = Arc::new(ScriptedOptimizer::failing(FailureSignal::Unreachable));
    let controller = controller(optimizer, AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);
    controller.optimize();
    assert!(controller.state().error().is_some());

    controller.toggle("wp-kondele");

    assert_eq!(controller.state(), SessionState::Idle);
}

// ============================================================================
// Staleness
// ============================================================================

#[test]
fn newer_request_wins_over_late_older_response() {
    let (optimizer, started, release) = GatedOptimizer::new();
    let controller = controller(optimizer, AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);

    thread::scope(|scope| {
        let first = scope.spawn(|| controller.optimize());
        assert_eq!(started.recv().unwrap(), 1);
        assert_eq!(controller.state(), SessionState::Requesting);

        let second = controller.optimize();
        assert_eq!(started.recv().unwrap(), 2);
        let RunOutcome::Applied(state) = second.clone() else {
            panic!("second request should apply, got {:?}", second);
        };
        assert_eq!(route_id(&state), Some("route-2"));

        release.send(()).unwrap();
        assert_eq!(first.join().unwrap(), RunOutcome::Discarded { sequence: 1 });
    });

    let state = controller.state();
    assert_eq!(route_id(&state), Some("route-2"));
    assert_eq!(state.telemetry().and_then(|t| t.best_fitness), Some(2.0));
}

#[test]
fn selection_change_during_request_discards_result() {
    let (optimizer, started, release) = GatedOptimizer::new();
    let store = Arc::new(MemoryRouteStore::new());
    let controller = controller(optimizer, AlwaysReachable, store.clone());
    select_three(&controller);

    thread::scope(|scope| {
        let in_flight = scope.spawn(|| controller.optimize());
        started.recv().unwrap();

        controller.toggle("wp-dunga");
        assert_eq!(controller.state(), SessionState::Idle);

        release.send(()).unwrap();
        assert_eq!(in_flight.join().unwrap(), RunOutcome::Discarded { sequence: 1 });
    });

    assert_eq!(controller.state(), SessionState::Idle);
    assert!(store.routes().is_empty());
}

// ============================================================================
// Candidates
// ============================================================================

#[test]
fn refresh_keeps_surviving_selection() {
    let optimizer = Arc::new(ScriptedOptimizer::ok(full_response("r1")));
    let controller = controller(optimizer, AlwaysReachable, MemoryRouteStore::new());
    select_three(&controller);

    assert_eq!(controller.refresh_candidates().unwrap(), 5);
    assert_eq!(controller.selected_ids(), ids(3));
    assert_eq!(controller.candidates().len(), 5);
}
