//! aquaroute core
//!
//! Request/response reconciliation for an external water-point route
//! optimizer: selection state, request building, tolerant response decoding,
//! telemetry, error categories and the session state machine.

pub mod traits;
pub mod model;
pub mod polyline;
pub mod coerce;
pub mod selection;
pub mod params;
pub mod request;
pub mod reconcile;
pub mod telemetry;
pub mod errors;
pub mod session;
pub mod controller;
pub mod optimizer;
pub mod store;
