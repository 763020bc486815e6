//! Test fixtures for aquaroute.
//!
//! Provides:
//! - Water points around Kisumu for selection and request tests
//! - Canned optimizer responses, well-formed and broken

pub mod water_points;

pub use water_points::*;
