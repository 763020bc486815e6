//! Domain models shared by the request and response sides.
//!
//! `Route` and its parts serialize to the same camelCase shape the optimizer
//! answers with, so a reconciled route can be fed back through the
//! reconciler unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::polyline::Polyline;

/// A latitude/longitude pair.
///
/// Always holds finite, in-range coordinates: anything else collapses to
/// `{0, 0}` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        if Self::is_valid(latitude, longitude) {
            Self {
                latitude,
                longitude,
            }
        } else {
            Self::default()
        }
    }

    fn is_valid(latitude: f64, longitude: f64) -> bool {
        latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
    }

    /// Coordinates as a (lat, lng) tuple.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A reportable water point eligible for inclusion in a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePoint {
    pub id: String,
    pub location: GeoPoint,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CandidatePoint {
    pub fn new(id: impl Into<String>, location: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location,
            address: address.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A stop on a reconciled route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub node_id: String,
    pub location: GeoPoint,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A leg between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub from: RoutePoint,
    pub to: RoutePoint,
    /// Kilometers, never negative.
    pub distance: f64,
    pub polyline: Polyline,
}

/// Canonical route representation produced by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub owner_id: String,
    pub candidate_ids: Vec<String>,
    pub points: Vec<RoutePoint>,
    pub segments: Vec<RouteSegment>,
    /// Kilometers, never negative.
    pub total_distance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    /// Serializes the route back into the optimizer's response shape.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Number of water points the route visits.
    pub fn stop_count(&self) -> usize {
        self.candidate_ids.len()
    }

    pub fn distance_km_label(&self) -> String {
        format!("{:.1} km", self.total_distance)
    }
}
