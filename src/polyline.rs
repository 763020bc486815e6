//! Polyline representation for segment geometries.
//!
//! The optimizer sends segment geometry as a list of decoded coordinates.
//! This type keeps it that way internally; drawing is left to the caller.

use serde::{Deserialize, Serialize};

use crate::model::GeoPoint;

/// A segment geometry as an ordered list of coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box as (south-west, north-east), or `None` for an empty line.
    pub fn bounds(&self) -> Option<(GeoPoint, GeoPoint)> {
        let first = self.points.first()?;
        let (mut min, mut max) = (*first, *first);
        for point in &self.points {
            min.latitude = min.latitude.min(point.latitude);
            min.longitude = min.longitude.min(point.longitude);
            max.latitude = max.latitude.max(point.latitude);
            max.longitude = max.longitude.max(point.longitude);
        }
        Some((min, max))
    }
}
