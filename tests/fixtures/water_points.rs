//! Water points around Kisumu, Kenya, plus canned optimizer responses.

use aquaroute::model::{CandidatePoint, GeoPoint};
use serde_json::{Value, json};

/// A named water point with coordinates.
#[derive(Debug, Clone)]
pub struct WaterPoint {
    pub id: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl WaterPoint {
    pub const fn new(id: &'static str, name: &'static str, lat: f64, lng: f64) -> Self {
        Self { id, name, lat, lng }
    }

    pub fn candidate(&self) -> CandidatePoint {
        CandidatePoint::new(self.id, GeoPoint::new(self.lat, self.lng), self.name)
            .with_label(self.name)
    }
}

pub const WATER_POINTS: &[WaterPoint] = &[
    WaterPoint::new("wp-kondele", "Kondele borehole", -0.0822, 34.7680),
    WaterPoint::new("wp-nyalenda", "Nyalenda kiosk", -0.1120, 34.7640),
    WaterPoint::new("wp-manyatta", "Manyatta tank", -0.0950, 34.7820),
    WaterPoint::new("wp-dunga", "Dunga beach intake", -0.1440, 34.7360),
    WaterPoint::new("wp-mamboleo", "Mamboleo spring", -0.0590, 34.7900),
];

/// Depot the optimizer routes from.
pub const ORIGIN: GeoPoint = GeoPoint {
    latitude: -0.0917,
    longitude: 34.7680,
};

pub fn candidates() -> Vec<CandidatePoint> {
    WATER_POINTS.iter().map(WaterPoint::candidate).collect()
}

pub fn ids(count: usize) -> Vec<String> {
    WATER_POINTS
        .iter()
        .take(count)
        .map(|point| point.id.to_string())
        .collect()
}

fn point_json(point: &WaterPoint) -> Value {
    json!({
        "nodeId": point.id,
        "location": { "latitude": point.lat, "longitude": point.lng },
        "address": point.name,
    })
}

/// A complete, canonical response covering the first three water points.
pub fn full_response(route_id: &str) -> Value {
    let [a, b, c] = [&WATER_POINTS[0], &WATER_POINTS[1], &WATER_POINTS[2]];
    json!({
        "id": route_id,
        "ownerId": "inspector-7",
        "candidateIds": [a.id, b.id, c.id],
        "points": [point_json(a), point_json(b), point_json(c)],
        "segments": [
            {
                "from": point_json(a),
                "to": point_json(b),
                "distance": 3.4,
                "polyline": [
                    { "latitude": a.lat, "longitude": a.lng },
                    { "latitude": b.lat, "longitude": b.lng }
                ]
            },
            {
                "from": point_json(b),
                "to": point_json(c),
                "distance": 2.1,
                "polyline": []
            }
        ],
        "totalDistance": 5.5,
        "createdAt": "2025-06-01T09:00:00Z",
        "updatedAt": "2025-06-01T09:00:05Z",
        "optimization_stats": {
            "best_fitness": 0.81,
            "average_fitness": 0.64,
            "generations_completed": 200,
            "fitness_history": [0.3, 0.55, 0.81]
        }
    })
}
