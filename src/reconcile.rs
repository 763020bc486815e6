//! Turns whatever the optimizer answered into a valid [`Route`].
//!
//! Decoding runs three tiers, each weaker than the last:
//!
//! 1. **Strict**: the body already has the canonical route shape.
//! 2. **Lenient**: missing fields get defaults and every point/segment is
//!    decoded on its own, so one bad element only degrades itself.
//! 3. **Minimal**: used when the body cannot be read as a route at all
//!    (not an object, or a collection field holding the wrong JSON type).
//!    Only the selection and a best-effort total distance survive.
//!
//! [`reconcile`] is total: it never fails and never panics.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::coerce;
use crate::model::{GeoPoint, Route, RoutePoint, RouteSegment};
use crate::polyline::Polyline;

const ID_KEYS: &[&str] = &["id", "routeId", "route_id"];
const OWNER_KEYS: &[&str] = &["ownerId", "owner_id", "userId", "user_id"];
const CANDIDATE_KEYS: &[&str] = &["candidateIds", "candidate_ids", "reportIds", "report_ids"];
const DISTANCE_KEYS: &[&str] = &["totalDistance", "total_distance"];
const CREATED_KEYS: &[&str] = &["createdAt", "created_at"];
const UPDATED_KEYS: &[&str] = &["updatedAt", "updated_at"];
const POINTS_KEY: &str = "points";
const SEGMENTS_KEY: &str = "segments";
const GEOMETRY_KEYS: &[&str] = &[POINTS_KEY, SEGMENTS_KEY];
const ENVELOPE_KEYS: &[&str] = &["route", "data"];

/// Owner used when neither the response nor the session names one.
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Session facts the reconciler may fall back on.
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    owner_id: String,
    selection: Vec<String>,
    now: DateTime<Utc>,
}

impl ReconcileContext {
    pub fn new(owner_id: impl Into<String>, selection: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let selection = selection
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self {
            owner_id: owner_id.into(),
            selection,
            now: Utc::now(),
        }
    }

    /// Pins the clock used for defaulted timestamps.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    fn owner(&self) -> String {
        if self.owner_id.trim().is_empty() {
            ANONYMOUS_OWNER.to_string()
        } else {
            self.owner_id.clone()
        }
    }

    fn in_selection(&self, id: &str) -> bool {
        self.selection.iter().any(|selected| selected == id)
    }
}

/// Which decoding tier produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Strict,
    Lenient,
    Minimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub route: Route,
    pub tier: Tier,
}

/// Reasons the lenient tier gives up. Never surfaced past [`reconcile`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
enum StructuralError {
    #[error("response is {0}, not an object")]
    NotAnObject(&'static str),
    #[error("field `{field}` is {found}, not an array")]
    NotAnArray {
        field: &'static str,
        found: &'static str,
    },
}

/// Reconciles a raw optimizer response against the producing selection.
pub fn reconcile(raw: &Value, context: &ReconcileContext) -> Reconciled {
    let body = unwrap_envelope(raw);

    if let Some(route) = strict(body, context) {
        return Reconciled {
            route,
            tier: Tier::Strict,
        };
    }

    match lenient(body, context) {
        Ok(route) => {
            debug!(route_id = %route.id, "optimizer response decoded leniently");
            Reconciled {
                route,
                tier: Tier::Lenient,
            }
        }
        Err(err) => {
            warn!(error = %err, "optimizer response unreadable, using minimal route");
            Reconciled {
                route: minimal(body, context),
                tier: Tier::Minimal,
            }
        }
    }
}

/// Generates a fresh, time-ordered route id.
pub fn generate_route_id() -> String {
    format!("route_{}", Uuid::now_v7().simple())
}

fn unwrap_envelope(raw: &Value) -> &Value {
    let Some(object) = raw.as_object() else {
        return raw;
    };
    let looks_like_route = [ID_KEYS, CANDIDATE_KEYS, DISTANCE_KEYS, GEOMETRY_KEYS]
        .iter()
        .any(|keys| coerce::first(object, keys).is_some());
    if looks_like_route {
        return raw;
    }
    ENVELOPE_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|nested| nested.is_object())
        .unwrap_or(raw)
}

fn strict(body: &Value, context: &ReconcileContext) -> Option<Route> {
    let route: Route = match serde_json::from_value(body.clone()) {
        Ok(route) => route,
        Err(err) => {
            debug!(error = %err, "strict decode failed");
            return None;
        }
    };
    strict_invariants_hold(&route, context).then_some(route)
}

fn strict_invariants_hold(route: &Route, context: &ReconcileContext) -> bool {
    let mut seen = HashSet::new();
    let ids_ok = route
        .candidate_ids
        .iter()
        .all(|id| context.in_selection(id) && seen.insert(id.as_str()));
    let point_ok = |point: &RoutePoint| valid_geo(point.location);
    let segment_ok = |segment: &RouteSegment| {
        valid_distance(segment.distance)
            && point_ok(&segment.from)
            && point_ok(&segment.to)
            && segment.polyline.points().iter().all(|geo| valid_geo(*geo))
    };

    !route.id.trim().is_empty()
        && !route.owner_id.trim().is_empty()
        && ids_ok
        && valid_distance(route.total_distance)
        && route.points.iter().all(point_ok)
        && route.segments.iter().all(segment_ok)
}

fn valid_distance(distance: f64) -> bool {
    distance.is_finite() && distance >= 0.0
}

fn valid_geo(point: GeoPoint) -> bool {
    GeoPoint::new(point.latitude, point.longitude) == point
}

fn lenient(body: &Value, context: &ReconcileContext) -> Result<Route, StructuralError> {
    let object = body
        .as_object()
        .ok_or(StructuralError::NotAnObject(kind(body)))?;

    let candidate_ids = match coerce::first(object, CANDIDATE_KEYS) {
        None => context.selection.clone(),
        Some(Value::Array(items)) => selected_ids(items, context),
        Some(other) => {
            return Err(StructuralError::NotAnArray {
                field: "candidateIds",
                found: kind(other),
            });
        }
    };
    let points = collection(object, POINTS_KEY, |item| decode_point(Some(item)))?;
    let segments = collection(object, SEGMENTS_KEY, decode_segment)?;

    Ok(Route {
        id: coerce::non_empty_string(coerce::first(object, ID_KEYS))
            .unwrap_or_else(generate_route_id),
        owner_id: coerce::non_empty_string(coerce::first(object, OWNER_KEYS))
            .unwrap_or_else(|| context.owner()),
        candidate_ids,
        points,
        segments,
        total_distance: coerce::non_negative(coerce::first(object, DISTANCE_KEYS), 0.0),
        created_at: coerce::timestamp(coerce::first(object, CREATED_KEYS), context.now),
        updated_at: coerce::timestamp(coerce::first(object, UPDATED_KEYS), context.now),
    })
}

fn minimal(body: &Value, context: &ReconcileContext) -> Route {
    let total_distance = body
        .as_object()
        .map(|object| coerce::non_negative(coerce::first(object, DISTANCE_KEYS), 0.0))
        .unwrap_or(0.0);

    Route {
        id: generate_route_id(),
        owner_id: context.owner(),
        candidate_ids: context.selection.clone(),
        points: Vec::new(),
        segments: Vec::new(),
        total_distance,
        created_at: context.now,
        updated_at: context.now,
    }
}

/// Decodes an optional array field element by element.
fn collection<T, F>(
    object: &Map<String, Value>,
    field: &'static str,
    decode: F,
) -> Result<Vec<T>, StructuralError>
where
    T: Send,
    F: Fn(&Value) -> T + Sync + Send,
{
    match object.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.par_iter().map(decode).collect()),
        Some(other) => Err(StructuralError::NotAnArray {
            field,
            found: kind(other),
        }),
    }
}

/// Keeps response ids that belong to the selection, in response order, once each.
fn selected_ids(items: &[Value], context: &ReconcileContext) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| coerce::non_empty_string(Some(item)))
        .filter(|id| context.in_selection(id) && seen.insert(id.clone()))
        .collect()
}

fn decode_point(value: Option<&Value>) -> RoutePoint {
    let Some(Value::Object(object)) = value else {
        return RoutePoint::default();
    };
    // Coordinates may sit under `location` or directly on the point.
    let location = coerce::first(object, &["location", "coordinates"]).or(value);

    RoutePoint {
        node_id: coerce::string(coerce::first(object, &["nodeId", "node_id", "id"]))
            .unwrap_or_default(),
        location: coerce::geo_point(location),
        address: coerce::string(coerce::first(object, &["address"])).unwrap_or_default(),
        label: coerce::non_empty_string(coerce::first(object, &["label", "name"])),
    }
}

fn decode_segment(value: &Value) -> RouteSegment {
    let Value::Object(object) = value else {
        return RouteSegment::default();
    };
    let polyline = match coerce::first(object, &["polyline", "path"]) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| coerce::geo_point(Some(item)))
            .collect(),
        _ => Vec::new(),
    };

    RouteSegment {
        from: decode_point(coerce::first(object, &["from", "start"])),
        to: decode_point(coerce::first(object, &["to", "end"])),
        distance: coerce::non_negative(coerce::first(object, &["distance"]), 0.0),
        polyline: Polyline::new(polyline),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
