//! Best-effort coercion of untyped optimizer values.
//!
//! Every helper here is total: a value that cannot be read yields `None` or
//! the caller's default, never an error.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::model::GeoPoint;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// First key in `keys` whose value is present and not null.
pub fn first<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// Reads a finite number from a JSON number or a numeric string.
pub fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite())
}

/// Like [`number`] but also rejects negatives, falling back to `default`.
pub fn non_negative(value: Option<&Value>, default: f64) -> f64 {
    number(value).filter(|number| *number >= 0.0).unwrap_or(default)
}

/// Reads a whole, non-negative count. Fractional values are truncated.
pub fn count(value: Option<&Value>) -> Option<u64> {
    number(value)
        .filter(|number| *number >= 0.0 && *number <= u64::MAX as f64)
        .map(|number| number.trunc() as u64)
}

/// Reads text from a string, or from a number or bool rendered as text.
pub fn string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Like [`string`] but treats blank text as absent.
pub fn non_empty_string(value: Option<&Value>) -> Option<String> {
    string(value).filter(|text| !text.trim().is_empty())
}

/// Reads an ISO-8601 string or epoch milliseconds, resolving anything else to `now`.
pub fn timestamp(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    parse_timestamp(value).unwrap_or(now)
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(text) => parse_timestamp_text(text.trim()),
        Value::Number(number) => {
            let millis = number
                .as_i64()
                .or_else(|| number.as_f64().filter(|ms| ms.is_finite()).map(|ms| ms as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Offset-less ISO strings are taken as UTC.
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    text.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

/// Reads a coordinate object (`latitude`/`lat`, `longitude`/`lng`/`lon`) or a
/// `[lat, lng]` pair. Anything incomplete is `{0, 0}`.
pub fn geo_point(value: Option<&Value>) -> GeoPoint {
    let coordinates = match value {
        Some(Value::Object(object)) => number(first(object, &["latitude", "lat"]))
            .zip(number(first(object, &["longitude", "lng", "lon"]))),
        Some(Value::Array(pair)) if pair.len() == 2 => {
            number(pair.first()).zip(number(pair.get(1)))
        }
        _ => None,
    };
    coordinates
        .map(|(latitude, longitude)| GeoPoint::new(latitude, longitude))
        .unwrap_or_default()
}
