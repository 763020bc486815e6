//! Optional optimizer run statistics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce;

/// Flat level used for a fitness series with no spread.
const FLAT_LEVEL: f64 = 0.5;

/// Statistics describing one optimizer run. Purely informational.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationTelemetry {
    pub best_fitness: Option<f64>,
    pub average_fitness: Option<f64>,
    pub generations_completed: Option<u64>,
    pub fitness_history: Vec<f64>,
    pub population_size: Option<u64>,
    pub evaluations_performed: Option<u64>,
    pub convergence_status: Option<String>,
}

impl OptimizationTelemetry {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `fitness_history` rescaled to 0..1 for charting.
    ///
    /// An empty history gives an empty series; a history with no spread gives
    /// a flat series at 0.5.
    pub fn normalized_history(&self) -> Vec<f64> {
        normalize(&self.fitness_history)
    }
}

/// Looks for run statistics in `optimization_stats`, then `algorithm_details`,
/// then a bare `fitness_score`. Earlier sources win field by field.
///
/// Returns `None` when the response carries no statistics at all.
pub fn extract(raw: &Value) -> Option<OptimizationTelemetry> {
    let object = raw.as_object()?;
    let mut telemetry = OptimizationTelemetry::default();

    if let Some(Value::Object(stats)) = object.get("optimization_stats") {
        telemetry.best_fitness = coerce::number(stats.get("best_fitness"));
        telemetry.average_fitness = coerce::number(stats.get("average_fitness"));
        telemetry.generations_completed = coerce::count(stats.get("generations_completed"));
        telemetry.fitness_history = history(stats);
    }

    if let Some(Value::Object(details)) = object.get("algorithm_details") {
        telemetry.generations_completed = telemetry
            .generations_completed
            .or_else(|| coerce::count(details.get("generations_completed")));
        telemetry.population_size = coerce::count(details.get("population_size"));
        telemetry.evaluations_performed = coerce::count(details.get("evaluations_performed"));
        telemetry.convergence_status =
            coerce::non_empty_string(details.get("convergence_status"));
    }

    telemetry.best_fitness = telemetry
        .best_fitness
        .or_else(|| coerce::number(object.get("fitness_score")));

    (!telemetry.is_empty()).then_some(telemetry)
}

fn history(stats: &Map<String, Value>) -> Vec<f64> {
    match stats.get("fitness_history") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| coerce::number(Some(item)))
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize(series: &[f64]) -> Vec<f64> {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    let (min, max) = series
        .iter()
        .fold((*first, *first), |(min, max), value| (min.min(*value), max.max(*value)));
    let range = max - min;
    if range.is_finite() {
        if range <= f64::EPSILON {
            return vec![FLAT_LEVEL; series.len()];
        }
        return series.iter().map(|value| (value - min) / range).collect();
    }
    // Spread beyond f64::MAX: scale everything by one half first.
    let half_range = max / 2.0 - min / 2.0;
    if !half_range.is_finite() {
        return vec![FLAT_LEVEL; series.len()];
    }
    series
        .iter()
        .map(|value| (value / 2.0 - min / 2.0) / half_range)
        .collect()
}
