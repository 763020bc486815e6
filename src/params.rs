//! Genetic-algorithm hyperparameters sent to the optimizer.

use serde::{Deserialize, Serialize};

/// Tournament size is fixed on the client side.
pub const TOURNAMENT_SIZE: u32 = 3;

/// Fraction of the population carried over unchanged each generation.
const ELITE_FRACTION: f64 = 0.1;

/// Declared inclusive range of a tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    const fn new(field: &'static str, min: f64, max: f64) -> Self {
        Self { field, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

pub const POPULATION_SIZE: ParamRange = ParamRange::new("populationSize", 20.0, 200.0);
pub const MAX_GENERATIONS: ParamRange = ParamRange::new("maxGenerations", 50.0, 500.0);
pub const MUTATION_RATE: ParamRange = ParamRange::new("mutationRate", 0.01, 0.5);
pub const CROSSOVER_RATE: ParamRange = ParamRange::new("crossoverRate", 0.1, 1.0);
pub const MAX_ROUTE_LENGTH: ParamRange = ParamRange::new("maxRouteLength", 3.0, 15.0);
/// Seconds of algorithm-side budget.
pub const TIME_LIMIT: ParamRange = ParamRange::new("timeLimit", 1.0, 600.0);
pub const CONVERGENCE_THRESHOLD: ParamRange = ParamRange::new("convergenceThreshold", 0.0, 1.0);

/// Named, fixed hyperparameter bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    Fast,
    Balanced,
    Quality,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Fast, Preset::Balanced, Preset::Quality];

    pub fn hyperparameters(self) -> Hyperparameters {
        match self {
            Preset::Fast => Hyperparameters {
                population_size: 50,
                max_generations: 100,
                mutation_rate: 0.15,
                crossover_rate: 0.8,
                max_route_length: 8,
                time_limit_secs: 15,
                convergence_threshold: 0.01,
            },
            Preset::Balanced => Hyperparameters {
                population_size: 100,
                max_generations: 200,
                mutation_rate: 0.1,
                crossover_rate: 0.8,
                max_route_length: 10,
                time_limit_secs: 30,
                convergence_threshold: 0.001,
            },
            Preset::Quality => Hyperparameters {
                population_size: 200,
                max_generations: 500,
                mutation_rate: 0.05,
                crossover_rate: 0.9,
                max_route_length: 15,
                time_limit_secs: 60,
                convergence_threshold: 0.0001,
            },
        }
    }
}

/// Tunable optimizer settings.
///
/// `elite_size` and `tournament_size` are derived, not tunable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub population_size: u32,
    pub max_generations: u32,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub max_route_length: u32,
    pub time_limit_secs: u32,
    pub convergence_threshold: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Preset::Balanced.hyperparameters()
    }
}

impl Hyperparameters {
    pub fn elite_size(&self) -> u32 {
        (self.population_size as f64 * ELITE_FRACTION).round() as u32
    }

    pub fn tournament_size(&self) -> u32 {
        TOURNAMENT_SIZE
    }

    /// Every tunable value paired with its declared range, in checking order.
    pub fn checks(&self) -> [(ParamRange, f64); 7] {
        [
            (POPULATION_SIZE, self.population_size as f64),
            (MAX_GENERATIONS, self.max_generations as f64),
            (MUTATION_RATE, self.mutation_rate),
            (CROSSOVER_RATE, self.crossover_rate),
            (MAX_ROUTE_LENGTH, self.max_route_length as f64),
            (TIME_LIMIT, self.time_limit_secs as f64),
            (CONVERGENCE_THRESHOLD, self.convergence_threshold),
        ]
    }

    /// First parameter outside its range, if any.
    pub fn first_violation(&self) -> Option<(ParamRange, f64)> {
        self.checks()
            .into_iter()
            .find(|(range, value)| !range.contains(*value))
    }
}
