//! Run configuration
//!
//! A `ColonyConfig` value is handed to the coordinator once at startup by
//! the external configuration loader; it is immutable for the run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// Algorithm and schedule parameters for one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonyConfig {
    /// Pheromone influence exponent
    pub alpha: f64,
    /// Value/weight heuristic influence exponent
    pub beta: f64,
    /// Evaporation fraction, in `[0, 1)`
    pub rho: f64,
    /// Reinforcement constant
    pub q: f64,
    /// Iteration bound; the round loop performs `max_iterations - 1`
    /// productive rounds (the preserved scheduling contract)
    pub max_iterations: usize,
    /// Number of worker sessions the coordinator accepts
    pub num_workers: usize,
    /// Total ants per round, partitioned across workers
    pub max_ants: usize,
    /// Number of items in the generated catalogue
    pub count_subjects: usize,
    /// Knapsack capacity
    pub capacity: u32,
    /// Seed for the deterministic catalogue generation
    pub generation_seed: u64,
    /// Optional per-round collection deadline. `None` (the default)
    /// preserves the baseline contract: a silent worker stalls the barrier
    /// indefinitely. When set, an overdue round is failed and skipped, the
    /// run itself continues. A worker that was merely slow stays one round
    /// behind afterwards: the wire format has no round identifier, so its
    /// late reply is consumed as the next round's result.
    #[serde(default)]
    pub round_timeout: Option<Duration>,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 5.0,
            rho: 0.1,
            q: 100.0,
            max_iterations: 100,
            num_workers: 2,
            max_ants: 20,
            count_subjects: 1000,
            capacity: crate::problem::DEFAULT_CAPACITY,
            generation_seed: crate::problem::DEFAULT_SEED,
            round_timeout: None,
        }
    }
}

impl ColonyConfig {
    /// Check the schedule preconditions.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.rho) {
            return Err(CoreError::InvalidEvaporation { rho: self.rho });
        }
        if self.num_workers == 0 {
            return Err(CoreError::ZeroCount {
                field: "num_workers",
            });
        }
        if self.max_ants == 0 {
            return Err(CoreError::ZeroCount { field: "max_ants" });
        }
        if self.max_iterations == 0 {
            return Err(CoreError::ZeroCount {
                field: "max_iterations",
            });
        }
        if self.count_subjects == 0 {
            return Err(CoreError::ZeroCount {
                field: "count_subjects",
            });
        }
        Ok(())
    }
}
