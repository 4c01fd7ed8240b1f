//! Round and run result carriers

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ant::AntSolution;

/// One worker's contribution for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Best value this worker's batch produced
    pub best_value: u32,
    /// Item set behind `best_value`, in construction order
    pub best_items: Vec<usize>,
    /// Every ant's value, batch order
    pub all_values: Vec<u32>,
    /// Every ant's item set, batch order
    pub all_item_sets: Vec<Vec<usize>>,
}

impl RoundResult {
    /// Fold a batch of ant solutions into one round result.
    ///
    /// The batch best is tracked with strictly-greater replacement, so the
    /// first of several equal-valued ants wins.
    pub fn from_batch(batch: Vec<AntSolution>) -> Self {
        let mut result = Self {
            all_values: Vec::with_capacity(batch.len()),
            all_item_sets: Vec::with_capacity(batch.len()),
            ..Self::default()
        };
        for solution in batch {
            if solution.value > result.best_value {
                result.best_value = solution.value;
                result.best_items = solution.items.clone();
            }
            result.all_values.push(solution.value);
            result.all_item_sets.push(solution.items);
        }
        result
    }
}

/// Final artifact of one run, handed to the result-store collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Best item set seen across all rounds
    pub best_items: Vec<usize>,
    /// Value of `best_items`
    pub best_value: u32,
    /// Time spent opening the transport and handshaking the workers
    pub startup_time: Duration,
    /// Time spent in the round loop
    pub round_time: Duration,
}

impl RunOutcome {
    /// Wall-clock total: startup plus round loop.
    pub fn total_time(&self) -> Duration {
        self.startup_time + self.round_time
    }
}
