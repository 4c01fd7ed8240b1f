//! Deterministic knapsack instance generation
//!
//! The coordinator generates the catalogue once from a fixed seed and ships
//! it to workers over the wire; a worker regenerating locally with the same
//! seed would derive the identical instance.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// Default knapsack capacity
pub const DEFAULT_CAPACITY: u32 = 500;

/// Default generation seed shared by every process in a run
pub const DEFAULT_SEED: u64 = 42;

/// Parallel item sequences plus the knapsack capacity.
///
/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCatalogue {
    /// Item values, one per item
    pub values: Vec<u32>,
    /// Item weights, one per item
    pub weights: Vec<u32>,
    /// Total weight the knapsack admits
    pub capacity: u32,
}

impl ItemCatalogue {
    /// Generate a pseudo-random catalogue from a fixed seed.
    ///
    /// Values are uniform in `[100, 500]`, weights uniform in `[10, 100]`.
    pub fn generate(count_subjects: usize, capacity: u32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut values = Vec::with_capacity(count_subjects);
        let mut weights = Vec::with_capacity(count_subjects);
        for _ in 0..count_subjects {
            values.push(rng.gen_range(100..=500));
            weights.push(rng.gen_range(10..=100));
        }
        Self {
            values,
            weights,
            capacity,
        }
    }

    /// Number of items in the catalogue
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the catalogue holds no items
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check the model preconditions: non-empty, equal lengths, and no
    /// zero-weight item (the value/weight heuristic divides by weight).
    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(CoreError::EmptyCatalogue);
        }
        if self.values.len() != self.weights.len() {
            return Err(CoreError::CatalogueMismatch {
                values: self.values.len(),
                weights: self.weights.len(),
            });
        }
        if let Some(index) = self.weights.iter().position(|&w| w == 0) {
            return Err(CoreError::ZeroWeightItem { index });
        }
        Ok(())
    }
}

/// Fresh pheromone vector, one entry of 1.0 per item.
pub fn initial_pheromone(count_subjects: usize) -> Vec<f64> {
    vec![1.0; count_subjects]
}
