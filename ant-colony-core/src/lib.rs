//! # ant-colony-core
//!
//! Core primitives for the distributed ant colony knapsack optimizer.
//!
//! This crate is transport-free and provides:
//! - The deterministic item catalogue ([`problem`])
//! - Stochastic ant construction ([`ant`])
//! - Pheromone evaporation and reinforcement ([`pheromone`])
//! - The ant-per-worker partition ([`partition`])
//! - Run configuration and result types ([`config`], [`outcome`])
//!
//! The coordinator owns the authoritative pheromone vector; workers only
//! ever see a round-scoped copy of it. Everything here is pure computation
//! so both sides of the wire share one implementation.

pub mod ant;
pub mod config;
pub mod outcome;
pub mod partition;
pub mod pheromone;
pub mod problem;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ant::{construct, AntSolution};
    pub use crate::config::ColonyConfig;
    pub use crate::outcome::{RoundResult, RunOutcome};
    pub use crate::partition::ants_per_worker;
    pub use crate::pheromone::update;
    pub use crate::problem::ItemCatalogue;
}

/// Result type for core operations
pub type Result<T> = core::result::Result<T, CoreError>;

/// Error type for configuration and model preconditions
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The item catalogue has no items
    #[error("item catalogue is empty")]
    EmptyCatalogue,
    /// Value and weight sequences disagree on length
    #[error("catalogue length mismatch: {values} values, {weights} weights")]
    CatalogueMismatch { values: usize, weights: usize },
    /// A zero weight makes the value/weight heuristic undefined
    #[error("item {index} has zero weight; the desirability heuristic requires positive weights")]
    ZeroWeightItem { index: usize },
    /// Evaporation must keep pheromone strictly positive
    #[error("evaporation rate must be in [0, 1), got {rho}")]
    InvalidEvaporation { rho: f64 },
    /// A count field that the round schedule divides by is zero
    #[error("{field} must be positive")]
    ZeroCount { field: &'static str },
}
