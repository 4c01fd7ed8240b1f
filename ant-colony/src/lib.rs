//! # ant-colony
//!
//! Coordinator and worker runtimes for the distributed ant colony
//! optimizer. The core algorithm lives in `ant-colony-core`, the transport
//! bindings and wire codec in `ant-colony-net`; this crate glues them into
//! the two long-running roles:
//!
//! - [`Coordinator`]: generates the item catalogue, opens one session per
//!   worker, drives the round-synchronous loop (broadcast pheromone,
//!   collect results, update) and tracks the run-wide best solution
//! - [`WorkerSession`]: connects to the coordinator, performs the two-step
//!   `READY` handshake, then constructs its share of ants every round
//!   until the `end` sentinel arrives
//!
//! Both roles are also exposed as binaries (`coordinator`, `worker`).

pub mod coordinator;
pub mod progress;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::Coordinator;
pub use worker::{run_worker, WorkerReport, WorkerSession};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::coordinator::Coordinator;
    pub use crate::progress::{MemorySink, NullSink, ProgressSink, TracingSink};
    pub use crate::worker::{run_worker, WorkerReport, WorkerSession};
    pub use crate::{Result, RunError};
}

/// Result type for run-level operations
pub type Result<T> = core::result::Result<T, RunError>;

/// Run-level error type
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Invalid configuration or catalogue
    #[error(transparent)]
    Core(#[from] ant_colony_core::CoreError),
    /// Transport or codec failure
    #[error(transparent)]
    Net(#[from] ant_colony_net::NetError),
    /// A peer broke the `READY` handshake
    #[error("worker {worker} broke the handshake with {got:?}")]
    Handshake {
        /// Session index of the offending worker
        worker: usize,
        /// What arrived instead of the expected literal
        got: String,
    },
    /// A spawned handshake task failed
    #[error("handshake task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
