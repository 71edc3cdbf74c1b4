use thiserror::Error;

use crate::core::Ticks;

pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced before a simulation starts, or by the run loop's safety bound.
///
/// `SchedCore::tick` never fails; deadline misses are recorded on the task.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid task {name:?}: {reason}")]
    InvalidTask { name: String, reason: String },

    #[error("duplicate task name {0:?}")]
    DuplicateTask(String),

    #[error("invalid quantum {0}: must be a positive integer")]
    InvalidQuantum(f64),

    #[error("unknown policy {0:?}")]
    UnknownPolicy(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("simulation did not finish within {max_ticks} ticks (clock = {clock})")]
    TickLimitExceeded { max_ticks: u64, clock: Ticks },

    #[error("workload parse error: {0}")]
    Workload(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
