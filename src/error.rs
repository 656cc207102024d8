//! Error type shared by the whole crate.

use thiserror::Error;

/// Errors produced by agents, configuration and checkpoint handling.
#[derive(Error, Debug)]
pub enum SelfPlayError {
    /// Exploration rate outside `[0, 1]` (or NaN).
    #[error("epsilon {0} is out of range [0, 1]")]
    InvalidEpsilon(f64),

    /// An interval setting that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    /// A decision was handed back to an agent that did not issue it.
    #[error("decision issued by agent {issued_by} was rewarded on agent {rewarded_on}")]
    ForeignDecision {
        /// Identity of the agent that produced the decision.
        issued_by: u64,
        /// Identity of the agent `reward` was called on.
        rewarded_on: u64,
    },

    /// A policy table loaded from outside does not have the fixed arm grid.
    #[error("corrupt policy table: {0}")]
    CorruptTable(String),

    /// Reading or writing a checkpoint or telemetry file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A checkpoint or config file was not valid JSON for its type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type SelfPlayResult<T> = Result<T, SelfPlayError>;
