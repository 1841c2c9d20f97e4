use crate::state::RunState;
use thiserror::Error;

/// Benchmark error types covering configuration, allocation, lifecycle
/// misuse, and OS-level failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BenchError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The timestamp buffer could not be sized.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Invalid lifecycle transition attempted (API misuse).
    #[error("invalid state transition from {from} to {to}")]
    State {
        /// State the run was in.
        from: RunState,
        /// State the caller tried to enter.
        to: RunState,
    },

    /// A write past the timestamp buffer's fixed capacity.
    #[error("timestamp buffer full: capacity {capacity}")]
    BufferFull {
        /// Configured buffer capacity.
        capacity: usize,
    },

    /// Monotonic clock read or absolute wait failed.
    #[error("clock error: {0}")]
    Clock(String),

    /// Report emission failure.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Convenience type alias for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;
