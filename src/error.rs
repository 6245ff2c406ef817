//! Error types for benchmark runs.
//!
//! The benchmark separates two kinds of "wrong":
//!
//! - A **thrown failure** ([`BenchError`]): bad settings, a lost store
//!   connection, or a worker whose store calls failed. These abort the run.
//! - A **verification mismatch**: the counter ended at the wrong value. That
//!   is a normal outcome recorded as
//!   [`ScenarioResult::passed`](crate::scenario::ScenarioResult::passed)
//!   `== false` and is never represented here.
//!
//! # Example
//!
//! ```rust
//! use contesa::error::BenchError;
//! use contesa::settings::Settings;
//!
//! let err = Settings::new(0, 10).validate().unwrap_err();
//! assert!(matches!(err, BenchError::Configuration(_)));
//! ```

use crate::store::StoreError;
use thiserror::Error;

/// Unified error type for a benchmark run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Malformed or out-of-range settings, detected before any scenario runs.
    #[error("invalid settings: {0}")]
    Configuration(String),

    /// The store connection could not be established or was lost.
    #[error("store connection failed: {0}")]
    Connection(#[source] StoreError),

    /// A store call made outside the workers (reset, final read) failed.
    #[error("store error: {0}")]
    Store(#[source] StoreError),

    /// A worker's unit of work returned an error.
    ///
    /// Only the first failure is carried; the pool waits for every other
    /// worker before returning it.
    #[error("worker {worker} failed: {source}")]
    Worker {
        /// Index of the failing worker within its pool.
        worker: usize,
        /// What went wrong inside the worker.
        #[source]
        source: WorkerError,
    },

    /// A worker panicked instead of returning.
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked {
        /// Index of the panicking worker within its pool.
        worker: usize,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl From<StoreError> for BenchError {
    fn from(err: StoreError) -> Self {
        if err.is_connection() {
            BenchError::Connection(err)
        } else {
            BenchError::Store(err)
        }
    }
}

/// Errors raised inside a single worker's share of the workload.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The optimistic strategy hit its configured retry cap.
    #[error("compare-and-swap on `{key}` failed {attempts} times in a row")]
    RetriesExhausted {
        /// The contended key.
        key: String,
        /// Consecutive failed swaps before giving up.
        attempts: u64,
    },

    /// Incrementing the stored value would overflow `i64`.
    #[error("counter `{0}` would overflow")]
    Overflow(String),
}

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_become_connection_variant() {
        let err: BenchError = StoreError::Closed.into();
        assert!(matches!(err, BenchError::Connection(StoreError::Closed)));

        let err: BenchError = StoreError::Connection("refused".into()).into();
        assert!(matches!(err, BenchError::Connection(_)));
    }

    #[test]
    fn test_other_store_errors_become_store_variant() {
        let err: BenchError = StoreError::MissingKey("counter".into()).into();
        assert!(matches!(err, BenchError::Store(StoreError::MissingKey(_))));
    }

    #[test]
    fn test_worker_error_display() {
        let err = BenchError::Worker {
            worker: 3,
            source: WorkerError::RetriesExhausted {
                key: "counter".into(),
                attempts: 7,
            },
        };
        assert_eq!(
            err.to_string(),
            "worker 3 failed: compare-and-swap on `counter` failed 7 times in a row"
        );
    }
}
