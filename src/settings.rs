//! Run-wide benchmark settings.
//!
//! A [`Settings`] value is captured once per run and shared, read-only, by
//! every scenario so their measurements stay comparable.

use crate::error::{BenchError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of concurrent workers.
pub const DEFAULT_THREADS: usize = 10;
/// Default number of increments each worker performs.
pub const DEFAULT_PER_THREAD: u64 = 10_000;
/// Default batch size for the atomic strategy (no batching).
pub const DEFAULT_BATCH: u64 = 1;
/// Default name of the remote counter.
pub const DEFAULT_COUNTER_KEY: &str = "counter";

/// Immutable configuration for one benchmark run.
///
/// # Examples
///
/// ```rust
/// use contesa::settings::Settings;
///
/// let settings = Settings::new(4, 1000).with_batch_size(50);
/// settings.validate()?;
/// assert_eq!(settings.expected_total(), 4000);
/// # Ok::<(), contesa::error::BenchError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    thread_count: usize,
    per_thread_increments: u64,
    batch_size: u64,
    counter_key: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    max_cas_retries: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_THREADS, DEFAULT_PER_THREAD)
    }
}

impl Settings {
    /// Creates settings for `thread_count` workers doing `per_thread_increments`
    /// increments each, with no batching and no retry cap.
    pub fn new(thread_count: usize, per_thread_increments: u64) -> Self {
        Self {
            thread_count,
            per_thread_increments,
            batch_size: DEFAULT_BATCH,
            counter_key: DEFAULT_COUNTER_KEY.to_string(),
            max_cas_retries: None,
        }
    }

    /// Sets the batch size used by the atomic strategy.
    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the name of the remote counter.
    pub fn with_counter_key(mut self, key: impl Into<String>) -> Self {
        self.counter_key = key.into();
        self
    }

    /// Caps consecutive failed compare-and-swap attempts per increment.
    ///
    /// `None` (the default) retries without bound.
    pub fn with_max_cas_retries(mut self, max: Option<u64>) -> Self {
        self.max_cas_retries = max;
        self
    }

    /// Number of concurrent workers per scenario.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Increments each worker performs.
    pub fn per_thread_increments(&self) -> u64 {
        self.per_thread_increments
    }

    /// Increments folded into one atomic add.
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Name of the remote counter.
    pub fn counter_key(&self) -> &str {
        &self.counter_key
    }

    /// Retry cap for the optimistic strategy.
    pub fn max_cas_retries(&self) -> Option<u64> {
        self.max_cas_retries
    }

    /// `thread_count × per_thread_increments`, or `None` if it does not fit
    /// the counter's `i64` range.
    pub fn checked_expected_total(&self) -> Option<i64> {
        (self.thread_count as u64)
            .checked_mul(self.per_thread_increments)
            .and_then(|total| i64::try_from(total).ok())
    }

    /// The value every exact strategy must end at.
    ///
    /// Saturates at `i64::MAX` for settings that fail
    /// [`validate`](Settings::validate).
    pub fn expected_total(&self) -> i64 {
        self.checked_expected_total().unwrap_or(i64::MAX)
    }

    /// Checks every invariant, failing with [`BenchError::Configuration`].
    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(BenchError::Configuration(
                "thread count must be positive".into(),
            ));
        }
        if self.per_thread_increments == 0 {
            return Err(BenchError::Configuration(
                "per-thread increments must be positive".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(BenchError::Configuration(
                "batch size must be positive".into(),
            ));
        }
        if self.counter_key.is_empty() {
            return Err(BenchError::Configuration("counter key is empty".into()));
        }
        if self.checked_expected_total().is_none() {
            return Err(BenchError::Configuration(format!(
                "{} threads x {} increments overflows the counter range",
                self.thread_count, self.per_thread_increments
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let settings = Settings::default();
        assert_eq!(settings.thread_count(), 10);
        assert_eq!(settings.per_thread_increments(), 10_000);
        assert_eq!(settings.batch_size(), 1);
        assert_eq!(settings.counter_key(), "counter");
        assert_eq!(settings.max_cas_retries(), None);
        assert_eq!(settings.expected_total(), 100_000);
        settings.validate().unwrap();
    }

    #[test]
    fn test_builders() {
        let settings = Settings::new(8, 500)
            .with_batch_size(50)
            .with_counter_key("hits")
            .with_max_cas_retries(Some(3));
        assert_eq!(settings.batch_size(), 50);
        assert_eq!(settings.counter_key(), "hits");
        assert_eq!(settings.max_cas_retries(), Some(3));
        assert_eq!(settings.expected_total(), 4000);
    }

    #[test]
    fn test_rejects_zero_threads() {
        assert!(matches!(
            Settings::new(0, 1).validate(),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_zero_increments() {
        assert!(matches!(
            Settings::new(1, 0).validate(),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_zero_batch() {
        assert!(matches!(
            Settings::new(1, 1).with_batch_size(0).validate(),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(matches!(
            Settings::new(1, 1).with_counter_key("").validate(),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_overflow() {
        let settings = Settings::new(2, i64::MAX as u64);
        assert_eq!(settings.checked_expected_total(), None);
        assert!(matches!(
            settings.validate(),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_largest_total_fits() {
        let settings = Settings::new(1, i64::MAX as u64);
        settings.validate().unwrap();
        assert_eq!(settings.expected_total(), i64::MAX);
    }
}
