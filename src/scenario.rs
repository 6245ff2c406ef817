//! Scenario runner: timing and verification.
//!
//! A [`Scenario`] pairs one [`Strategy`] with the run's [`Settings`]. Running
//! it fans the strategy out over the worker pool, reads the counter back and
//! scores the run with [`run_timed`].
//!
//! Two outcomes must not be confused:
//!
//! - the counter ends at the wrong value: a normal [`ScenarioResult`] with
//!   `passed == false` ("BAD");
//! - a worker or store call fails: an `Err`, and no result at all.

use std::time::Instant;

use tracing::info;

use crate::error::Result;
use crate::pool::run_concurrently;
use crate::settings::Settings;
use crate::store::CounterStore;
use crate::strategy::Strategy;
use crate::tally::{ScenarioStats, StatsSnapshot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a scenario body reports back to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// The counter value read after all workers finished.
    pub value: i64,
    /// Operation counts collected during the run.
    pub stats: StatsSnapshot,
}

impl Observation {
    /// An observation without statistics.
    pub fn value(value: i64) -> Self {
        Self {
            value,
            stats: StatsSnapshot::default(),
        }
    }
}

/// The scored outcome of one scenario. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScenarioResult {
    /// Display name of the scenario.
    pub scenario_name: String,
    /// Wall-clock duration of the scenario body.
    pub elapsed_seconds: f64,
    /// Final counter value.
    pub observed_value: i64,
    /// `threads × per-thread increments`.
    pub expected_value: i64,
    /// `observed_value == expected_value`.
    pub passed: bool,
    /// Operation counts collected during the run.
    pub stats: StatsSnapshot,
}

impl ScenarioResult {
    /// `"OK"` when the counter matched, `"BAD"` otherwise.
    pub fn status(&self) -> &'static str {
        if self.passed {
            "OK"
        } else {
            "BAD"
        }
    }

    /// Increments that did not make it into the counter.
    pub fn lost_updates(&self) -> i64 {
        self.expected_value.saturating_sub(self.observed_value)
    }

    /// Logical increments issued per second.
    pub fn throughput(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.stats.contributions as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

/// Times `scenario`, then compares what it observed with `expected`.
///
/// Errors from `scenario` are returned unchanged; they are never turned into
/// a failed result.
///
/// # Examples
///
/// ```rust
/// use contesa::scenario::{run_timed, Observation};
///
/// let result = run_timed("constant", 42, || Ok(Observation::value(42)))?;
/// assert!(result.passed);
/// assert_eq!(result.status(), "OK");
/// # Ok::<(), contesa::error::BenchError>(())
/// ```
pub fn run_timed<F>(name: &str, expected: i64, scenario: F) -> Result<ScenarioResult>
where
    F: FnOnce() -> Result<Observation>,
{
    let start = Instant::now();
    let observation = scenario()?;
    let elapsed_seconds = start.elapsed().as_secs_f64();

    Ok(ScenarioResult {
        scenario_name: name.to_string(),
        elapsed_seconds,
        observed_value: observation.value,
        expected_value: expected,
        passed: observation.value == expected,
        stats: observation.stats,
    })
}

/// One strategy, ready to be executed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    strategy: Strategy,
}

impl Scenario {
    /// Builds the scenario for `strategy` under `settings`.
    ///
    /// A batched atomic scenario is named after its batch size.
    pub fn new(strategy: Strategy, settings: &Settings) -> Self {
        let name = match strategy {
            Strategy::Atomic if settings.batch_size() > 1 => {
                format!("atomic/add-batch-{}", settings.batch_size())
            }
            _ => strategy.name().to_string(),
        };
        Self { name, strategy }
    }

    /// The scenario's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The strategy this scenario exercises.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Sets the counter this scenario uses back to zero.
    pub fn reset(&self, store: &dyn CounterStore, settings: &Settings) -> Result<()> {
        self.strategy.reset(store, settings.counter_key())
    }

    /// Runs every worker, reads the counter and scores the run.
    ///
    /// Consumes the scenario: each one executes exactly once.
    pub fn run(self, store: &dyn CounterStore, settings: &Settings) -> Result<ScenarioResult> {
        info!(
            scenario = %self.name,
            threads = settings.thread_count(),
            per_thread = settings.per_thread_increments(),
            "scenario starting"
        );

        let strategy = self.strategy;
        let result = run_timed(&self.name, settings.expected_total(), || {
            let stats = ScenarioStats::new();
            run_concurrently(settings.thread_count(), |_worker| {
                strategy.run_worker(store, settings, &stats)
            })?;
            let value = strategy.read(store, settings.counter_key())?;
            Ok(Observation {
                value,
                stats: stats.snapshot(),
            })
        })?;

        info!(
            scenario = %result.scenario_name,
            elapsed_s = result.elapsed_seconds,
            observed = result.observed_value,
            expected = result.expected_value,
            cas_retries = result.stats.cas_retries,
            status = result.status(),
            "scenario finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::store::{MemoryStore, StoreConfig, StoreError};
    use crate::strategy::tests::FailingStore;
    use std::thread;
    use std::time::Duration;

    fn store() -> MemoryStore {
        MemoryStore::connect(StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_run_timed_pass() {
        let result = run_timed("s", 10, || Ok(Observation::value(10))).unwrap();
        assert_eq!(result.scenario_name, "s");
        assert!(result.passed);
        assert_eq!(result.lost_updates(), 0);
    }

    #[test]
    fn test_run_timed_mismatch_is_not_an_error() {
        let result = run_timed("s", 10, || Ok(Observation::value(7))).unwrap();
        assert!(!result.passed);
        assert_eq!(result.status(), "BAD");
        assert_eq!(result.lost_updates(), 3);
    }

    #[test]
    fn test_run_timed_measures_elapsed() {
        let result = run_timed("s", 0, || {
            thread::sleep(Duration::from_millis(20));
            Ok(Observation::value(0))
        })
        .unwrap();
        assert!(result.elapsed_seconds >= 0.02);
    }

    #[test]
    fn test_run_timed_propagates_errors() {
        let result = run_timed("s", 1, || {
            Err(BenchError::Store(StoreError::MissingKey("counter".into())))
        });
        assert!(matches!(result, Err(BenchError::Store(_))));
    }

    #[test]
    fn test_throughput() {
        let result = ScenarioResult {
            scenario_name: "s".into(),
            elapsed_seconds: 2.0,
            observed_value: 100,
            expected_value: 100,
            passed: true,
            stats: StatsSnapshot {
                contributions: 100,
                round_trips: 100,
                cas_retries: 0,
            },
        };
        assert_eq!(result.throughput(), 50.0);
    }

    #[test]
    fn test_scenario_names() {
        let settings = Settings::new(2, 10);
        assert_eq!(Scenario::new(Strategy::NoLock, &settings).name(), "map/no-lock");
        assert_eq!(
            Scenario::new(Strategy::Atomic, &settings).name(),
            "atomic/increment"
        );
        let batched = settings.with_batch_size(5);
        assert_eq!(
            Scenario::new(Strategy::Atomic, &batched).name(),
            "atomic/add-batch-5"
        );
    }

    #[test]
    fn test_four_by_thousand_exact_strategies() {
        let settings = Settings::new(4, 1000);
        for strategy in [Strategy::Pessimistic, Strategy::Optimistic, Strategy::Atomic] {
            let store = store();
            let scenario = Scenario::new(strategy, &settings);
            scenario.reset(&store, &settings).unwrap();
            let result = scenario.run(&store, &settings).unwrap();
            assert_eq!(result.expected_value, 4000);
            assert_eq!(result.observed_value, 4000, "{strategy}");
            assert!(result.passed, "{strategy}");
        }
    }

    #[test]
    fn test_four_by_thousand_no_lock() {
        let settings = Settings::new(4, 1000);
        let store = store();
        let scenario = Scenario::new(Strategy::NoLock, &settings);
        scenario.reset(&store, &settings).unwrap();
        let result = scenario.run(&store, &settings).unwrap();

        assert!(result.observed_value <= 4000);
        assert_eq!(result.passed, result.observed_value == 4000);
        if result.observed_value < 4000 {
            eprintln!(
                "no-lock lost {} of 4000 updates, as expected",
                result.lost_updates()
            );
        }
    }

    #[test]
    fn test_worker_failure_is_an_error_not_a_result() {
        let settings = Settings::new(2, 100);
        let store = FailingStore::new(50);
        let scenario = Scenario::new(Strategy::Atomic, &settings);
        scenario.reset(&store, &settings).unwrap();
        let result = scenario.run(&store, &settings);
        assert!(matches!(result, Err(BenchError::Worker { .. })));
    }
}
