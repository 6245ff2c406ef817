//! Benchmark driver.
//!
//! [`Benchmark`] runs the four scenarios one after another against a single
//! store connection and a single [`Settings`] value. Scenarios never overlap,
//! and each one starts from a counter reset to zero, so no scenario's
//! contention leaks into another's measurement.

use tracing::{debug, info};

use crate::error::Result;
use crate::scenario::{Scenario, ScenarioResult};
use crate::settings::Settings;
use crate::store::CounterStore;
use crate::strategy::Strategy;

/// Sequences scenarios against one connected store.
///
/// # Examples
///
/// ```rust
/// use contesa::driver::Benchmark;
/// use contesa::settings::Settings;
/// use contesa::store::{MemoryStore, StoreConfig};
///
/// let store = MemoryStore::connect(StoreConfig::default())?;
/// let bench = Benchmark::new(&store, Settings::new(2, 100))?;
/// let results = bench.run()?;
///
/// assert_eq!(results.len(), 4);
/// assert!(results[1..].iter().all(|r| r.passed));
/// # Ok::<(), contesa::error::BenchError>(())
/// ```
pub struct Benchmark<'a> {
    store: &'a dyn CounterStore,
    settings: Settings,
}

impl<'a> Benchmark<'a> {
    /// Creates a driver, validating `settings` before anything touches the
    /// store.
    pub fn new(store: &'a dyn CounterStore, settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { store, settings })
    }

    /// The settings shared by every scenario.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The scenarios of a full run, in their fixed order.
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios_for(&Strategy::ALL)
    }

    fn scenarios_for(&self, strategies: &[Strategy]) -> Vec<Scenario> {
        strategies
            .iter()
            .map(|strategy| Scenario::new(*strategy, &self.settings))
            .collect()
    }

    /// Runs all four scenarios in order and returns their results.
    ///
    /// The first error aborts the remaining scenarios.
    pub fn run(&self) -> Result<Vec<ScenarioResult>> {
        self.run_each(&Strategy::ALL, |_| {})
    }

    /// Runs the given strategies in the given order, calling `on_result`
    /// as each scenario completes.
    pub fn run_each<F>(&self, strategies: &[Strategy], mut on_result: F) -> Result<Vec<ScenarioResult>>
    where
        F: FnMut(&ScenarioResult),
    {
        info!(
            threads = self.settings.thread_count(),
            per_thread = self.settings.per_thread_increments(),
            batch = self.settings.batch_size(),
            expected = self.settings.expected_total(),
            "benchmark starting"
        );

        let mut results = Vec::with_capacity(strategies.len());
        for scenario in self.scenarios_for(strategies) {
            scenario.reset(self.store, &self.settings)?;
            debug!(scenario = scenario.name(), "counter reset to zero");
            let result = scenario.run(self.store, &self.settings)?;
            on_result(&result);
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.passed).count();
        info!(passed, total = results.len(), "benchmark finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::store::{MemoryStore, StoreConfig, StoreError};
    use crate::strategy::tests::FailingStore;

    fn store() -> MemoryStore {
        MemoryStore::connect(StoreConfig::default()).unwrap()
    }

    fn verdicts(results: &[ScenarioResult]) -> Vec<(String, bool)> {
        let mut v: Vec<_> = results
            .iter()
            .filter(|r| r.scenario_name != "map/no-lock")
            .map(|r| (r.scenario_name.clone(), r.passed))
            .collect();
        v.sort();
        v
    }

    #[test]
    fn test_invalid_settings_fail_fast() {
        let store = store();
        let result = Benchmark::new(&store, Settings::new(0, 10));
        assert!(matches!(result, Err(BenchError::Configuration(_))));
    }

    #[test]
    fn test_fixed_order() {
        let store = store();
        let bench = Benchmark::new(&store, Settings::new(2, 10)).unwrap();
        let names: Vec<_> = bench.scenarios().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "map/no-lock",
                "map/pessimistic-lock",
                "map/optimistic-cas",
                "atomic/increment"
            ]
        );
    }

    #[test]
    fn test_full_run() {
        let store = store();
        let bench = Benchmark::new(&store, Settings::new(4, 1000)).unwrap();
        let results = bench.run().unwrap();

        assert_eq!(results.len(), 4);
        assert!(results[0].observed_value <= 4000);
        for result in &results[1..] {
            assert_eq!(result.observed_value, 4000, "{}", result.scenario_name);
            assert!(result.passed);
        }
        for result in &results {
            assert_eq!(result.stats.contributions, 4000, "{}", result.scenario_name);
        }
    }

    #[test]
    fn test_batched_run() {
        let store = store();
        let bench = Benchmark::new(&store, Settings::new(8, 500).with_batch_size(50)).unwrap();
        let results = bench.run().unwrap();
        let atomic = &results[3];
        assert_eq!(atomic.scenario_name, "atomic/add-batch-50");
        assert_eq!(atomic.observed_value, 4000);
        assert_eq!(atomic.stats.round_trips, 80);
    }

    #[test]
    fn test_order_does_not_change_verdicts() {
        let settings = Settings::new(3, 200);

        let forward = {
            let store = store();
            let bench = Benchmark::new(&store, settings.clone()).unwrap();
            bench.run().unwrap()
        };

        let mut reversed_order = Strategy::ALL;
        reversed_order.reverse();
        let reversed = {
            let store = store();
            // Leave junk behind to prove each scenario resets first.
            store.put("counter", 12345).unwrap();
            store.atomic_set("counter", -7).unwrap();
            let bench = Benchmark::new(&store, settings).unwrap();
            bench.run_each(&reversed_order, |_| {}).unwrap()
        };

        assert_eq!(verdicts(&forward), verdicts(&reversed));
    }

    #[test]
    fn test_on_result_called_per_scenario() {
        let store = store();
        let bench = Benchmark::new(&store, Settings::new(1, 5)).unwrap();
        let mut seen = Vec::new();
        bench
            .run_each(&Strategy::ALL, |r| seen.push(r.scenario_name.clone()))
            .unwrap();
        assert_eq!(seen.len(), 4);
        // A single worker cannot race, so even the control is exact.
        assert!(bench.run().unwrap().iter().all(|r| r.passed));
    }

    #[test]
    fn test_closed_store_aborts() {
        let store = store();
        store.close().unwrap();
        let bench = Benchmark::new(&store, Settings::new(2, 10)).unwrap();
        let result = bench.run();
        assert!(matches!(result, Err(BenchError::Connection(StoreError::Closed))));
    }

    #[test]
    fn test_worker_failure_aborts_remaining() {
        // Enough budget for the first scenario, not for the second.
        let store = FailingStore::new(2 + 2 * 10 * 2 + 1 + 5);
        let bench = Benchmark::new(&store, Settings::new(2, 10)).unwrap();
        let mut completed = 0;
        let result = bench.run_each(&Strategy::ALL, |_| completed += 1);
        assert!(matches!(result, Err(BenchError::Worker { .. })));
        assert_eq!(completed, 1);
    }
}
