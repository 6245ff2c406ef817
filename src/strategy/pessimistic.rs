//! Key lock held across the read-modify-write.
//!
//! Every increment costs four store calls (lock, get, put, unlock) and all
//! workers serialize on the one key. The lock is released on every exit
//! path through [`KeyLock`].

use crate::error::WorkerError;
use crate::settings::Settings;
use crate::store::{CounterStore, KeyLock};
use crate::strategy::next_value;
use crate::tally::ScenarioStats;

pub(crate) fn run_worker(
    store: &dyn CounterStore,
    settings: &Settings,
    stats: &ScenarioStats,
) -> Result<(), WorkerError> {
    let key = settings.counter_key();
    for _ in 0..settings.per_thread_increments() {
        let guard = KeyLock::acquire(store, key)?;
        let value = store.get(key)?;
        store.put(key, next_value(key, value)?)?;
        guard.release()?;
        stats.record_round_trips(4);
        stats.contributions.add(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::pool::run_concurrently;
    use crate::strategy::tests::{drive, store, FailingStore};
    use crate::strategy::Strategy;

    #[test]
    fn test_exact_under_contention() {
        let store = store();
        let (value, stats) = drive(&store, Strategy::Pessimistic, &Settings::new(4, 1000));
        assert_eq!(value, 4000);
        assert_eq!(stats.contributions, 4000);
        assert_eq!(stats.round_trips, 16_000);
        assert!(!store.is_locked("counter"));
    }

    #[test]
    fn test_lock_released_when_read_fails() {
        // Budget covers the lock call only; the get inside the critical
        // section fails.
        let store = FailingStore::new(1);
        store.inner.put("counter", 0).unwrap();
        let settings = Settings::new(1, 3);
        let result = run_concurrently(1, |_| {
            Strategy::Pessimistic.run_worker(&store, &settings, &ScenarioStats::new())
        });
        assert!(matches!(result, Err(BenchError::Worker { worker: 0, .. })));
        assert!(!store.inner.is_locked("counter"));
    }

    #[test]
    fn test_missing_key_releases_lock() {
        let store = store();
        let settings = Settings::new(2, 5).with_counter_key("never-written");
        let result = run_concurrently(2, |_| {
            Strategy::Pessimistic.run_worker(&store, &settings, &ScenarioStats::new())
        });
        assert!(result.is_err());
        assert!(!store.is_locked("never-written"));
    }
}
