//! Compare-and-swap with retry.
//!
//! A worker reads `v` and asks the store to replace `v` with `v + 1`. If
//! another worker got there first the swap fails and the cycle starts over.
//! Retries are unbounded unless [`Settings::max_cas_retries`] is set; their
//! count is what grows with contention.

use crate::error::WorkerError;
use crate::settings::Settings;
use crate::store::CounterStore;
use crate::strategy::next_value;
use crate::tally::ScenarioStats;

pub(crate) fn run_worker(
    store: &dyn CounterStore,
    settings: &Settings,
    stats: &ScenarioStats,
) -> Result<(), WorkerError> {
    let key = settings.counter_key();
    let max_retries = settings.max_cas_retries();

    for _ in 0..settings.per_thread_increments() {
        let mut failed: u64 = 0;
        loop {
            let current = store.get(key)?;
            let swapped = store.compare_and_swap(key, current, next_value(key, current)?)?;
            stats.record_round_trips(2);
            if swapped {
                break;
            }
            failed += 1;
            stats.cas_retries.add(1);
            if max_retries.is_some_and(|max| failed > max) {
                return Err(WorkerError::RetriesExhausted {
                    key: key.to_string(),
                    attempts: failed,
                });
            }
        }
        stats.contributions.add(1);
    }
    Ok(())
}
