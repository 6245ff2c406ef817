//! Unsynchronized read-modify-write.
//!
//! Two workers can read the same value and both write `v + 1`; one of the
//! increments is then lost. The final value is therefore at most the number
//! of increments issued, and with a single worker exactly that number.

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
    for _ in 0..settings.per_thread_increments() {
        let value = store.get(key)?;
        store.put(key, next_value(key, value)?)?;
        stats.record_round_trips(2);
        stats.contributions.add(1);
    }
    Ok(())
}
