//! Store-side atomic counter, optionally batched.
//!
//! With a batch size of one each increment is its own `atomic_increment`.
//! With a larger batch `b` a worker sends `P / b` adds of `b` followed by one
//! add of `P % b` when that remainder is non-zero. Either way a worker
//! contributes exactly `P`; batching only changes the number of round trips.

use crate::error::WorkerError;
use crate::settings::Settings;
use crate::store::CounterStore;
use crate::tally::ScenarioStats;

/// How a worker's `P` increments are split into atomic adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BatchPlan {
    /// Size of each full batch.
    pub(crate) batch: u64,
    /// Number of full batches.
    pub(crate) full_batches: u64,
    /// Increments left over for the final add; zero means no final add.
    pub(crate) remainder: u64,
}

impl BatchPlan {
    /// Splits `per_thread` increments into batches of `batch_size`.
    ///
    /// A batch larger than the whole share behaves like a batch of exactly
    /// the share: one add.
    pub(crate) fn new(per_thread: u64, batch_size: u64) -> Self {
        let batch = batch_size.clamp(1, per_thread.max(1));
        Self {
            batch,
            full_batches: per_thread / batch,
            remainder: per_thread % batch,
        }
    }

    /// Store calls this plan makes.
    pub(crate) fn round_trips(&self) -> u64 {
        self.full_batches + u64::from(self.remainder > 0)
    }
}

pub(crate) fn run_worker(
    store: &dyn CounterStore,
    settings: &Settings,
    stats: &ScenarioStats,
) -> Result<(), WorkerError> {
    let name = settings.counter_key();
    let per_thread = settings.per_thread_increments();

    if settings.batch_size() <= 1 {
        for _ in 0..per_thread {
            store.atomic_increment(name)?;
            stats.record_round_trips(1);
            stats.contributions.add(1);
        }
        return Ok(());
    }

    // Both parts are at most `per_thread`, which validated settings keep
    // inside the i64 range.
    let plan = BatchPlan::new(per_thread, settings.batch_size());
    for _ in 0..plan.full_batches {
        store.atomic_add(name, plan.batch as i64)?;
        stats.record_round_trips(1);
        stats.contributions.add(plan.batch);
    }
    if plan.remainder > 0 {
        store.atomic_add(name, plan.remainder as i64)?;
        stats.record_round_trips(1);
        stats.contributions.add(plan.remainder);
    }
    Ok(())
}
