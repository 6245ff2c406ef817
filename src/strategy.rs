//! The four increment strategies under test.
//!
//! Each strategy is one way of performing "add one to the remote counter"
//! safely (or, for the control, unsafely) while other workers do the same:
//!
//! | Strategy | Discipline | Expected final value |
//! |----------|------------|----------------------|
//! | [`NoLock`](Strategy::NoLock) | none: read, then write `v + 1` | `≤ T × P` (lost updates) |
//! | [`Pessimistic`](Strategy::Pessimistic) | exclusive key lock around read/write | `T × P` |
//! | [`Optimistic`](Strategy::Optimistic) | compare-and-swap, retried until it lands | `T × P` |
//! | [`Atomic`](Strategy::Atomic) | store-side atomic increment / batched add | `T × P` |
//!
//! Strategies hold no state. All shared state lives in the store; the only
//! thing a worker keeps locally is its loop counter.

mod atomic;
mod no_lock;
mod optimistic;
mod pessimistic;

use std::fmt::{self, Display};

use crate::error::{Result, WorkerError};
use crate::settings::Settings;
use crate::store::CounterStore;
use crate::tally::ScenarioStats;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How much a strategy promises about the final counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Safety {
    /// The final value always equals the number of increments issued.
    Exact,
    /// Concurrent increments may be lost; the final value is only bounded above.
    AtMost,
}

/// Where a strategy keeps the counter inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// An entry in the key-value map.
    Map,
    /// A store-side atomic counter.
    Atomic,
}

/// A concurrency-control strategy for incrementing the remote counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Unsynchronized read-modify-write. The negative control.
    NoLock,
    /// Key lock held across the read-modify-write.
    Pessimistic,
    /// Compare-and-swap with retry on contention.
    Optimistic,
    /// Store-side atomic increment, batched when the batch size exceeds one.
    Atomic,
}

impl Strategy {
    /// Every strategy, in the order the driver runs them.
    pub const ALL: [Strategy; 4] = [
        Strategy::NoLock,
        Strategy::Pessimistic,
        Strategy::Optimistic,
        Strategy::Atomic,
    ];

    /// Short machine-friendly name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::NoLock => "map/no-lock",
            Strategy::Pessimistic => "map/pessimistic-lock",
            Strategy::Optimistic => "map/optimistic-cas",
            Strategy::Atomic => "atomic/increment",
        }
    }

    /// The guarantee this strategy gives about the final value.
    pub fn safety(&self) -> Safety {
        match self {
            Strategy::NoLock => Safety::AtMost,
            _ => Safety::Exact,
        }
    }

    /// Which store namespace holds the counter.
    pub fn target(&self) -> Target {
        match self {
            Strategy::Atomic => Target::Atomic,
            _ => Target::Map,
        }
    }

    /// Performs one worker's share: `per_thread_increments` logical increments.
    pub fn run_worker(
        &self,
        store: &dyn CounterStore,
        settings: &Settings,
        stats: &ScenarioStats,
    ) -> std::result::Result<(), WorkerError> {
        match self {
            Strategy::NoLock => no_lock::run_worker(store, settings, stats),
            Strategy::Pessimistic => pessimistic::run_worker(store, settings, stats),
            Strategy::Optimistic => optimistic::run_worker(store, settings, stats),
            Strategy::Atomic => atomic::run_worker(store, settings, stats),
        }
    }

    /// Sets the counter this strategy uses back to zero.
    pub fn reset(&self, store: &dyn CounterStore, key: &str) -> Result<()> {
        match self.target() {
            Target::Map => store.put(key, 0)?,
            Target::Atomic => store.atomic_set(key, 0)?,
        }
        Ok(())
    }

    /// Reads the counter this strategy uses.
    pub fn read(&self, store: &dyn CounterStore, key: &str) -> Result<i64> {
        let value = match self.target() {
            Target::Map => store.get(key)?,
            Target::Atomic => store.atomic_get(key)?,
        };
        Ok(value)
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `value + 1`, or [`WorkerError::Overflow`].
fn next_value(key: &str, value: i64) -> std::result::Result<i64, WorkerError> {
    value
        .checked_add(1)
        .ok_or_else(|| WorkerError::Overflow(key.to_string()))
}
