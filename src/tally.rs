//! Sharded operation counters for scenario statistics.
//!
//! Workers record how many increments they issued, how many store calls they
//! made and how often a compare-and-swap lost a race. Those counts are hit
//! from every worker on every loop iteration, so a single shared atomic would
//! add contention of its own to the very measurement it is part of.
//!
//! [`Tally`] therefore spreads updates over 64 cache-line padded slots:
//!
//! ```text
//!                          ┌─────────────────────────────────────┐
//!                          │              Tally                  │
//!                          ├─────────────────────────────────────┤
//!   worker-0 ──adds────►   │ [Slot 0] ████████ (CachePadded)     │
//!   worker-1 ──adds────►   │ [Slot 1] ████████ (CachePadded)     │
//!        ...               │    ...                              │
//!   worker-63 ─adds────►   │ [Slot 63] ███████ (CachePadded)     │
//!                          └─────────────────────────────────────┘
//!                                          │
//!                                          ▼
//!                                   value() sums all slots
//! ```
//!
//! Threads receive slots round-robin on first use. Past 64 threads slots are
//! shared, which only costs some contention, never correctness.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of slots per tally.
pub(crate) const NUM_SLOTS: usize = 64;

static NEXT_SLOT_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Slot assigned to the current thread, fixed for its lifetime.
    static THREAD_SLOT_INDEX: usize = next_slot_id();
}

/// Hands out the next slot index in `[0, NUM_SLOTS)`.
fn next_slot_id() -> usize {
    NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed) % NUM_SLOTS
}

/// A monotonically increasing counter with per-thread slots.
///
/// # Examples
///
/// ```rust
/// use contesa::tally::Tally;
/// use std::thread;
///
/// let tally = Tally::new().with_name("round_trips");
///
/// thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| {
///             for _ in 0..1000 {
///                 tally.add(1);
///             }
///         });
///     }
/// });
///
/// assert_eq!(tally.value(), 4000);
/// ```
pub struct Tally {
    name: &'static str,
    slots: [CachePadded<AtomicU64>; NUM_SLOTS],
}

impl Tally {
    /// Creates a tally at zero with no name.
    pub const fn new() -> Self {
        const ZERO: CachePadded<AtomicU64> = CachePadded::new(AtomicU64::new(0));
        Tally {
            name: "",
            slots: [ZERO; NUM_SLOTS],
        }
    }

    /// Sets the name shown by `Debug`.
    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Returns the tally's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    fn local_slot(&self) -> &AtomicU64 {
        THREAD_SLOT_INDEX.with(|idx| &self.slots[*idx])
    }

    /// Adds `n` to the calling thread's slot.
    #[inline]
    pub fn add(&self, n: u64) {
        self.local_slot().fetch_add(n, Ordering::Relaxed);
    }

    /// Returns the sum of all slots.
    ///
    /// Only exact once all writers have finished, which is how the scenario
    /// runner reads it: after the worker pool has returned.
    pub fn value(&self) -> u64 {
        self.slots
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .sum()
    }

    /// Returns the sum of all slots and zeroes them.
    pub fn value_and_reset(&self) -> u64 {
        self.slots
            .iter()
            .map(|slot| slot.swap(0, Ordering::Relaxed))
            .sum()
    }
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Tally {
    /// Shows non-zero slots as `name{ [slot]:value ... }`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.name)?;
        for (i, slot) in self.slots.iter().enumerate() {
            let val = slot.load(Ordering::Relaxed);
            if val != 0 {
                write!(f, " [{i}]:{val}")?;
            }
        }
        write!(f, " }}")
    }
}

/// The counts collected while one scenario runs.
#[derive(Debug)]
pub struct ScenarioStats {
    /// Logical increments issued. A batched add of `n` counts `n`.
    pub contributions: Tally,
    /// Store calls issued by workers.
    pub round_trips: Tally,
    /// Compare-and-swap attempts that found a different value.
    pub cas_retries: Tally,
}

impl ScenarioStats {
    /// Creates a zeroed set of tallies.
    pub const fn new() -> Self {
        Self {
            contributions: Tally::new().with_name("contributions"),
            round_trips: Tally::new().with_name("round_trips"),
            cas_retries: Tally::new().with_name("cas_retries"),
        }
    }

    /// Records `n` store calls.
    #[inline]
    pub fn record_round_trips(&self, n: u64) {
        self.round_trips.add(n);
    }

    /// Reads every tally into a plain snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            contributions: self.contributions.value(),
            round_trips: self.round_trips.value(),
            cas_retries: self.cas_retries.value(),
        }
    }
}

impl Default for ScenarioStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of a [`ScenarioStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatsSnapshot {
    /// Logical increments issued.
    pub contributions: u64,
    /// Store calls issued by workers.
    pub round_trips: u64,
    /// Failed compare-and-swap attempts.
    pub cas_retries: u64,
}
