//! In-process counter store.
//!
//! [`MemoryStore`] provides the full [`CounterStore`] capability set without a
//! cluster behind it. It keeps the semantics a remote map/atomic service
//! exhibits, so strategies behave the same against it:
//!
//! - `get` of a key that was never written is an error, not zero.
//! - `compare_and_swap` against an absent key never succeeds.
//! - Key locks belong to the locking thread, are reentrant, and may only be
//!   released by their owner.
//! - Atomic counters spring into existence at zero and do not share values
//!   with map entries of the same name.
//!
//! Each call can be delayed by a configurable round trip
//! ([`StoreConfig::round_trip`]) so that read-modify-write races open the
//! same windows they would over a network.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use tracing::debug;

use crate::store::{CounterStore, StoreConfig, StoreError};

#[derive(Debug)]
struct LockState {
    owner: ThreadId,
    holds: u32,
}

#[derive(Debug)]
struct Shared {
    config: StoreConfig,
    open: AtomicBool,
    map: Mutex<HashMap<String, i64>>,
    atomics: Mutex<HashMap<String, i64>>,
    locks: Mutex<HashMap<String, LockState>>,
    released: Condvar,
}

/// A connected handle to an in-process counter store.
///
/// Handles are cheap to clone; clones share the same backing data and the
/// same open/closed state.
///
/// # Examples
///
/// ```rust
/// use contesa::store::{CounterStore, MemoryStore, StoreConfig};
///
/// let store = MemoryStore::connect(StoreConfig::default())?;
/// store.put("counter", 41)?;
/// assert!(store.compare_and_swap("counter", 41, 42)?);
/// assert!(!store.compare_and_swap("counter", 41, 43)?);
/// assert_eq!(store.get("counter")?, 42);
///
/// assert_eq!(store.atomic_add("counter", 5)?, 5);
/// store.close()?;
/// # Ok::<(), contesa::store::StoreError>(())
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Opens a store for the given configuration.
    ///
    /// Fails with [`StoreError::Connection`] when the cluster or map name is
    /// empty.
    pub fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        if config.cluster_name.trim().is_empty() {
            return Err(StoreError::Connection("cluster name is empty".into()));
        }
        if config.map_name.trim().is_empty() {
            return Err(StoreError::Connection("map name is empty".into()));
        }
        debug!(
            cluster = %config.cluster_name,
            map = %config.map_name,
            round_trip_us = config.round_trip.as_micros() as u64,
            "connected to in-process counter store"
        );
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                open: AtomicBool::new(true),
                map: Mutex::new(HashMap::new()),
                atomics: Mutex::new(HashMap::new()),
                locks: Mutex::new(HashMap::new()),
                released: Condvar::new(),
            }),
        })
    }

    /// Returns the configuration this store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Returns `true` until [`close`](CounterStore::close) is called.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Returns `true` if any thread currently holds the lock on `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        self.shared
            .locks
            .lock()
            .map(|locks| locks.contains_key(key))
            .unwrap_or(false)
    }

    /// Checks the handle is open and pays the simulated round trip.
    fn round_trip(&self) -> Result<(), StoreError> {
        if !self.is_open() {
            return Err(StoreError::Closed);
        }
        let delay = self.shared.config.round_trip;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(())
    }
}

fn guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("store state poisoned".into()))
}

impl CounterStore for MemoryStore {
    fn get(&self, key: &str) -> Result<i64, StoreError> {
        self.round_trip()?;
        guard(&self.shared.map)?
            .get(key)
            .copied()
            .ok_or_else(|| StoreError::MissingKey(key.to_string()))
    }

    fn put(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.round_trip()?;
        guard(&self.shared.map)?.insert(key.to_string(), value);
        Ok(())
    }

    fn lock(&self, key: &str) -> Result<(), StoreError> {
        self.round_trip()?;
        let me = thread::current().id();
        let mut locks = guard(&self.shared.locks)?;
        loop {
            if !self.is_open() {
                return Err(StoreError::Closed);
            }
            match locks.get(key).map(|state| state.owner) {
                None => {
                    locks.insert(key.to_string(), LockState { owner: me, holds: 1 });
                    return Ok(());
                }
                Some(owner) if owner == me => {
                    if let Some(state) = locks.get_mut(key) {
                        state.holds += 1;
                    }
                    return Ok(());
                }
                Some(_) => {
                    locks = self
                        .shared
                        .released
                        .wait(locks)
                        .map_err(|_| StoreError::Backend("store state poisoned".into()))?;
                }
            }
        }
    }

    fn unlock(&self, key: &str) -> Result<(), StoreError> {
        self.round_trip()?;
        let me = thread::current().id();
        let mut locks = guard(&self.shared.locks)?;
        match locks.get_mut(key) {
            Some(state) if state.owner == me => {
                state.holds -= 1;
                if state.holds == 0 {
                    locks.remove(key);
                    self.shared.released.notify_all();
                }
                Ok(())
            }
            _ => Err(StoreError::NotLockOwner(key.to_string())),
        }
    }

    fn compare_and_swap(&self, key: &str, expected: i64, new: i64) -> Result<bool, StoreError> {
        self.round_trip()?;
        let mut map = guard(&self.shared.map)?;
        match map.get_mut(key) {
            Some(current) if *current == expected => {
                *current = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn atomic_get(&self, name: &str) -> Result<i64, StoreError> {
        self.round_trip()?;
        Ok(guard(&self.shared.atomics)?.get(name).copied().unwrap_or(0))
    }

    fn atomic_set(&self, name: &str, value: i64) -> Result<(), StoreError> {
        self.round_trip()?;
        guard(&self.shared.atomics)?.insert(name.to_string(), value);
        Ok(())
    }

    fn atomic_increment(&self, name: &str) -> Result<i64, StoreError> {
        self.atomic_add(name, 1)
    }

    fn atomic_add(&self, name: &str, delta: i64) -> Result<i64, StoreError> {
        self.round_trip()?;
        let mut atomics = guard(&self.shared.atomics)?;
        let slot = atomics.entry(name.to_string()).or_insert(0);
        *slot = slot
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(format!("atomic counter `{name}` overflow")))?;
        Ok(*slot)
    }

    fn close(&self) -> Result<(), StoreError> {
        if self.shared.open.swap(false, Ordering::AcqRel) {
            // Wake lock waiters so they observe the closed flag.
            let _locks = guard(&self.shared.locks)?;
            self.shared.released.notify_all();
            debug!(cluster = %self.shared.config.cluster_name, "counter store closed");
        }
        Ok(())
    }
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("cluster", &self.shared.config.cluster_name)
            .field("map", &self.shared.config.map_name)
            .field("open", &self.is_open())
            .finish()
    }
}
