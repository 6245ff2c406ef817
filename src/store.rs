//! Capability-based access to the remote counter.
//!
//! The benchmark never touches the shared value directly. Everything goes
//! through the [`CounterStore`] trait, which mirrors the small capability set
//! a distributed key-value/atomic-value service exposes:
//!
//! | Capability | Methods |
//! |------------|---------|
//! | Key-value map | [`get`](CounterStore::get), [`put`](CounterStore::put) |
//! | Pessimistic locking | [`lock`](CounterStore::lock), [`unlock`](CounterStore::unlock) |
//! | Optimistic replace | [`compare_and_swap`](CounterStore::compare_and_swap) |
//! | Atomic counter | [`atomic_get`](CounterStore::atomic_get), [`atomic_set`](CounterStore::atomic_set), [`atomic_increment`](CounterStore::atomic_increment), [`atomic_add`](CounterStore::atomic_add) |
//! | Lifecycle | [`close`](CounterStore::close) |
//!
//! The key-value map and the atomic counters are separate namespaces: a map
//! entry and an atomic counter may share a name without sharing a value.
//!
//! [`memory::MemoryStore`] is the in-process implementation used by the
//! binary, the tests and the benches.

pub mod memory;

use std::fmt::{self, Debug};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub use memory::MemoryStore;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection could not be established.
    #[error("cannot connect: {0}")]
    Connection(String),

    /// The handle was closed; no further calls are accepted.
    #[error("store is closed")]
    Closed,

    /// `get` on a key that holds no value.
    #[error("key `{0}` has no value")]
    MissingKey(String),

    /// `unlock` by a caller that does not hold the key's lock.
    #[error("lock on `{0}` is not held by the caller")]
    NotLockOwner(String),

    /// Any other failure reported by the store.
    #[error("store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for errors that mean the connection itself is gone.
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Closed)
    }
}

/// Connection settings for a counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name of the cluster to join. Must not be empty.
    pub cluster_name: String,
    /// Name of the key-value map holding the counter. Must not be empty.
    pub map_name: String,
    /// Simulated latency added to every store call.
    pub round_trip: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cluster_name: "counter-cluster".to_string(),
            map_name: "counter-map".to_string(),
            round_trip: Duration::ZERO,
        }
    }
}

impl StoreConfig {
    /// Sets the cluster name.
    pub fn with_cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = name.into();
        self
    }

    /// Sets the map name.
    pub fn with_map_name(mut self, name: impl Into<String>) -> Self {
        self.map_name = name.into();
        self
    }

    /// Sets the simulated per-call round trip.
    pub fn with_round_trip(mut self, round_trip: Duration) -> Self {
        self.round_trip = round_trip;
        self
    }
}

/// The capability set the benchmark consumes.
///
/// Implementations must be shareable across worker threads. All values are
/// `i64`, matching the numeric range of a typical remote atomic long.
pub trait CounterStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Result<i64, StoreError>;

    /// Unconditionally overwrites the value stored under `key`.
    fn put(&self, key: &str, value: i64) -> Result<(), StoreError>;

    /// Blocks until the caller holds the exclusive lock on `key`.
    fn lock(&self, key: &str) -> Result<(), StoreError>;

    /// Releases a lock taken with [`lock`](CounterStore::lock).
    fn unlock(&self, key: &str) -> Result<(), StoreError>;

    /// Replaces `expected` with `new` under `key`.
    ///
    /// Returns `true` iff the stored value equalled `expected` and the swap
    /// happened. An absent key never matches.
    fn compare_and_swap(&self, key: &str, expected: i64, new: i64) -> Result<bool, StoreError>;

    /// Reads the atomic counter `name`.
    fn atomic_get(&self, name: &str) -> Result<i64, StoreError>;

    /// Sets the atomic counter `name`.
    fn atomic_set(&self, name: &str, value: i64) -> Result<(), StoreError>;

    /// Atomically adds one to `name` and returns the new value.
    fn atomic_increment(&self, name: &str) -> Result<i64, StoreError>;

    /// Atomically adds `delta` to `name` and returns the new value.
    fn atomic_add(&self, name: &str, delta: i64) -> Result<i64, StoreError>;

    /// Closes the connection. Later calls fail with [`StoreError::Closed`].
    fn close(&self) -> Result<(), StoreError>;
}

/// Scoped ownership of a key's pessimistic lock.
///
/// The lock is taken in [`acquire`](KeyLock::acquire) and released exactly
/// once: either explicitly through [`release`](KeyLock::release), which
/// reports unlock failures, or on drop, which logs them.
///
/// # Examples
///
/// ```rust
/// use contesa::store::{CounterStore, KeyLock, MemoryStore, StoreConfig};
///
/// let store = MemoryStore::connect(StoreConfig::default())?;
/// store.put("counter", 0)?;
///
/// let guard = KeyLock::acquire(&store, "counter")?;
/// let v = store.get("counter")?;
/// store.put("counter", v + 1)?;
/// guard.release()?;
///
/// assert_eq!(store.get("counter")?, 1);
/// # Ok::<(), contesa::store::StoreError>(())
/// ```
pub struct KeyLock<'a> {
    store: &'a dyn CounterStore,
    key: &'a str,
    held: bool,
}

impl<'a> KeyLock<'a> {
    /// Blocks until the lock on `key` is held.
    pub fn acquire(store: &'a dyn CounterStore, key: &'a str) -> Result<Self, StoreError> {
        store.lock(key)?;
        Ok(Self {
            store,
            key,
            held: true,
        })
    }

    /// Releases the lock, returning the store's answer.
    pub fn release(mut self) -> Result<(), StoreError> {
        self.held = false;
        self.store.unlock(self.key)
    }
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        if self.held {
            if let Err(err) = self.store.unlock(self.key) {
                warn!(key = self.key, error = %err, "failed to release key lock");
            }
        }
    }
}

impl Debug for KeyLock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLock")
            .field("key", &self.key)
            .field("held", &self.held)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::connect(StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.cluster_name, "counter-cluster");
        assert_eq!(config.map_name, "counter-map");
        assert_eq!(config.round_trip, Duration::ZERO);
    }

    #[test]
    fn test_config_builders() {
        let config = StoreConfig::default()
            .with_cluster_name("bench")
            .with_map_name("numbers")
            .with_round_trip(Duration::from_micros(50));
        assert_eq!(config.cluster_name, "bench");
        assert_eq!(config.map_name, "numbers");
        assert_eq!(config.round_trip, Duration::from_micros(50));
    }

    #[test]
    fn test_key_lock_release() {
        let store = store();
        let guard = KeyLock::acquire(&store, "k").unwrap();
        assert!(store.is_locked("k"));
        guard.release().unwrap();
        assert!(!store.is_locked("k"));
    }

    #[test]
    fn test_key_lock_released_on_drop() {
        let store = store();
        {
            let _guard = KeyLock::acquire(&store, "k").unwrap();
            assert!(store.is_locked("k"));
        }
        assert!(!store.is_locked("k"));
    }

    #[test]
    fn test_key_lock_released_on_error_path() {
        let store = store();
        let attempt = || -> Result<(), StoreError> {
            let _guard = KeyLock::acquire(&store, "absent")?;
            store.get("absent")?;
            Ok(())
        };
        assert!(matches!(attempt(), Err(StoreError::MissingKey(_))));
        assert!(!store.is_locked("absent"));
    }

    #[test]
    fn test_is_connection() {
        assert!(StoreError::Closed.is_connection());
        assert!(StoreError::Connection("x".into()).is_connection());
        assert!(!StoreError::MissingKey("x".into()).is_connection());
        assert!(!StoreError::Backend("x".into()).is_connection());
    }
}
