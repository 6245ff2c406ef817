//! Worker pool coordinator.
//!
//! [`run_concurrently`] is the one synchronization point between the driver
//! and the workers of a scenario. It starts exactly `workers` threads, holds
//! them at a start gate until all are spawned so they hit the store together,
//! and blocks the caller until every one has finished.
//!
//! ```text
//!   driver ──spawn──► worker-0 ─┐
//!          ──spawn──► worker-1 ─┤   gate opens once all are spawned
//!          ──spawn──► worker-N ─┘
//!                        │  unit_of_work(id)
//!                        ▼
//!                 WaitGroup countdown ──► driver resumes, joins, reports
//! ```
//!
//! A failing or panicking worker still counts down (its `WaitGroup` clone is
//! dropped on every exit path), so it can never leave the driver waiting.
//! Failures are reported after the wait: the first one observed is returned,
//! the rest are logged.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::thread;

use crossbeam_utils::sync::WaitGroup;
use tracing::{debug, warn};

use crate::error::{BenchError, Result, WorkerError};

/// Runs `unit_of_work` once on each of `workers` concurrent threads.
///
/// The closure receives the worker's index in `0..workers`. The call returns
/// only after every worker has completed, successfully or not; no thread
/// outlives it.
///
/// # Errors
///
/// - [`BenchError::Configuration`] if `workers` is zero.
/// - [`BenchError::Worker`] / [`BenchError::WorkerPanicked`] for the first
///   worker that failed.
/// - [`BenchError::Spawn`] if the OS refused a thread and no worker failed.
///
/// # Examples
///
/// ```rust
/// use contesa::pool::run_concurrently;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let runs = AtomicUsize::new(0);
/// run_concurrently(4, |_worker| {
///     runs.fetch_add(1, Ordering::Relaxed);
///     Ok(())
/// })?;
/// assert_eq!(runs.load(Ordering::Relaxed), 4);
/// # Ok::<(), contesa::error::BenchError>(())
/// ```
pub fn run_concurrently<F>(workers: usize, unit_of_work: F) -> Result<()>
where
    F: Fn(usize) -> std::result::Result<(), WorkerError> + Sync,
{
    if workers == 0 {
        return Err(BenchError::Configuration(
            "worker count must be positive".into(),
        ));
    }

    let first_failure: Mutex<Option<BenchError>> = Mutex::new(None);
    let failures = AtomicUsize::new(0);
    let start_gate = RwLock::new(());
    let done = WaitGroup::new();
    let mut spawn_error = None;

    thread::scope(|s| {
        let gate = start_gate.write().unwrap_or_else(PoisonError::into_inner);
        let mut handles = Vec::with_capacity(workers);

        for worker in 0..workers {
            let done = done.clone();
            let (start_gate, unit_of_work) = (&start_gate, &unit_of_work);
            let (first_failure, failures) = (&first_failure, &failures);

            let spawned = thread::Builder::new()
                .name(format!("worker-{worker}"))
                .spawn_scoped(s, move || {
                    let _done = done;
                    drop(start_gate.read());
                    debug!(worker, "worker started");
                    match unit_of_work(worker) {
                        Ok(()) => debug!(worker, "worker finished"),
                        Err(source) => {
                            warn!(worker, error = %source, "worker failed");
                            failures.fetch_add(1, Ordering::Relaxed);
                            record(first_failure, BenchError::Worker { worker, source });
                        }
                    }
                });

            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(err) => {
                    warn!(worker, error = %err, "failed to spawn worker");
                    spawn_error = Some(err);
                    break;
                }
            }
        }

        drop(gate);
        done.wait();

        for (worker, handle) in handles {
            if let Err(payload) = handle.join() {
                let message = panic_message(&*payload);
                warn!(worker, %message, "worker panicked");
                failures.fetch_add(1, Ordering::Relaxed);
                record(&first_failure, BenchError::WorkerPanicked { worker, message });
            }
        }
    });

    let failed = failures.load(Ordering::Relaxed);
    if failed > 1 {
        warn!(failed, workers, "worker pool finished with multiple failures");
    }

    match first_failure
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
    {
        Some(err) => Err(err),
        None => match spawn_error {
            Some(err) => Err(BenchError::Spawn(err)),
            None => Ok(()),
        },
    }
}

/// Keeps the first failure; later ones were already logged.
fn record(slot: &Mutex<Option<BenchError>>, err: BenchError) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_none() {
        *slot = Some(err);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
