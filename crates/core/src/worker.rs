// crates/core/src/worker.rs
//! CPU-burn workers.
//!
//! Each worker is a dedicated OS thread running a side-effect-free numeric
//! loop, purely to pin one core. Tokio tasks are deliberately not used here:
//! the point is real multi-core saturation, and a busy loop on the async
//! runtime would starve the executor instead.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::types::WorkerId;

/// Iterations between cancellation checks. Small enough that cancellation
/// latency stays well under a second, large enough that the check is noise.
const BURN_BATCH: u32 = 4096;

/// Process-wide id counter so worker ids are never reused across jobs.
static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to one running CPU-burn thread.
pub struct WorkerHandle {
    id: WorkerId,
    thread: thread::JoinHandle<()>,
}

impl WorkerHandle {
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Wait (bounded) for the worker to exit after its cancel flag was set.
    ///
    /// Termination failure is non-fatal: if the thread is still running when
    /// the deadline passes it is detached and left to exit on its own.
    pub fn shutdown(self, deadline: Duration) {
        let start = Instant::now();
        while !self.thread.is_finished() {
            if start.elapsed() >= deadline {
                tracing::warn!(worker_id = self.id, "cpu worker did not exit in time, detaching");
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        if self.thread.join().is_err() {
            tracing::warn!(worker_id = self.id, "cpu worker thread panicked");
        }
    }
}

/// Spawn `count` independent CPU-burn workers, all observing `cancel`.
///
/// A failed thread spawn is logged and skipped rather than aborting the job;
/// in practice it only happens when the OS is out of threads.
pub fn spawn_workers(count: u64, cancel: &Arc<AtomicBool>) -> Vec<WorkerHandle> {
    let mut handles = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        let flag = Arc::clone(cancel);
        let spawned = thread::Builder::new()
            .name(format!("cpu-burn-{id}"))
            .spawn(move || burn_loop(&flag));
        match spawned {
            Ok(thread) => handles.push(WorkerHandle { id, thread }),
            Err(e) => tracing::error!(worker_id = id, error = %e, "failed to spawn cpu worker"),
        }
    }
    handles
}

/// The burn loop itself: `x = (x * 3 + 1) mod 10000019`, forever, checking
/// the cancel flag once per batch.
fn burn_loop(cancel: &AtomicBool) {
    let mut x: u64 = 0;
    while !cancel.load(Ordering::Relaxed) {
        for _ in 0..BURN_BATCH {
            x = (x.wrapping_mul(3) + 1) % 10_000_019;
        }
        // Keeps the optimizer from deleting the loop body.
        std::hint::black_box(x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_workers_count_and_unique_ids() {
        let cancel = Arc::new(AtomicBool::new(false));
        let handles = spawn_workers(3, &cancel);
        assert_eq!(handles.len(), 3);

        let ids: Vec<WorkerId> = handles.iter().map(|h| h.id()).collect();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);

        cancel.store(true, Ordering::Relaxed);
        for h in handles {
            h.shutdown(Duration::from_secs(1));
        }
    }

    #[test]
    fn test_workers_exit_promptly_on_cancel() {
        let cancel = Arc::new(AtomicBool::new(false));
        let handles = spawn_workers(2, &cancel);

        // Let them actually burn for a moment.
        thread::sleep(Duration::from_millis(50));
        cancel.store(true, Ordering::Relaxed);

        let start = Instant::now();
        for h in handles {
            h.shutdown(Duration::from_secs(2));
        }
        // Cooperative cancellation should land well inside the sub-second range.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_ids_not_reused_across_batches() {
        let cancel = Arc::new(AtomicBool::new(true));
        let first: Vec<WorkerId> = spawn_workers(2, &cancel).iter().map(|h| h.id()).collect();
        let second: Vec<WorkerId> = spawn_workers(2, &cancel).iter().map(|h| h.id()).collect();
        for id in &second {
            assert!(!first.contains(id));
        }
    }
}
