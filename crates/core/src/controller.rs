// crates/core/src/controller.rs
//! Single-job lifecycle controller.
//!
//! One controller instance owns the whole job state machine: start, stop and
//! auto-expire all serialize through one mutex held only for the duration of
//! the transition, never across sleeps or awaits. At most one job runs at a
//! time by design.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use crate::memory::MemoryPool;
use crate::types::{epoch_secs, StartOutcome, StatusView};
use crate::worker::{spawn_workers, WorkerHandle};

/// Bounded per-worker wait during stop. Workers poll their cancel flag every
/// few microseconds, so this only matters when a thread is wedged.
const WORKER_SHUTDOWN_WAIT: Duration = Duration::from_millis(250);

/// Everything mutable about the one job. Only touched under the controller
/// mutex.
struct JobState {
    running: bool,
    started_at: Option<DateTime<Utc>>,
    /// Deadline while running; stop time once stopped.
    ends_at: Option<DateTime<Utc>>,
    mem_mib: u64,
    cpu_workers: u64,
    workers: Vec<WorkerHandle>,
    cancel: Option<Arc<AtomicBool>>,
    expire: Option<CancellationToken>,
    note: String,
    ticks: u64,
}

impl JobState {
    fn new() -> Self {
        Self {
            running: false,
            started_at: None,
            ends_at: None,
            mem_mib: 0,
            cpu_workers: 0,
            workers: Vec::new(),
            cancel: None,
            expire: None,
            note: String::new(),
            ticks: 0,
        }
    }
}

/// Controller for the single synthetic-load job.
///
/// Constructed once at process start in the stopped state and shared through
/// an `Arc`; transitions must run inside a tokio runtime because start spawns
/// the allocator and the auto-expire timer as background tasks.
pub struct JobController {
    state: Mutex<JobState>,
    pool: MemoryPool,
}

impl JobController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(JobState::new()),
            pool: MemoryPool::new(),
        })
    }

    /// Start a job: spawn `cpu_workers` burn threads, kick off the memory
    /// fill in the background and schedule the auto-expire timer.
    ///
    /// Inputs are pre-clamped by the transport layer; any positive integers
    /// are tolerated here (tests drive small values directly). Rejected with
    /// [`StartOutcome::AlreadyRunning`] and no side effects if a job is
    /// already running.
    pub fn start(self: &Arc<Self>, mem_mib: u64, cpu_workers: u64, seconds: u64) -> StartOutcome {
        let mut s = self.state_guard();
        if s.running {
            tracing::debug!("start rejected, job already running");
            return StartOutcome::AlreadyRunning;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let workers = spawn_workers(cpu_workers, &cancel);
        let expire = CancellationToken::new();

        let now = Utc::now();
        s.running = true;
        s.started_at = Some(now);
        s.ends_at = Some(now + TimeDelta::seconds(seconds as i64));
        s.mem_mib = mem_mib;
        s.cpu_workers = cpu_workers;
        s.workers = workers;
        s.cancel = Some(cancel);
        s.expire = Some(expire.clone());
        s.note.clear();
        s.ticks = 0;

        // Ballast fill runs off the control path so start returns immediately.
        // Old blocks are released wholesale before the new fill begins.
        let gen = self.pool.reset();
        let controller = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = controller.pool.fill(gen, mem_mib) {
                tracing::warn!(error = %e, "memory allocation failed, job continues");
                controller.set_note(format!("memory allocation failed: {e}"));
            }
        });

        // Auto-expire: sleep for the requested duration, then stop the job if
        // it is still the one running. An explicit stop cancels the token, and
        // stop is idempotent regardless.
        let controller = Arc::clone(self);
        let deadline = Duration::from_secs(seconds);
        tokio::spawn(async move {
            tokio::select! {
                _ = expire.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    if controller.is_running() {
                        controller.stop("time expired");
                    }
                }
            }
        });

        tracing::info!(mem_mib, cpu_workers, seconds, "job started");
        StartOutcome::Started
    }

    /// Stop the job, releasing workers and ballast.
    ///
    /// Idempotent: stopping an already-stopped job records the note
    /// "already stopped" and still clears any stray memory.
    pub fn stop(&self, reason: &str) {
        let mut s = self.state_guard();

        if !s.running && s.workers.is_empty() {
            s.ends_at = Some(Utc::now());
            s.note = "already stopped".to_string();
            self.pool.clear();
            tracing::debug!("stop requested while already stopped");
            return;
        }

        if let Some(cancel) = s.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
        for worker in s.workers.drain(..) {
            worker.shutdown(WORKER_SHUTDOWN_WAIT);
        }
        if let Some(expire) = s.expire.take() {
            expire.cancel();
        }
        self.pool.clear();

        s.running = false;
        s.ends_at = Some(Utc::now());
        s.note = reason.to_string();

        tracing::info!(reason, "job stopped");
    }

    /// Compute a point-in-time status view.
    ///
    /// Side-effecting read, deliberately: if the deadline has passed while
    /// the job still shows as running, this triggers `stop("time expired")`
    /// through the same mutex path as an explicit stop, then reports the
    /// post-stop state with `remaining_seconds == 0`.
    pub fn snapshot(&self) -> StatusView {
        let now = Utc::now();
        let remaining = {
            let s = self.state_guard();
            if s.running {
                s.ends_at.map(|ends| (ends - now).num_seconds().max(0))
            } else {
                None
            }
        };

        if remaining == Some(0) {
            self.stop("time expired");
        }

        let s = self.state_guard();
        StatusView {
            running: s.running,
            started_at: s.started_at.map(epoch_secs),
            ends_at: s.ends_at.map(epoch_secs),
            mem_mib: s.mem_mib,
            cpu_workers: s.cpu_workers,
            worker_ids: s.workers.iter().map(WorkerHandle::id).collect(),
            note: s.note.clone(),
            ticks: s.ticks,
            now: epoch_secs(now),
            remaining_seconds: remaining,
            mem_blocks_mib: self.pool.len_mib(),
        }
    }

    /// Increment the publish tick counter. No-op once stopped, so the counter
    /// freezes at its final value.
    pub fn tick(&self) -> u64 {
        let mut s = self.state_guard();
        if s.running {
            s.ticks += 1;
        }
        s.ticks
    }

    pub fn is_running(&self) -> bool {
        self.state_guard().running
    }

    fn set_note(&self, note: String) {
        self.state_guard().note = note;
    }

    fn state_guard(&self) -> MutexGuard<'_, JobState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("job state mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Force the deadline into the past and disarm the timer, so tests can
    /// exercise the snapshot-triggered expiry deterministically.
    #[cfg(test)]
    fn backdate_deadline(&self) {
        let mut s = self.state_guard();
        if let Some(expire) = s.expire.take() {
            expire.cancel();
        }
        s.ends_at = Some(Utc::now() - TimeDelta::seconds(1));
    }
}
