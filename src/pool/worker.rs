//! Worker thread implementation

use crate::core::{BoxedJob, FaultKind, FaultObserver, FaultPolicy, JobFault, PoolError, Result};
use crate::queue::{Entry, JobQueue};
use parking_lot::Mutex;
use serde::Serialize;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{span, Level};

thread_local! {
    // (pool id, worker id)
    static WORKER_ID: Cell<Option<(u64, usize)>> = const { Cell::new(None) };
}

/// Identity of the worker running the calling code.
///
/// Returns `Some(id)` with `id` in `[0, size)` inside a job, `None` on any
/// thread that is not a pool worker.
pub fn current_worker_id() -> Option<usize> {
    WORKER_ID.with(Cell::get).map(|(_, id)| id)
}

/// Worker id of the calling thread if it belongs to the pool `pool_id`
pub(crate) fn current_worker_of(pool_id: u64) -> Option<usize> {
    WORKER_ID
        .with(Cell::get)
        .and_then(|(pool, id)| (pool == pool_id).then_some(id))
}

/// Job run time in whole microseconds, saturating at `u64::MAX`
fn micros_saturating(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs that completed successfully
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that returned an error
    pub jobs_failed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent running jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkerStatSnapshot {
    /// Jobs that completed successfully
    pub jobs_processed: u64,
    /// Jobs that returned an error
    pub jobs_failed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Time spent running jobs (microseconds)
    pub total_processing_time_us: u64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, outcome: Option<&FaultKind>, elapsed_us: u64) {
        let counter = match outcome {
            None => &self.jobs_processed,
            Some(FaultKind::Error(_)) => &self.jobs_failed,
            Some(FaultKind::Panic(_)) => &self.jobs_panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(elapsed_us, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_processed() + self.get_jobs_failed() + self.get_jobs_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> WorkerStatSnapshot {
        WorkerStatSnapshot {
            jobs_processed: self.get_jobs_processed(),
            jobs_failed: self.get_jobs_failed(),
            jobs_panicked: self.get_jobs_panicked(),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Raises the worker's finished flag when the thread leaves its run loop,
/// including by unwinding
struct FinishGuard(Arc<AtomicBool>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Why a worker's run loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Stopped,
    Faulted,
}

/// A long-lived thread that takes entries off a [`JobQueue`] until it
/// dequeues a stop signal
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    finished: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker that immediately starts pulling from `queue`
    ///
    /// # Arguments
    ///
    /// * `pool_id` - Identity of the owning pool
    /// * `id` - Identity of this worker within its pool
    /// * `name` - OS thread name
    /// * `queue` - Queue shared with the pool and the other workers
    /// * `policy` - What to do after a job faults
    /// * `observer` - Receives every fault
    pub(crate) fn spawn(
        pool_id: u64,
        id: usize,
        name: String,
        queue: Arc<JobQueue>,
        policy: FaultPolicy,
        observer: Arc<dyn FaultObserver>,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);
        let finished = Arc::new(AtomicBool::new(false));
        let guard = FinishGuard(Arc::clone(&finished));

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                let _guard = guard;
                WORKER_ID.with(|cell| cell.set(Some((pool_id, id))));
                Self::run(id, &queue, &stats_clone, policy, observer.as_ref());
            })
            .map_err(|e| PoolError::spawn_with_source(id, "cannot create worker thread", e))?;

        Ok(Self {
            id,
            thread: Mutex::new(Some(thread)),
            finished,
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Whether the worker has left its run loop
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Wait for the worker thread to exit.
    ///
    /// Only the first call waits; the handle is released before blocking so
    /// other threads can keep inspecting the worker.
    pub fn join(&self) -> Result<()> {
        let thread = self.thread.lock().take();
        if let Some(thread) = thread {
            thread
                .join()
                .map_err(|_| PoolError::join(self.id, "worker thread panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop
    fn run(
        id: usize,
        queue: &JobQueue,
        stats: &WorkerStats,
        policy: FaultPolicy,
        observer: &dyn FaultObserver,
    ) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("worker #{} started", id);

        let exit = loop {
            match queue.pop() {
                Entry::Stop => break Exit::Stopped,
                Entry::Run(mut job) => {
                    let Some(fault) = Self::execute_job(id, &mut job, stats) else {
                        continue;
                    };
                    #[cfg(feature = "tracing")]
                    crate::tracing::metrics::record_fault(&fault);
                    observer.on_fault(&fault);
                    if policy == FaultPolicy::TerminateWorker {
                        break Exit::Faulted;
                    }
                }
            }
        };

        match exit {
            Exit::Stopped => log::debug!(
                "worker #{} stopped after {} jobs ({} failed, {} panicked)",
                id,
                stats.get_jobs_processed(),
                stats.get_jobs_failed(),
                stats.get_jobs_panicked()
            ),
            Exit::Faulted => log::warn!(
                "worker #{} terminated by a job fault; the pool has one worker fewer",
                id
            ),
        }
    }

    /// Execute a single job with panic protection
    fn execute_job(id: usize, job: &mut BoxedJob, stats: &WorkerStats) -> Option<JobFault> {
        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_type = job.job_type());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| job.execute()));
        let elapsed_us = micros_saturating(start.elapsed());

        let kind = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(FaultKind::Error(e.to_string())),
            Err(payload) => Some(FaultKind::from_panic(payload)),
        };
        stats.record(kind.as_ref(), elapsed_us);

        kind.map(|kind| JobFault::new(id, job.job_type(), kind))
    }
}
