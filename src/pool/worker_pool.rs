//! Fixed-size worker pool implementation

use crate::core::{
    BoundJob, BoxedJob, ClosureJob, FaultObserver, FaultPolicy, Job, LogFaultObserver, PoolError,
    Result,
};
use crate::pool::config::WorkerPoolConfig;
use crate::pool::worker::{current_worker_of, Worker, WorkerStatSnapshot, WorkerStats};
use crate::queue::JobQueue;
use parking_lot::{Condvar, Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a pool. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// Accepting jobs, workers active
    Running,
    /// Stop signals enqueued, `shutdown` is waiting for workers
    ShuttingDown,
    /// Every worker has been joined
    Stopped,
}

/// Point-in-time view of a pool, suitable for logging as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStats {
    /// Configured number of workers
    pub size: usize,
    /// Lifecycle state
    pub state: PoolState,
    /// Entries waiting in the queue
    pub queued: usize,
    /// Worker threads still running
    pub active_workers: usize,
    /// Jobs accepted by the pool
    pub jobs_scheduled: u64,
    /// Jobs that completed successfully
    pub jobs_processed: u64,
    /// Jobs that returned an error
    pub jobs_failed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Per-worker counters, indexed by worker id
    pub workers: Vec<WorkerStatSnapshot>,
}

/// A fixed set of worker threads draining a shared FIFO job queue
///
/// # Shutdown Mechanism
///
/// [`shutdown`](Self::shutdown) enqueues one stop signal per worker behind
/// every job accepted so far, then joins the workers. Each worker exits when it
/// dequeues a stop signal, so all previously scheduled jobs run first.
///
/// Submissions and the start of shutdown are serialized by a state lock: a
/// job is either accepted ahead of all stop signals or rejected.
pub struct WorkerPool {
    id: u64,
    config: WorkerPoolConfig,
    queue: Arc<JobQueue>,
    state: RwLock<PoolState>,
    workers: Vec<Worker>,
    stopped: Mutex<bool>,
    stopped_signal: Condvar,
    total_jobs_scheduled: AtomicU64,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .field("queued", &self.queue.len())
            .field(
                "total_jobs_scheduled",
                &self.total_jobs_scheduled.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with `size` workers and default settings.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `size` is 0, `SpawnError` if a worker thread cannot
    /// be created.
    pub fn new(size: usize) -> Result<Self> {
        Self::with_config(WorkerPoolConfig::new(size))
    }

    /// Create a pool from a configuration, logging faults through `log`
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self> {
        Self::build(config, Arc::new(LogFaultObserver))
    }

    /// Start building a pool with a custom fault observer
    pub fn builder() -> WorkerPoolBuilder {
        WorkerPoolBuilder::default()
    }

    fn build(config: WorkerPoolConfig, observer: Arc<dyn FaultObserver>) -> Result<Self> {
        config.validate()?;

        let pool_id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(JobQueue::new());
        let mut workers = Vec::with_capacity(config.size);
        for id in 0..config.size {
            let name = format!("{}-{}", config.thread_name_prefix, id);
            match Worker::spawn(
                pool_id,
                id,
                name,
                Arc::clone(&queue),
                config.fault_policy,
                Arc::clone(&observer),
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    log::error!(
                        "worker pool '{}' failed to start: {}",
                        config.thread_name_prefix,
                        e
                    );
                    Self::stop_partial(&queue, workers);
                    return Err(e);
                }
            }
        }

        log::debug!(
            "worker pool '{}' started with {} workers ({:?} on fault)",
            config.thread_name_prefix,
            config.size,
            config.fault_policy
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(&config.thread_name_prefix, config.size);

        Ok(Self {
            id: pool_id,
            config,
            queue,
            state: RwLock::new(PoolState::Running),
            workers,
            stopped: Mutex::new(false),
            stopped_signal: Condvar::new(),
            total_jobs_scheduled: AtomicU64::new(0),
        })
    }

    /// Stop the workers spawned before construction failed
    fn stop_partial(queue: &JobQueue, workers: Vec<Worker>) {
        for _ in 0..workers.len() {
            queue.push_stop();
        }
        for worker in &workers {
            if let Err(e) = worker.join() {
                log::error!("{}", e);
            }
        }
    }

    /// Submit a job to the pool.
    ///
    /// Returns once the job is queued; it never waits for a free worker.
    /// Failures inside the job are reported to the fault observer, not here.
    ///
    /// # Errors
    ///
    /// - `ShuttingDown` - [`shutdown`](Self::shutdown) has started
    /// - `PoolClosed` - the pool has stopped
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.enqueue(Box::new(job))
    }

    /// Submit a closure as a job
    ///
    /// ```rust
    /// use rust_worker_pool::prelude::*;
    ///
    /// # fn main() -> Result<()> {
    /// let pool = WorkerPool::new(2)?;
    /// pool.schedule(|| {
    ///     println!("running on worker {:?}", current_worker_id());
    ///     Ok(())
    /// })?;
    /// pool.shutdown()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn schedule<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit a function together with the arguments it will be called with.
    ///
    /// ```rust
    /// use rust_worker_pool::prelude::*;
    ///
    /// # fn main() -> Result<()> {
    /// let pool = WorkerPool::new(1)?;
    /// pool.schedule_with(
    ///     |(key, score): (String, u32)| {
    ///         println!("{} = {}", key, score);
    ///         Ok(())
    ///     },
    ///     ("concurrency_test".to_string(), 10),
    /// )?;
    /// pool.shutdown()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn schedule_with<F, A>(&self, f: F, args: A) -> Result<()>
    where
        F: FnOnce(A) -> Result<()> + Send + 'static,
        A: Send + 'static,
    {
        self.submit(BoundJob::new(f, args))
    }

    fn enqueue(&self, job: BoxedJob) -> Result<()> {
        {
            let state = self.state.read();
            match *state {
                PoolState::Running => self.queue.push(job),
                PoolState::ShuttingDown => {
                    return Err(PoolError::shutting_down(self.queue.len()));
                }
                PoolState::Stopped => {
                    return Err(PoolError::pool_closed(&self.config.thread_name_prefix));
                }
            }
        }

        self.total_jobs_scheduled.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Shutdown the pool and wait for all workers to finish
    ///
    /// # Graceful Shutdown
    ///
    /// 1. Stops accepting new jobs
    /// 2. Enqueues one stop signal per worker behind the queued jobs
    /// 3. Waits, without a timeout, for every worker to drain and exit
    ///
    /// # Repeated Calls
    ///
    /// Only the first call performs the shutdown. A concurrent call blocks
    /// until the pool is stopped, a later call returns `Ok(())` at once.
    ///
    /// # Calling From a Job
    ///
    /// A job may shut down its own pool, directly or by dropping the last
    /// handle to it. The calling worker is not joined: it finishes the current
    /// job, dequeues its stop signal and exits on its own. Every other worker
    /// is joined before the call returns. Called from a job while another
    /// thread is already shutting the pool down, it returns at once.
    ///
    /// # Errors
    ///
    /// `JoinError` if a worker thread panicked outside of a job. The remaining
    /// workers are still joined and the pool still ends up stopped.
    pub fn shutdown(&self) -> Result<()> {
        let caller = current_worker_of(self.id);
        {
            let mut state = self.state.write();
            let current = *state;
            match current {
                PoolState::Running => {
                    *state = PoolState::ShuttingDown;
                    for _ in 0..self.config.size {
                        self.queue.push_stop();
                    }
                }
                PoolState::ShuttingDown => {
                    drop(state);
                    if caller.is_none() {
                        self.wait_stopped();
                    }
                    return Ok(());
                }
                PoolState::Stopped => return Ok(()),
            }
        }

        log::info!(
            "shutting down worker pool '{}' ({} entries queued)",
            self.config.thread_name_prefix,
            self.queue.len()
        );

        let mut result = Ok(());
        for worker in &self.workers {
            if Some(worker.id()) == caller {
                log::debug!(
                    "worker #{} shut its own pool down; it exits after the current job",
                    worker.id()
                );
                continue;
            }
            if let Err(e) = worker.join() {
                log::error!("{}", e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        *self.state.write() = PoolState::Stopped;
        *self.stopped.lock() = true;
        self.stopped_signal.notify_all();
        log::info!(
            "worker pool '{}' stopped: {} processed, {} failed, {} panicked",
            self.config.thread_name_prefix,
            self.total_jobs_processed(),
            self.total_jobs_failed(),
            self.total_jobs_panicked()
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            &self.config.thread_name_prefix,
            self.total_jobs_processed(),
            self.total_jobs_failed() + self.total_jobs_panicked(),
        );

        result
    }

    /// Block until the thread running `shutdown` has joined the workers
    fn wait_stopped(&self) {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            self.stopped_signal.wait(&mut stopped);
        }
    }

    /// Number of entries, jobs and stop signals, waiting in the queue.
    ///
    /// Best effort: under concurrent submission the value may be stale by the
    /// time it is returned.
    pub fn current_job_size(&self) -> usize {
        self.queue.len()
    }

    /// Configured number of workers
    pub fn size(&self) -> usize {
        self.config.size
    }

    /// Fault policy the workers were started with
    pub fn fault_policy(&self) -> FaultPolicy {
        self.config.fault_policy
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        *self.state.read()
    }

    /// Check if the pool accepts jobs
    pub fn is_running(&self) -> bool {
        self.state() == PoolState::Running
    }

    /// Number of worker threads still alive.
    ///
    /// Equals [`size`](Self::size) for a healthy running pool, drops when a
    /// worker is terminated by a fault or dequeues its stop signal, and is 0
    /// once `shutdown` returns on a thread outside the pool.
    pub fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_finished()).count()
    }

    /// Ids of the workers still running
    pub fn worker_ids(&self) -> Vec<usize> {
        self.workers
            .iter()
            .filter(|w| !w.is_finished())
            .map(Worker::id)
            .collect()
    }

    /// Get total number of jobs accepted
    pub fn total_jobs_scheduled(&self) -> u64 {
        self.total_jobs_scheduled.load(Ordering::Relaxed)
    }

    /// Get statistics for all workers, indexed by worker id
    pub fn worker_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.workers.iter().map(Worker::stats).collect()
    }

    /// Get total jobs completed successfully across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.workers.iter().map(|w| w.stats().get_jobs_processed()).sum()
    }

    /// Get total jobs failed across all workers
    pub fn total_jobs_failed(&self) -> u64 {
        self.workers.iter().map(|w| w.stats().get_jobs_failed()).sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.workers.iter().map(|w| w.stats().get_jobs_panicked()).sum()
    }

    /// Snapshot of the pool's counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.config.size,
            state: self.state(),
            queued: self.queue.len(),
            active_workers: self.active_workers(),
            jobs_scheduled: self.total_jobs_scheduled(),
            jobs_processed: self.total_jobs_processed(),
            jobs_failed: self.total_jobs_failed(),
            jobs_panicked: self.total_jobs_panicked(),
            workers: self.workers.iter().map(|w| w.stats().snapshot()).collect(),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.shutdown() {
                log::error!(
                    "failed to shut down worker pool '{}' during drop: {}",
                    self.config.thread_name_prefix,
                    e
                );
            }
        }
    }
}

/// Builder for [`WorkerPool`]
///
/// ```rust
/// use rust_worker_pool::prelude::*;
///
/// # fn main() -> Result<()> {
/// let pool = WorkerPool::builder()
///     .size(3)
///     .thread_name_prefix("ingest")
///     .fault_observer(|fault: &JobFault| eprintln!("{}", fault))
///     .build()?;
/// assert_eq!(pool.size(), 3);
/// pool.shutdown()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct WorkerPoolBuilder {
    config: WorkerPoolConfig,
    observer: Option<Arc<dyn FaultObserver>>,
}

impl WorkerPoolBuilder {
    /// Replace the whole configuration
    #[must_use]
    pub fn config(mut self, config: WorkerPoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of workers
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.config.size = size;
        self
    }

    /// Set thread name prefix
    #[must_use]
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Set the fault policy
    #[must_use]
    pub fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.config.fault_policy = policy;
        self
    }

    /// Route job faults to `observer` instead of the log
    #[must_use]
    pub fn fault_observer<O: FaultObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Validate the configuration and spawn the workers
    pub fn build(self) -> Result<WorkerPool> {
        let observer: Arc<dyn FaultObserver> = match self.observer {
            Some(observer) => observer,
            None => Arc::new(LogFaultObserver),
        };
        WorkerPool::build(self.config, observer)
    }
}
