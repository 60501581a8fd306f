//! Tracing integration for observability.
//!
//! Available with the `tracing` feature. Workers run inside a `worker` span and
//! each job inside a `job_execution` span; [`TracedJob`] additionally carries
//! the submitter's span onto the worker thread.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_worker_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_worker_pool=debug".parse().unwrap()))
//!     .init();
//!
//! let pool = WorkerPool::new(4)?;
//! let span = tracing::info_span!("import", batch = 7);
//! let _guard = span.enter();
//! pool.submit_traced(ClosureJob::new(|| Ok(())))?;
//! ```

use crate::core::{Job, Result};
use crate::pool::WorkerPool;

/// A job wrapper that propagates tracing context across thread boundaries.
///
/// The span current at construction time is entered while the inner job runs.
pub struct TracedJob<J: Job> {
    inner: J,
    span: tracing::Span,
}

impl<J: Job> TracedJob<J> {
    /// Wrap `job`, capturing the current span
    pub fn new(job: J) -> Self {
        Self {
            inner: job,
            span: tracing::Span::current(),
        }
    }

    /// Wrap `job` with an explicit span
    pub fn with_span(job: J, span: tracing::Span) -> Self {
        Self { inner: job, span }
    }
}

impl<J: Job> Job for TracedJob<J> {
    fn execute(&mut self) -> Result<()> {
        let _guard = self.span.enter();
        self.inner.execute()
    }

    fn job_type(&self) -> &str {
        self.inner.job_type()
    }
}

impl WorkerPool {
    /// Submit a job that runs inside the caller's current span
    pub fn submit_traced<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit(TracedJob::new(job))
    }
}

/// Structured events for pool lifecycle and faults.
pub mod metrics {
    use crate::core::JobFault;

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(pool_name: &str, num_workers: usize) {
        tracing::info!(
            pool = pool_name,
            workers = num_workers,
            "worker pool started"
        );
    }

    /// Records a job fault.
    #[inline]
    pub fn record_fault(fault: &JobFault) {
        tracing::warn!(
            worker_id = fault.worker_id,
            job_type = %fault.job_type,
            panicked = fault.kind.is_panic(),
            message = %fault.kind.message(),
            "job fault"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(pool_name: &str, jobs_processed: u64, jobs_failed: u64) {
        tracing::info!(
            pool = pool_name,
            jobs_processed = jobs_processed,
            jobs_failed = jobs_failed,
            "worker pool shutdown complete"
        );
    }
}
