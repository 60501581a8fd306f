//! # Rust Worker Pool
//!
//! A fixed-size worker pool: a bounded set of long-lived threads pulling jobs
//! from a shared unbounded FIFO queue, with graceful drain-then-join shutdown.
//!
//! ## Features
//!
//! - **Fixed Workers**: exactly `size` threads, spawned eagerly, ids `0..size`
//! - **FIFO Queue**: unbounded multi-producer multi-consumer queue on crossbeam channels
//! - **Fire-and-forget Scheduling**: `schedule` never waits for a free worker
//! - **Graceful Shutdown**: one stop signal per worker, queued behind all accepted jobs
//! - **Fault Isolation**: job errors and panics go to a pluggable observer
//! - **Worker Statistics**: per-worker counters and serializable snapshots
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(3)?;
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! for i in 0..10 {
//!     let seen = Arc::clone(&seen);
//!     pool.schedule(move || {
//!         seen.lock().unwrap().push(i);
//!         Ok(())
//!     })?;
//! }
//!
//! // Blocks until every queued job has run and every worker has exited
//! pool.shutdown()?;
//!
//! let mut seen = seen.lock().unwrap().clone();
//! seen.sort();
//! assert_eq!(seen, (0..10).collect::<Vec<_>>());
//! # Ok(())
//! # }
//! ```
//!
//! ## Fault Handling
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::builder()
//!     .size(1)
//!     .fault_policy(FaultPolicy::Isolate)
//!     .fault_observer(|fault: &JobFault| eprintln!("{}", fault))
//!     .build()?;
//!
//! pool.schedule(|| Err(PoolError::job_failed("bad input")))?;
//! pool.schedule(|| Ok(()))?; // still runs: the worker survived
//! pool.shutdown()?;
//! assert_eq!(pool.total_jobs_failed(), 1);
//! assert_eq!(pool.total_jobs_processed(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//!
//! struct Increment {
//!     key: String,
//! }
//!
//! impl Job for Increment {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("incrementing {}", self.key);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "Increment"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = WorkerPool::new(2)?;
//! pool.submit(Increment {
//!     key: "concurrency_test".to_string(),
//! })?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::core::{
    BoundJob, BoxedJob, ClosureJob, FaultKind, FaultObserver, FaultPolicy, Job, JobFault,
    LogFaultObserver, PoolError, Result,
};
pub use crate::pool::{
    current_worker_id, PoolState, PoolStats, WorkerPool, WorkerPoolBuilder, WorkerPoolConfig,
    WorkerStats,
};
