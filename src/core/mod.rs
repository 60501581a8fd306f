//! Core types and traits for the worker pool

pub mod error;
pub mod fault;
pub mod job;

pub use error::{PoolError, Result};
pub use fault::{FaultKind, FaultObserver, FaultPolicy, JobFault, LogFaultObserver};
pub use job::{BoundJob, BoxedJob, ClosureJob, Job};
