//! Convenient re-exports for common types and traits

pub use crate::core::{
    BoundJob, BoxedJob, ClosureJob, FaultKind, FaultObserver, FaultPolicy, Job, JobFault,
    LogFaultObserver, PoolError, Result,
};
pub use crate::pool::{
    current_worker_id, PoolState, PoolStats, WorkerPool, WorkerPoolBuilder, WorkerPoolConfig,
    WorkerStats,
};
