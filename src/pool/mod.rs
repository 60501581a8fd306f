//! Worker pool and worker implementations

pub mod config;
pub mod worker;
pub mod worker_pool;

pub use config::WorkerPoolConfig;
pub use worker::{current_worker_id, Worker, WorkerStatSnapshot, WorkerStats};
pub use worker_pool::{PoolState, PoolStats, WorkerPool, WorkerPoolBuilder};
