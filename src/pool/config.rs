//! Worker pool configuration

use crate::core::{FaultPolicy, PoolError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`WorkerPool`](crate::pool::WorkerPool)
///
/// Can be built in code or loaded from JSON. Missing JSON fields take their
/// default values.
///
/// ```rust
/// use rust_worker_pool::prelude::*;
///
/// # fn main() -> Result<()> {
/// let config = WorkerPoolConfig::from_json(r#"{ "size": 3, "fault_policy": "isolate" }"#)?;
/// assert_eq!(config.size, 3);
/// assert_eq!(config.thread_name_prefix, "worker");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads. Must be greater than 0.
    pub size: usize,
    /// Thread name prefix; workers are named `{prefix}-{id}`
    pub thread_name_prefix: String,
    /// What a worker does after one of its jobs faults
    pub fault_policy: FaultPolicy,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            size: num_cpus::get(),
            thread_name_prefix: "worker".to_string(),
            fault_policy: FaultPolicy::default(),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration with the given number of workers.
    ///
    /// A size of 0 is kept as-is and rejected by [`validate`](Self::validate).
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the fault policy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Parse a configuration from JSON.
    ///
    /// Malformed input, including a negative or fractional `size`, is
    /// reported as [`PoolError::InvalidConfig`]. The parsed value is not
    /// validated; that happens when the pool is built.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PoolError::invalid_config("json", e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(PoolError::invalid_config(
                "size",
                "Number of workers must be greater than 0",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(PoolError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        Ok(())
    }
}
