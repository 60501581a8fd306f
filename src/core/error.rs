//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// The pool has been shut down and no longer accepts jobs
    #[error("Worker pool '{pool_name}' is closed")]
    PoolClosed {
        /// Name of the worker pool
        pool_name: String,
    },

    /// Shutdown is in progress
    #[error("Worker pool is shutting down ({pending_jobs} entries pending)")]
    ShuttingDown {
        /// Number of queued entries at the time of the rejected call
        pending_jobs: usize,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// Returned by a job body to report a failure
    #[error("Job failed: {message}")]
    JobFailed {
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl PoolError {
    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a pool closed error
    pub fn pool_closed(pool_name: impl Into<String>) -> Self {
        PoolError::PoolClosed {
            pool_name: pool_name.into(),
        }
    }

    /// Create a shutting down error
    pub fn shutting_down(pending_jobs: usize) -> Self {
        PoolError::ShuttingDown { pending_jobs }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a job failure, for use inside job bodies
    pub fn job_failed(message: impl Into<String>) -> Self {
        PoolError::JobFailed {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PoolError::Other(msg.into())
    }

    /// Whether the error rejects a submission because the pool is stopping or stopped
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PoolError::PoolClosed { .. } | PoolError::ShuttingDown { .. }
        )
    }
}
