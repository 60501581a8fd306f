//! Job trait and related types

use crate::core::error::{PoolError, Result};
use std::fmt;

/// A unit of work executed exactly once by some worker of the pool
pub trait Job: Send {
    /// Execute the job
    ///
    /// # Errors
    ///
    /// Returns an error if the job execution fails. The error is reported to
    /// the pool's fault observer; it never reaches the submitter.
    fn execute(&mut self) -> Result<()>;

    /// Get the job's type name for debugging and fault reports
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob = Box<dyn Job>;

/// Helper to create a job from a closure
pub struct ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            name: "ClosureJob".to_string(),
        }
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn execute(&mut self) -> Result<()> {
        match self.closure.take() {
            Some(closure) => closure(),
            None => Err(PoolError::other(
                "ClosureJob already executed - cannot execute twice",
            )),
        }
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}

/// A function bound to the arguments it was scheduled with.
///
/// The arguments are captured when the job is created and handed to the
/// function by value when a worker runs it. Use a tuple for several arguments.
pub struct BoundJob<F, A>
where
    F: FnOnce(A) -> Result<()> + Send,
    A: Send,
{
    call: Option<(F, A)>,
}

impl<F, A> BoundJob<F, A>
where
    F: FnOnce(A) -> Result<()> + Send,
    A: Send,
{
    /// Bind `f` to `args`
    pub fn new(f: F, args: A) -> Self {
        Self {
            call: Some((f, args)),
        }
    }
}

impl<F, A> Job for BoundJob<F, A>
where
    F: FnOnce(A) -> Result<()> + Send,
    A: Send,
{
    fn execute(&mut self) -> Result<()> {
        match self.call.take() {
            Some((f, args)) => f(args),
            None => Err(PoolError::other(
                "BoundJob already executed - cannot execute twice",
            )),
        }
    }

    fn job_type(&self) -> &str {
        "BoundJob"
    }
}
