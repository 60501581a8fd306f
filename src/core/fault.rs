//! Job fault reporting
//!
//! A job faults when it returns an error or panics. Faults never travel back to
//! the code that scheduled the job; instead the worker that ran it builds a
//! [`JobFault`] and hands it to the pool's [`FaultObserver`]. What the worker
//! does next is decided by the pool's [`FaultPolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// How a fault surfaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    /// The job returned an error
    Error(String),
    /// The job panicked
    Panic(String),
}

impl FaultKind {
    /// Build a panic fault from a `catch_unwind` payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        FaultKind::Panic(message)
    }

    /// The fault message without its kind
    pub fn message(&self) -> &str {
        match self {
            FaultKind::Error(m) | FaultKind::Panic(m) => m,
        }
    }

    /// Whether the job panicked
    pub fn is_panic(&self) -> bool {
        matches!(self, FaultKind::Panic(_))
    }
}

/// A fault raised while a worker executed a job
#[derive(Debug, Clone, Serialize)]
pub struct JobFault {
    /// Worker that ran the job
    pub worker_id: usize,
    /// Type name of the faulting job
    pub job_type: String,
    /// What went wrong
    pub kind: FaultKind,
    /// When the fault was observed
    pub occurred_at: DateTime<Utc>,
}

impl JobFault {
    pub(crate) fn new(worker_id: usize, job_type: impl Into<String>, kind: FaultKind) -> Self {
        Self {
            worker_id,
            job_type: job_type.into(),
            kind,
            occurred_at: Utc::now(),
        }
    }
}

impl fmt::Display for JobFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.kind.is_panic() {
            "panicked"
        } else {
            "failed"
        };
        write!(
            f,
            "{} on worker #{} {}: {}",
            self.job_type,
            self.worker_id,
            verb,
            self.kind.message()
        )
    }
}

/// What a worker does after one of its jobs faults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Report the fault and keep the worker running
    #[default]
    Isolate,
    /// Report the fault, then stop the worker for good.
    ///
    /// Each fault permanently removes one worker from the pool. Once every
    /// worker has stopped, queued jobs are never run.
    TerminateWorker,
}

/// Receives every fault raised by jobs of a pool.
///
/// Called on the worker thread that ran the job, so implementations must be
/// cheap and must not block on the pool.
pub trait FaultObserver: Send + Sync {
    /// Handle a single fault
    fn on_fault(&self, fault: &JobFault);
}

impl<F> FaultObserver for F
where
    F: Fn(&JobFault) + Send + Sync,
{
    fn on_fault(&self, fault: &JobFault) {
        self(fault)
    }
}

/// Default observer that writes faults to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFaultObserver;

impl FaultObserver for LogFaultObserver {
    fn on_fault(&self, fault: &JobFault) {
        match &fault.kind {
            FaultKind::Panic(_) => log::error!("{}", fault),
            FaultKind::Error(_) => log::warn!("{}", fault),
        }
    }
}
