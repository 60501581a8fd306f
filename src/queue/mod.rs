//! The shared job queue.
//!
//! [`JobQueue`] is an unbounded multi-producer multi-consumer FIFO built on a
//! crossbeam channel. It carries [`Entry`] values: either a job to run or a
//! stop signal telling the worker that dequeues it to exit. Stop signals are
//! ordinary entries, so they are ordered against jobs strictly by the time
//! they were pushed.
//!
//! # Example
//!
//! ```rust
//! use rust_worker_pool::queue::{Entry, JobQueue};
//! use rust_worker_pool::ClosureJob;
//!
//! let queue = JobQueue::new();
//! queue.push(Box::new(ClosureJob::new(|| Ok(()))));
//! queue.push_stop();
//! assert_eq!(queue.len(), 2);
//!
//! assert!(matches!(queue.pop(), Entry::Run(_)));
//! assert!(matches!(queue.pop(), Entry::Stop));
//! ```

use crate::core::BoxedJob;
use crossbeam::channel::{self, Receiver, Sender};
use std::fmt;

/// A single queue entry
pub enum Entry {
    /// A job to execute
    Run(BoxedJob),
    /// The worker that dequeues this entry must exit
    Stop,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Run(job) => write!(f, "Run({})", job.job_type()),
            Entry::Stop => f.write_str("Stop"),
        }
    }
}

/// Unbounded FIFO of [`Entry`] values shared by submitters and workers.
///
/// The queue owns both ends of its channel, so it never disconnects while it
/// is alive; `pop` simply blocks until an entry arrives.
pub struct JobQueue {
    sender: Sender<Entry>,
    receiver: Receiver<Entry>,
}

impl JobQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }

    /// Appends a job to the tail of the queue. Never blocks.
    pub fn push(&self, job: BoxedJob) {
        self.push_entry(Entry::Run(job));
    }

    /// Appends a stop signal to the tail of the queue
    pub fn push_stop(&self) {
        self.push_entry(Entry::Stop);
    }

    fn push_entry(&self, entry: Entry) {
        // We hold the receiver, so the channel cannot be disconnected.
        let _ = self.sender.send(entry);
    }

    /// Removes the head entry, blocking while the queue is empty.
    ///
    /// Each pushed entry wakes at most one blocked caller.
    pub fn pop(&self) -> Entry {
        self.receiver.recv().unwrap_or(Entry::Stop)
    }

    /// Number of queued entries, jobs and stop signals alike.
    ///
    /// Approximate under concurrent use: the value may be stale by the time
    /// the caller reads it.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue").field("len", &self.len()).finish()
    }
}
