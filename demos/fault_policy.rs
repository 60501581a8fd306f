//! Fault policy example
//!
//! Shows the difference between isolating job faults and letting a fault
//! terminate the worker that ran the job.
//!
//! Run with: RUST_LOG=warn cargo run --example fault_policy

use rust_worker_pool::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn run(policy: FaultPolicy) -> Result<()> {
    let faults = Arc::new(AtomicUsize::new(0));
    let fault_count = Arc::clone(&faults);
    let pool = WorkerPool::builder()
        .size(1)
        .fault_policy(policy)
        .fault_observer(move |fault: &JobFault| {
            fault_count.fetch_add(1, Ordering::SeqCst);
            println!("  observed: {}", fault);
        })
        .build()?;

    pool.schedule(|| Err(PoolError::job_failed("could not reach the store")))?;
    thread::sleep(Duration::from_millis(50));

    let ran = Arc::new(AtomicUsize::new(0));
    let ran_clone = Arc::clone(&ran);
    pool.schedule(move || {
        ran_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;
    thread::sleep(Duration::from_millis(50));

    println!(
        "  active workers: {}, follow-up job ran: {}, still queued: {}",
        pool.active_workers(),
        ran.load(Ordering::SeqCst) == 1,
        pool.current_job_size()
    );

    pool.shutdown()?;
    println!("  faults observed: {}", faults.load(Ordering::SeqCst));
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Rust Worker Pool - Fault Policy Example ===\n");

    println!("1. FaultPolicy::Isolate");
    run(FaultPolicy::Isolate)?;

    println!("\n2. FaultPolicy::TerminateWorker");
    run(FaultPolicy::TerminateWorker)?;

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
