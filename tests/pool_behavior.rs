//! End-to-end behaviour of the worker pool

use rust_worker_pool::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "timed out waiting for {}",
            what
        );
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_ten_jobs_on_three_workers() {
    init_logging();
    let pool = WorkerPool::new(3).expect("Failed to create pool");
    assert_eq!(pool.active_workers(), 3);

    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..10 {
        let seen = Arc::clone(&seen);
        pool.schedule(move || {
            seen.lock().unwrap().push(i);
            Ok(())
        })
        .expect("Failed to schedule job");
    }

    pool.shutdown().expect("Failed to shutdown pool");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 10, "a job ran twice or was skipped");
    let unique: HashSet<_> = seen.iter().copied().collect();
    assert_eq!(unique, (0..10).collect::<HashSet<_>>());
    assert_eq!(pool.active_workers(), 0);
    assert_eq!(pool.state(), PoolState::Stopped);
}

#[test]
fn test_concurrent_submitters_run_every_job_once() {
    init_logging();
    let pool = Arc::new(WorkerPool::new(4).expect("Failed to create pool"));
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..1000).map(|_| AtomicUsize::new(0)).collect());

    let submitters: Vec<_> = (0..10)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let runs = Arc::clone(&runs);
            thread::spawn(move || {
                for i in 0..100 {
                    let runs = Arc::clone(&runs);
                    let slot = t * 100 + i;
                    pool.schedule(move || {
                        runs[slot].fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .expect("Failed to schedule job");
                }
            })
        })
        .collect();
    for handle in submitters {
        handle.join().expect("Submitter panicked");
    }

    pool.shutdown().expect("Failed to shutdown pool");

    assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
    assert_eq!(pool.total_jobs_scheduled(), 1000);
    assert_eq!(pool.total_jobs_processed(), 1000);
}

#[test]
fn test_single_worker_preserves_submission_order() {
    init_logging();
    let pool = WorkerPool::new(1).expect("Failed to create pool");
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..50 {
        pool.schedule_with(
            |(order, i): (Arc<Mutex<Vec<usize>>>, usize)| {
                order.lock().unwrap().push(i);
                Ok(())
            },
            (Arc::clone(&order), i),
        )
        .expect("Failed to schedule job");
    }
    pool.shutdown().expect("Failed to shutdown pool");

    assert_eq!(*order.lock().unwrap(), (0..50).collect::<Vec<_>>());
}

#[test]
fn test_queue_size_while_worker_is_busy() {
    init_logging();
    let pool = WorkerPool::new(1).expect("Failed to create pool");
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    pool.schedule(move || {
        let _ = started_tx.send(());
        let _ = release_rx.recv();
        Ok(())
    })
    .expect("Failed to schedule blocking job");
    started_rx.recv().expect("Blocking job never started");

    assert_eq!(pool.current_job_size(), 0);
    for n in 1..=7 {
        pool.schedule(|| Ok(())).expect("Failed to schedule job");
        assert_eq!(pool.current_job_size(), n);
    }

    release_tx.send(()).unwrap();
    pool.shutdown().expect("Failed to shutdown pool");
    assert_eq!(pool.current_job_size(), 0);
}

#[test]
fn test_shutdown_waits_for_slow_jobs() {
    init_logging();
    let pool = WorkerPool::new(2).expect("Failed to create pool");
    let finished = Arc::new(AtomicUsize::new(0));

    for _ in 0..4 {
        let finished = Arc::clone(&finished);
        pool.schedule(move || {
            thread::sleep(Duration::from_millis(50));
            finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to schedule job");
    }

    pool.shutdown().expect("Failed to shutdown pool");
    assert_eq!(finished.load(Ordering::SeqCst), 4);
    assert_eq!(pool.active_workers(), 0);
}

#[test]
fn test_faulting_job_does_not_shrink_pool() {
    init_logging();
    let faults = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&faults);
    let pool = WorkerPool::builder()
        .size(1)
        .fault_observer(move |fault: &JobFault| sink.lock().unwrap().push(fault.clone()))
        .build()
        .expect("Failed to create pool");

    let ran = Arc::new(AtomicUsize::new(0));
    pool.schedule(|| panic!("job blew up")).unwrap();
    for _ in 0..3 {
        let ran = Arc::clone(&ran);
        pool.schedule(move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    }

    pool.shutdown().expect("Failed to shutdown pool");

    assert_eq!(ran.load(Ordering::SeqCst), 3);
    let faults = faults.lock().unwrap();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].worker_id, 0);
    assert_eq!(faults[0].job_type, "ClosureJob");
    assert_eq!(faults[0].kind, FaultKind::Panic("job blew up".to_string()));
}

#[test]
fn test_terminate_worker_policy_shrinks_pool() {
    init_logging();
    let pool = WorkerPool::builder()
        .size(1)
        .fault_policy(FaultPolicy::TerminateWorker)
        .build()
        .expect("Failed to create pool");

    pool.schedule(|| Err(PoolError::job_failed("fatal"))).unwrap();
    wait_until("the worker to exit", || pool.active_workers() == 0);

    // Accepted, but no worker is left to run it.
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_clone = Arc::clone(&ran);
    pool.schedule(move || {
        ran_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert_eq!(pool.current_job_size(), 1);

    pool.shutdown().expect("Failed to shutdown pool");
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(pool.total_jobs_failed(), 1);
}

#[test]
fn test_rejections_after_shutdown() {
    init_logging();
    let pool = WorkerPool::new(2).expect("Failed to create pool");
    pool.shutdown().expect("Failed to shutdown pool");

    let err = pool.schedule(|| Ok(())).unwrap_err();
    assert!(matches!(err, PoolError::PoolClosed { .. }));
    assert!(err.is_rejection());

    pool.shutdown().expect("Repeated shutdown should succeed");
}

#[test]
fn test_zero_workers_rejected() {
    init_logging();
    match WorkerPool::new(0) {
        Err(PoolError::InvalidConfig { parameter, .. }) => assert_eq!(parameter, "size"),
        other => panic!("expected InvalidConfig, got {:?}", other),
    }

    let config = WorkerPoolConfig::from_json(r#"{ "size": 0 }"#).unwrap();
    assert!(matches!(
        WorkerPool::with_config(config),
        Err(PoolError::InvalidConfig { .. })
    ));
}

#[test]
fn test_pool_from_json_config() {
    init_logging();
    let config = WorkerPoolConfig::from_json(
        r#"{ "size": 2, "thread_name_prefix": "redis", "fault_policy": "isolate" }"#,
    )
    .unwrap();
    let pool = WorkerPool::with_config(config).expect("Failed to create pool");

    let (tx, rx) = mpsc::channel();
    pool.schedule(move || {
        let name = thread::current().name().map(String::from);
        tx.send(name).map_err(|e| PoolError::job_failed(e.to_string()))
    })
    .unwrap();
    pool.shutdown().unwrap();

    let name = rx.recv().unwrap().expect("worker threads are named");
    assert!(name == "redis-0" || name == "redis-1", "unexpected name {}", name);
}

#[test]
fn test_worker_id_outside_pool_is_none() {
    assert_eq!(current_worker_id(), None);
}

#[test]
fn test_job_can_shut_down_its_own_pool() {
    init_logging();
    let pool = Arc::new(WorkerPool::new(2).expect("Failed to create pool"));
    let (tx, rx) = mpsc::channel();

    let handle = Arc::clone(&pool);
    pool.schedule(move || {
        let result = handle.shutdown();
        tx.send(result).map_err(|e| PoolError::job_failed(e.to_string()))
    })
    .expect("Failed to schedule job");

    rx.recv()
        .expect("job never reported")
        .expect("shutdown from a job failed");
    assert_eq!(pool.state(), PoolState::Stopped);
    assert!(matches!(
        pool.schedule(|| Ok(())),
        Err(PoolError::PoolClosed { .. })
    ));

    wait_until("the calling worker to exit", || pool.active_workers() == 0);
    assert_eq!(pool.total_jobs_processed(), 1);
    assert_eq!(pool.total_jobs_panicked(), 0);
    pool.shutdown().expect("Repeated shutdown should succeed");
}

#[test]
fn test_job_dropping_last_pool_handle() {
    init_logging();
    let pool = Arc::new(WorkerPool::new(2).expect("Failed to create pool"));
    let stats = pool.worker_stats();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (dropped_tx, dropped_rx) = mpsc::channel();

    let handle = Arc::clone(&pool);
    pool.schedule(move || {
        let _ = release_rx.recv();
        drop(handle);
        dropped_tx
            .send(())
            .map_err(|e| PoolError::job_failed(e.to_string()))
    })
    .expect("Failed to schedule job");

    drop(pool);
    release_tx.send(()).unwrap();
    dropped_rx.recv().expect("the pool was never dropped");

    let processed = || stats.iter().map(|s| s.get_jobs_processed()).sum::<u64>();
    wait_until("the job to finish", || processed() == 1);
    assert_eq!(stats.iter().map(|s| s.get_jobs_panicked()).sum::<u64>(), 0);
}
