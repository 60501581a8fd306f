use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rust_worker_pool::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn benchmark_pool_lifecycle(c: &mut Criterion) {
    c.bench_function("pool_create_and_shutdown_4", |b| {
        b.iter(|| {
            let pool = WorkerPool::new(4).expect("Failed to create pool");
            pool.shutdown().expect("Failed to shutdown pool");
        });
    });
}

fn benchmark_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");

    group.bench_function("lightweight_jobs_100", |b| {
        b.iter_batched(
            || WorkerPool::new(4).expect("Failed to create pool"),
            |pool| {
                for _ in 0..100 {
                    pool.schedule(|| {
                        black_box(1 + 1);
                        Ok(())
                    })
                    .expect("Failed to schedule job");
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("bound_argument_jobs_100", |b| {
        b.iter_batched(
            || WorkerPool::new(4).expect("Failed to create pool"),
            |pool| {
                for i in 0..100u64 {
                    pool.schedule_with(
                        |(a, b): (u64, u64)| {
                            black_box(a.wrapping_mul(b));
                            Ok(())
                        },
                        (i, i + 1),
                    )
                    .expect("Failed to schedule job");
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_concurrent_submission(c: &mut Criterion) {
    c.bench_function("concurrent_submission_4_threads", |b| {
        b.iter_batched(
            || Arc::new(WorkerPool::new(4).expect("Failed to create pool")),
            |pool| {
                let handles: Vec<_> = (0..4)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        std::thread::spawn(move || {
                            for _ in 0..25 {
                                pool.schedule(|| Ok(())).expect("Failed to schedule job");
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().expect("Thread panicked");
                }

                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("jobs_per_second", |b| {
        b.iter_batched(
            || {
                let pool = WorkerPool::new(8).expect("Failed to create pool");
                let counter = Arc::new(AtomicU64::new(0));
                (pool, counter)
            },
            |(pool, counter)| {
                for _ in 0..1000 {
                    let counter = Arc::clone(&counter);
                    pool.schedule(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    })
                    .expect("Failed to schedule job");
                }

                pool.shutdown().expect("Failed to shutdown pool");
                assert_eq!(counter.load(Ordering::Relaxed), 1000, "Not all jobs completed");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_pool_lifecycle,
    benchmark_schedule,
    benchmark_concurrent_submission,
    benchmark_throughput
);
criterion_main!(benches);
