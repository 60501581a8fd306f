//! Basic worker pool usage example
//!
//! Ten jobs update a shared JSON record held in an in-memory key/value store,
//! then the pool drains and shuts down.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_usage

use rust_worker_pool::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Stand-in for a pooled key/value store client
#[derive(Default)]
struct Store {
    data: Mutex<HashMap<String, String>>,
}

impl Store {
    fn set(&self, key: &str, value: String) {
        self.data.lock().unwrap().insert(key.to_string(), value);
    }

    /// Read-modify-write a JSON value under the store lock
    fn update(&self, key: &str, f: impl FnOnce(&mut Value)) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        let raw = data
            .get(key)
            .ok_or_else(|| PoolError::job_failed(format!("missing key {}", key)))?;
        let mut value: Value =
            serde_json::from_str(raw).map_err(|e| PoolError::job_failed(e.to_string()))?;
        f(&mut value);
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Rust Worker Pool - Basic Usage Example ===\n");

    let pool = WorkerPool::new(5)?;
    println!("1. Started worker pool with {} workers", pool.size());

    let store = Arc::new(Store::default());
    let test_key = "concurrency_test";
    store.set(test_key, json!({ "level": 0, "score": 0 }).to_string());

    println!("\n2. Scheduling jobs:");
    for i in 1..=10u64 {
        pool.schedule_with(
            move |(store, i): (Arc<Store>, u64)| {
                thread::sleep(Duration::from_millis(20));
                store.update(test_key, |record| {
                    let level = record["level"].as_u64().unwrap_or(0);
                    let score = record["score"].as_u64().unwrap_or(0);
                    record["level"] = json!(level + 1);
                    record["score"] = json!(score + i);
                })?;
                println!(
                    "  Job {} done on worker {}",
                    i,
                    current_worker_id().unwrap_or_default()
                );
                Ok(())
            },
            (Arc::clone(&store), i),
        )?;
    }
    println!("   Queued entries right after scheduling: {}", pool.current_job_size());

    println!("\n3. Shutting down (waits for queued jobs)...");
    pool.shutdown()?;

    println!("\n4. Final record: {}", store.get(test_key).unwrap_or_default());
    let stats = pool.stats();
    println!(
        "   Stats: {}",
        serde_json::to_string_pretty(&stats).map_err(|e| PoolError::other(e.to_string()))?
    );

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
