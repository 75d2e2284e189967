//! Stress tests for YarnDB.
//!
//! These tests verify behavior under heavy load and concurrent access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use yarndb_core::{CoreError, Datastore, Value};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Number of distinct records.
    pub record_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            record_count: 1_000,
        }
    }
}

fn record_id(i: usize, record_count: usize) -> String {
    format!("stress_{}", i % record_count.max(1))
}

fn document(i: usize) -> Value {
    let dept = ["eng", "ops", "sales"][i % 3];
    Value::map([
        ("seq", Value::from(i64::try_from(i).unwrap_or(i64::MAX))),
        ("dept", Value::from(dept)),
    ])
}

fn populate(store: &Datastore, config: &StressConfig) {
    for i in 0..config.record_count {
        let _ = store.set(&record_id(i, config.record_count), document(i), "");
    }
}

/// Run a sequential write stress test.
pub fn stress_sequential_writes(store: &Datastore, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        match store.set(&record_id(i, config.record_count), document(i), "") {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent read stress test.
pub fn stress_concurrent_reads(store: Arc<Datastore>, config: &StressConfig) -> StressTestResult {
    populate(&store, config);

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let record_count = config.record_count;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let id = record_id(t * ops_per_thread + i, record_count);
                    match store.get(&id) {
                        Ok(Some(_)) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        _ => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run writers, readers, queries, and saves against one datastore at once.
///
/// Thread `t` cycles through set, get, query, merge, and (on thread 0) save.
pub fn stress_concurrent_mixed(store: Arc<Datastore>, config: &StressConfig) -> StressTestResult {
    populate(&store, config);

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let record_count = config.record_count;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let n = t * ops_per_thread + i;
                    let id = record_id(n, record_count);
                    let ok = match i % 5 {
                        0 | 1 => store.set(&id, document(n), "").is_ok(),
                        2 => store.get(&id).is_ok(),
                        3 => store.query("dept", &Value::from("eng")).is_ok(),
                        _ if t == 0 => store.save().is_ok(),
                        _ => store.merge().is_ok(),
                    };
                    let counter = if ok { &successful } else { &failed };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run threads that race for the single transaction slot.
///
/// A failed attempt is one that found the slot held. Successful attempts
/// commit one write each.
pub fn stress_transaction_contention(
    store: Arc<Datastore>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let record_count = config.record_count;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let n = t * ops_per_thread + i;
                    let result = store.transaction(|txn| {
                        txn.set(&record_id(n, record_count), document(n), "")?;
                        Ok(())
                    });
                    match result {
                        Ok(()) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(CoreError::TransactionActive) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            thread::yield_now();
                        }
                        Err(err) => panic!("unexpected transaction error: {err}"),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run a transaction abort stress test.
pub fn stress_transaction_aborts(store: &Datastore, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        // Every other transaction will fail intentionally
        let should_fail = i % 2 == 0;

        let result = store.transaction(|txn| {
            txn.set(&record_id(i, config.record_count), document(i), "")?;

            if should_fail {
                Err(CoreError::invalid_operation("intentional"))
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test_config;

    fn create_test_store() -> Datastore {
        Datastore::open_in_memory_with_config(test_config()).expect("Failed to create datastore")
    }

    #[test]
    fn test_sequential_writes() {
        let store = create_test_store();
        let config = StressConfig {
            operations: 1_000,
            record_count: 100,
            ..Default::default()
        };

        let result = stress_sequential_writes(&store, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 1_000);
        assert_eq!(store.status().record_count, 100);
    }

    #[test]
    fn test_concurrent_reads() {
        let store = Arc::new(create_test_store());
        let config = StressConfig {
            operations: 1_000,
            threads: 4,
            record_count: 100,
        };

        let result = stress_concurrent_reads(Arc::clone(&store), &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(store.stats().reads, 1_000);
    }

    #[test]
    fn test_concurrent_mixed() {
        let store = Arc::new(create_test_store());
        store.create_index("dept").unwrap();
        let config = StressConfig {
            operations: 2_000,
            threads: 4,
            record_count: 50,
        };

        let result = stress_concurrent_mixed(Arc::clone(&store), &config);
        assert_eq!(result.failed_ops, 0);

        let scanned: usize = store
            .merge()
            .unwrap()
            .values()
            .filter(|doc| doc.get("dept") == Some(&Value::from("eng")))
            .count();
        assert_eq!(store.query("dept", &Value::from("eng")).unwrap().len(), scanned);
    }

    #[test]
    fn test_transaction_contention() {
        let store = Arc::new(create_test_store());
        let config = StressConfig {
            operations: 400,
            threads: 4,
            record_count: 1_000,
        };

        let result = stress_transaction_contention(Arc::clone(&store), &config);
        assert_eq!(result.total_ops, 400);
        assert!(result.successful_ops > 0);
        assert_eq!(store.status().record_count, result.successful_ops);

        let stats = store.stats();
        assert_eq!(
            stats.transactions_committed,
            u64::try_from(result.successful_ops).unwrap()
        );
        assert!(!store.status().transaction_active);
    }

    #[test]
    fn test_transaction_aborts() {
        let store = create_test_store();
        let config = StressConfig {
            operations: 100,
            ..Default::default()
        };

        let result = stress_transaction_aborts(&store, &config);
        // Half should succeed, half should fail (intentionally)
        assert_eq!(result.successful_ops, 50);
        assert_eq!(result.failed_ops, 50);
        assert_eq!(store.status().record_count, 50);
    }
}
