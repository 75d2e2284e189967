//! Datastore statistics.
//!
//! Counters are atomic and can be read while operations are in progress.
//!
//! ```rust
//! use yarndb_core::{Datastore, Value};
//!
//! let store = Datastore::open_in_memory().unwrap();
//! store.set("u1", Value::map([("dept", "eng")]), "users").unwrap();
//! store.get("u1").unwrap();
//!
//! let stats = store.stats();
//! assert_eq!(stats.writes, 1);
//! assert_eq!(stats.reads, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a datastore.
#[derive(Debug, Default)]
pub struct DatastoreStats {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    /// Queries answered by walking every record.
    scans: AtomicU64,
    /// Queries answered from an index.
    index_lookups: AtomicU64,

    transactions_started: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_rolled_back: AtomicU64,
    transactions_expired: AtomicU64,

    saves: AtomicU64,
    shard_writes: AtomicU64,

    errors: AtomicU64,
}

impl DatastoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_start(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_commit(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_rollback(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_expired(&self) {
        self.transactions_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_shard_write(&self) {
        self.shard_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of read operations.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the total number of write operations.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of shard files written by saves.
    pub fn shard_writes(&self) -> u64 {
        self.shard_writes.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            reads: load(&self.reads),
            writes: load(&self.writes),
            deletes: load(&self.deletes),
            scans: load(&self.scans),
            index_lookups: load(&self.index_lookups),
            transactions_started: load(&self.transactions_started),
            transactions_committed: load(&self.transactions_committed),
            transactions_rolled_back: load(&self.transactions_rolled_back),
            transactions_expired: load(&self.transactions_expired),
            saves: load(&self.saves),
            shard_writes: load(&self.shard_writes),
            errors: load(&self.errors),
        }
    }
}

/// A point-in-time snapshot of datastore statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Total number of read operations.
    pub reads: u64,
    /// Total number of set operations, including committed puts.
    pub writes: u64,
    /// Total number of delete operations, including committed deletes.
    pub deletes: u64,
    /// Queries answered by a full scan.
    pub scans: u64,
    /// Queries answered from an index.
    pub index_lookups: u64,
    /// Transactions started.
    pub transactions_started: u64,
    /// Transactions committed.
    pub transactions_committed: u64,
    /// Transactions rolled back, explicitly or by dropping the handle.
    pub transactions_rolled_back: u64,
    /// Transactions whose lease ran out.
    pub transactions_expired: u64,
    /// Saves that wrote at least one shard or removed a stale one.
    pub saves: u64,
    /// Shard files written.
    pub shard_writes: u64,
    /// Errors encountered by saves and loads.
    pub errors: u64,
}
