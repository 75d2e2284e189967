//! # YarnDB Core
//!
//! Core datastore engine for YarnDB.
//!
//! This crate provides:
//! - An in-memory record store guarded by one reader-writer lock
//! - Exact-match field indexes kept in step with every write
//! - A single staged transaction with a lease
//! - Parallel loading of YAML shard files and periodic saving back to them
//!
//! ## Usage
//!
//! ```rust
//! use yarndb_core::{Datastore, Value};
//!
//! let store = Datastore::open_in_memory().unwrap();
//! store.create_index("dept").unwrap();
//! store.set("u1", Value::map([("name", "Ann"), ("dept", "eng")]), "users").unwrap();
//!
//! let mut txn = store.begin_transaction().unwrap();
//! txn.set("u2", Value::map([("name", "Bo"), ("dept", "eng")]), "users").unwrap();
//! txn.commit().unwrap();
//!
//! assert_eq!(store.query("dept", &Value::from("eng")).unwrap().len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod autosave;
mod cache;
mod config;
mod database;
pub mod dir;
mod error;
mod index;
mod loader;
mod persist;
mod stats;
mod store;
mod transaction;
mod types;

pub use cache::MergedView;
pub use config::{Config, DEFAULT_AUTO_SAVE_INTERVAL, DEFAULT_SHARD, DEFAULT_TRANSACTION_LEASE};
pub use database::{Datastore, Status};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use index::{FieldIndex, IndexManager};
pub use loader::{LoadFailure, LoadReport};
pub use persist::SaveReport;
pub use stats::{DatastoreStats, StatsSnapshot};
pub use transaction::{CommitSummary, PendingWrite, Transaction, TransactionState};
pub use types::{FieldPath, ShardId, TransactionId, SHARD_EXTENSION, SHARD_PREFIX};
pub use yarndb_codec::Value;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
