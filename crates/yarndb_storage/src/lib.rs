//! # YarnDB Storage
//!
//! Shard storage backends for YarnDB.
//!
//! Backends are **opaque named-blob stores**: each shard is one blob,
//! addressed by its file name, read and replaced as a whole. Backends do
//! not interpret the bytes they hold; the core owns the shard format.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - A flat directory of files on the local file system
//! - [`InMemoryBackend`] - For tests; counts writes and can inject failures
//!
//! ## Example
//!
//! ```rust
//! use yarndb_storage::{InMemoryBackend, ShardBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.write("records_users.yaml", b"u1: {}\n").unwrap();
//! assert_eq!(backend.list().unwrap(), vec!["records_users.yaml".to_string()]);
//! assert_eq!(backend.write_count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::ShardBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
