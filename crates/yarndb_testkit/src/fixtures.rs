//! Test fixtures and datastore helpers.
//!
//! Provides convenience functions for setting up test datastores
//! and common test scenarios.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use yarndb_core::{Config, Datastore};
use yarndb_storage::InMemoryBackend;

/// Configuration for tests: no background saves.
#[must_use]
pub fn test_config() -> Config {
    Config::new().auto_save_interval(Duration::ZERO)
}

/// A test datastore with automatic cleanup.
pub struct TestDatastore {
    /// The datastore instance.
    pub store: Datastore,
    /// The in-memory backend, when the store is not file-based.
    pub backend: Option<Arc<InMemoryBackend>>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatastore {
    /// Creates a new in-memory test datastore whose backend can be probed.
    pub fn memory() -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let store = Datastore::open_with_backend(test_config(), backend.clone())
            .expect("Failed to open in-memory datastore");
        Self {
            store,
            backend: Some(backend),
            temp_dir: None,
        }
    }

    /// Creates a new datastore over a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Datastore::open_with_config(temp_dir.path(), test_config())
            .expect("Failed to open file datastore");
        Self {
            store,
            backend: None,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the data directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes the datastore and opens it again from what was saved.
    pub fn reopen(self) -> Self {
        let Self {
            store,
            backend,
            temp_dir,
        } = self;
        store.close().expect("Failed to close datastore");
        drop(store);

        let store = match (&backend, &temp_dir) {
            (Some(backend), _) => Datastore::open_with_backend(test_config(), backend.clone()),
            (None, Some(dir)) => Datastore::open_with_config(dir.path(), test_config()),
            (None, None) => unreachable!("test datastore without storage"),
        }
        .expect("Failed to reopen datastore");

        Self {
            store,
            backend,
            temp_dir,
        }
    }
}

impl std::ops::Deref for TestDatastore {
    type Target = Datastore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory datastore.
///
/// # Example
///
/// ```rust
/// use yarndb_testkit::with_temp_store;
/// use yarndb_core::Value;
///
/// with_temp_store(|store| {
///     store.set("u1", Value::from(1), "").unwrap();
///     assert!(store.get("u1").unwrap().is_some());
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Datastore) -> R,
{
    let test_store = TestDatastore::memory();
    f(&test_store.store)
}

/// Runs a test with a datastore over a temporary directory.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Datastore, &Path) -> R,
{
    let test_store = TestDatastore::file();
    let path = test_store
        .path()
        .expect("File datastore should have a path")
        .to_path_buf();
    f(&test_store.store, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use yarndb_core::{Datastore, Value};

    /// Departments cycled through by [`seed_users`].
    pub const DEPARTMENTS: [&str; 3] = ["eng", "ops", "sales"];

    /// A user document.
    #[must_use]
    pub fn user_document(name: &str, dept: &str) -> Value {
        Value::map([
            ("name", Value::from(name)),
            ("dept", Value::from(dept)),
            ("address", Value::map([("city", "Oslo")])),
        ])
    }

    /// Inserts `count` users `users_0..users_{count}` into the `users`
    /// shard, cycling through [`DEPARTMENTS`].
    pub fn seed_users(store: &Datastore, count: usize) {
        for i in 0..count {
            let dept = DEPARTMENTS[i % DEPARTMENTS.len()];
            store
                .set(
                    &format!("users_{i}"),
                    user_document(&format!("user{i}"), dept),
                    "users",
                )
                .expect("Failed to seed user");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yarndb_core::Value;

    #[test]
    fn memory_store_reopens_from_backend() {
        let test_store = TestDatastore::memory();
        scenarios::seed_users(&test_store, 5);

        let reopened = test_store.reopen();
        assert_eq!(reopened.status().record_count, 5);
        assert!(reopened.backend.is_some());
    }

    #[test]
    fn file_store_reopens_from_disk() {
        let test_store = TestDatastore::file();
        test_store.set("u1", Value::from(1), "users").unwrap();
        let path = test_store.path().unwrap().to_path_buf();

        let reopened = test_store.reopen();
        assert_eq!(reopened.get("u1").unwrap(), Some(Value::from(1)));
        assert!(path.join("records_users.yaml").exists());
    }

    #[test]
    fn seeded_departments_cycle() {
        with_temp_store(|store| {
            scenarios::seed_users(store, 6);
            let eng = store.query("dept", &Value::from("eng")).unwrap();
            assert_eq!(eng.len(), 2);
        });
    }

    #[test]
    fn file_store_has_a_path() {
        with_file_store(|store, path| {
            assert_eq!(store.data_dir(), Some(path));
        });
    }
}
