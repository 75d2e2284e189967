//! In-memory shard backend for testing.

use crate::backend::ShardBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-memory shard backend.
///
/// Besides holding blobs, it acts as a probe for persistence tests:
/// it counts every successful `write`/`remove` and can be told to reject
/// writes, either after a number of successful ones or for given names.
///
/// # Example
///
/// ```rust
/// use yarndb_storage::{InMemoryBackend, ShardBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.fail_writes_after(1);
/// backend.write("a.yaml", b"a").unwrap();
/// assert!(backend.write("b.yaml", b"b").is_err());
/// assert_eq!(backend.write_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
    writes: AtomicU64,
    removes: AtomicU64,
    faults: Mutex<Faults>,
}

#[derive(Debug, Default)]
struct Faults {
    /// Number of further writes allowed before every write fails.
    writes_left: Option<u64>,
    /// Names whose writes always fail.
    names: BTreeSet<String>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with blobs.
    ///
    /// Seeding does not count as writes.
    #[must_use]
    pub fn with_blobs<I, N, D>(blobs: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<Vec<u8>>,
    {
        let backend = Self::new();
        backend.insert_many(blobs);
        backend
    }

    /// Inserts blobs directly, bypassing fault injection and counters.
    pub fn insert_many<I, N, D>(&self, blobs: I)
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<Vec<u8>>,
    {
        let mut map = self.blobs.write();
        for (name, data) in blobs {
            map.insert(name.into(), data.into());
        }
    }

    /// Returns a copy of a blob, if present.
    #[must_use]
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.blobs.read().get(name).cloned()
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of removals of existing blobs so far.
    #[must_use]
    pub fn remove_count(&self) -> u64 {
        self.removes.load(Ordering::SeqCst)
    }

    /// Allows `n` more successful writes, then fails every write.
    pub fn fail_writes_after(&self, n: u64) {
        self.faults.lock().writes_left = Some(n);
    }

    /// Makes every write to `name` fail.
    pub fn fail_writes_to(&self, name: impl Into<String>) {
        self.faults.lock().names.insert(name.into());
    }

    /// Clears all injected faults.
    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    fn admit_write(&self, name: &str) -> StorageResult<()> {
        let mut faults = self.faults.lock();
        if faults.names.contains(name) {
            return Err(StorageError::WriteRejected {
                name: name.to_string(),
                reason: "injected fault".into(),
            });
        }
        match faults.writes_left {
            Some(0) => Err(StorageError::WriteRejected {
                name: name.to_string(),
                reason: "write budget exhausted".into(),
            }),
            Some(ref mut left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ShardBackend for InMemoryBackend {
    fn list(&self) -> StorageResult<Vec<String>> {
        // BTreeMap keys are already sorted.
        Ok(self.blobs.read().keys().cloned().collect())
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.contents(name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        self.admit_write(name)?;
        self.blobs.write().insert(name.to_string(), data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        if self.blobs.write().remove(name).is_some() {
            self.removes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.blobs.read().contains_key(name))
    }
}
