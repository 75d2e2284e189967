//! Shard backend trait definition.

use crate::error::StorageResult;

/// A store of whole, named blobs holding shard files.
///
/// # Invariants
///
/// - `write` replaces the previous contents of a blob in full; a reader
///   never observes a half-written blob
/// - `list` returns every blob currently stored, in ascending name order
/// - `remove` of a missing blob is not an error
/// - Backends must be `Send + Sync`: the loader reads from several threads
///   and the periodic saver writes from its own thread
///
/// # Implementors
///
/// - [`super::FileBackend`] - For persistent storage
/// - [`super::InMemoryBackend`] - For testing
pub trait ShardBackend: Send + Sync {
    /// Lists the names of all stored blobs, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying location cannot be scanned.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Reads the full contents of a blob.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if no blob has this name,
    /// or an I/O error.
    fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Replaces the contents of a blob, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write does not complete. The previous
    /// contents are left in place in that case.
    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes a blob if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing blob cannot be removed.
    fn remove(&self, name: &str) -> StorageResult<()>;

    /// Returns true if a blob with this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be scanned.
    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.list()?.iter().any(|n| n == name))
    }
}
