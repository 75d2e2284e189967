//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An I/O error occurred while touching a specific blob.
    #[error("I/O error on {name}: {source}")]
    BlobIo {
        /// The blob (file) name.
        name: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The requested blob does not exist.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// A write was refused by the backend.
    #[error("write rejected for {name}: {reason}")]
    WriteRejected {
        /// The blob (file) name.
        name: String,
        /// Why the write was refused.
        reason: String,
    },

    /// The blob name is not a plain file name.
    #[error("invalid blob name: {0:?}")]
    InvalidName(String),
}

impl StorageError {
    /// Wraps an I/O error with the blob name it concerns.
    pub fn blob_io(name: impl Into<String>, source: io::Error) -> Self {
        Self::BlobIo {
            name: name.into(),
            source,
        }
    }
}
