//! Error types for YarnDB core.

use crate::types::TransactionId;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad category of a [`CoreError`], for callers that branch on the
/// kind of failure rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Reading, writing, encoding or decoding persisted data failed.
    Io,
    /// The addressed record does not exist.
    NotFound,
    /// The operation collides with existing state (a duplicate index, an
    /// active transaction, a locked directory).
    Conflict,
    /// An input was rejected before any state changed.
    Validation,
    /// The operation is not valid in the current lifecycle state.
    State,
}

/// Errors that can occur in YarnDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] yarndb_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A shard could not be encoded or decoded.
    #[error("codec error in shard {shard}: {source}")]
    Codec {
        /// File name of the shard involved.
        shard: String,
        /// Underlying codec failure.
        #[source]
        source: yarndb_codec::CodecError,
    },

    /// Record not found.
    #[error("record not found: {id}")]
    NotFound {
        /// The missing record id.
        id: String,
    },

    /// An index already exists on the path.
    #[error("index already exists on {path}")]
    IndexExists {
        /// The indexed path.
        path: String,
    },

    /// Another transaction holds the transaction lease.
    #[error("another transaction is already active")]
    TransactionActive,

    /// The transaction's lease ran out and was reclaimed.
    #[error("transaction {txid} expired")]
    TransactionExpired {
        /// The expired transaction.
        txid: TransactionId,
    },

    /// Malformed field path.
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Malformed record id.
    #[error("invalid record id {id:?}: {reason}")]
    InvalidId {
        /// The rejected id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Configuration rejected at open time.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The data directory is in use by another process.
    #[error("data directory locked: another process has exclusive access")]
    DatabaseLocked,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Datastore is closed.
    #[error("datastore is closed")]
    Closed,
}

impl CoreError {
    /// Returns the broad category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(_) | Self::Io(_) | Self::Codec { .. } => ErrorKind::Io,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::IndexExists { .. } | Self::TransactionActive | Self::DatabaseLocked => {
                ErrorKind::Conflict
            }
            Self::InvalidPath { .. } | Self::InvalidId { .. } | Self::InvalidConfig { .. } => {
                ErrorKind::Validation
            }
            Self::TransactionExpired { .. } | Self::InvalidOperation { .. } | Self::Closed => {
                ErrorKind::State
            }
        }
    }

    /// Creates a codec error for a shard file.
    pub fn codec(shard: impl Into<String>, source: yarndb_codec::CodecError) -> Self {
        Self::Codec {
            shard: shard.into(),
            source,
        }
    }

    /// Creates a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an index exists error.
    pub fn index_exists(path: impl Into<String>) -> Self {
        Self::IndexExists { path: path.into() }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid id error.
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
