//! Error types for cart storage and persistence.
//!
//! None of these reach callers of the cart mutation API. The store logs
//! persistence failures and keeps its in-memory state authoritative.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`CartStorage`](crate::persistence::CartStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The storage key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// The backend is unavailable (e.g., a poisoned lock).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while loading or saving a cart snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Stored snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Background writer task is no longer running.
    #[error("Writer task stopped")]
    WriterStopped,
}
