//! Error types for the store module.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Directory or file creation, read, or write failure.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Statement failure from SQLite (constraint violation, I/O, ...).
    #[error("database error: {0}")]
    Query(#[from] rusqlite::Error),

    /// The database failed its integrity check and could not be recovered.
    #[error("storage corrupted at {}: {reason}", path.display())]
    StorageCorrupted { path: PathBuf, reason: String },

    /// Vote timestamp that cannot be stored as RFC 3339.
    #[error("vote timestamp out of range: {0}")]
    TimestampOutOfRange(DateTime<Utc>),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Storage location could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store was closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
