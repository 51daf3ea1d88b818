//! Error types for the storage layer.

use thiserror::Error;

/// Storage error type.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// No matching pending notification entry.
    ///
    /// Expected under at-least-once delivery: duplicate acknowledgments and
    /// concurrent removals both land here. Callers log and move on.
    #[error("no matching pending notification entry")]
    NotFound,

    /// Unknown storage driver name (startup-fatal)
    #[error("no such storage driver: `{0}`")]
    UnsupportedBackend(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
