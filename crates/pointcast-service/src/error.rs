//! Error types for the service layer.

use thiserror::Error;

/// Service error type.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Storage engine error
    #[error("storage error: {0}")]
    Storage(#[from] pointcast_storage::StorageError),

    /// Storage call exceeded its per-call deadline
    #[error("storage deadline of {0}ms exceeded")]
    DeadlineExceeded(u64),

    /// Message bus publish or subscribe failure
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON encoding failure for a structured reply
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
