//! Storage error types shared by every repository.

use super::timeouts::TimeoutError;
use std::time::Duration;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query exceeded its deadline
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Backend refused the operation (used by in-memory failure injection)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<TimeoutError> for StorageError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(d) => StorageError::Timeout(d),
            TimeoutError::Database(e) => StorageError::Database(e),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
