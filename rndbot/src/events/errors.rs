use crate::db::StorageError;
use thiserror::Error;

/// Event store errors
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Unknown event key: {0}")]
    UnknownKey(String),
}

pub type EventResult<T> = Result<T, EventError>;
