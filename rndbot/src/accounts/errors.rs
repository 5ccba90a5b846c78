use crate::db::StorageError;
use thiserror::Error;

/// Account classification errors
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Characters per account must be greater than 0")]
    NoCharacterSlots,
}

pub type AccountResult<T> = Result<T, AccountError>;
