use crate::db::StorageError;
use thiserror::Error;

/// Location cache errors
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type LocationResult<T> = Result<T, LocationError>;
