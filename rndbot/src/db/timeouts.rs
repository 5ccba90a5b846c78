//! Deadlines for repository queries.
//!
//! A slow database delays one scheduling step by at most the bound; the
//! step then carries on as if the query had failed.

use std::future::Future;
use std::time::Duration;

/// Bound for per-bot and single-row queries
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound for table-wide deletes and world data loads
pub const LONG_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TimeoutError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutError::Timeout(_))
    }
}

pub type TimeoutResult<T> = Result<T, TimeoutError>;

/// Await `query`, giving up once `deadline` has passed
pub async fn with_timeout<F, T>(deadline: Duration, query: F) -> TimeoutResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    tokio::time::timeout(deadline, query)
        .await
        .map_err(|_| TimeoutError::Timeout(deadline))?
        .map_err(TimeoutError::from)
}

/// Per-query deadline from a millisecond setting; 0 selects the default
pub fn query_deadline(millis: u64) -> Duration {
    if millis == 0 {
        DEFAULT_QUERY_TIMEOUT
    } else {
        Duration::from_millis(millis)
    }
}
