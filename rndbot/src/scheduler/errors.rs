use crate::accounts::AccountError;
use crate::config::ConfigError;
use crate::db::StorageError;
use crate::events::EventError;
use crate::locations::LocationError;
use thiserror::Error;

/// Scheduler startup errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

/// Console and remote command errors
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Usage: rndbot stats/update/reset/reload/init/clear/levelup/refresh/teleport/revive/grind/change_strategy/remove [name]")]
    Usage,

    #[error("Random bot system is currently disabled")]
    Disabled,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Nothing to do for '{0}'")]
    NothingToDo(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
pub type CommandResult<T> = Result<T, CommandError>;
