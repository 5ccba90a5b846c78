//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use rndbot::config::RandomBotConfig;
use rndbot::db::DatabaseConfig;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Where bot accounts, characters and events live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Postgres,
    /// Seeded in-memory repositories; nothing survives a restart
    Memory,
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageMode::Postgres),
            "memory" | "mem" => Ok(StorageMode::Memory),
            other => Err(ConfigError::Invalid {
                var: "RNDBOT_STORAGE".to_string(),
                reason: format!("Unknown storage mode '{other}' (expected postgres or memory)"),
            }),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Postgres => write!(f, "postgres"),
            StorageMode::Memory => write!(f, "memory"),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Remote command protocol bind address
    pub remote_bind: SocketAddr,
    /// Prometheus exporter bind address, disabled when `None`
    pub metrics_bind: Option<SocketAddr>,
    pub storage: StorageMode,
    /// Database configuration, only read in postgres mode
    pub database: Option<DatabaseConfig>,
    /// Bot accounts created by the memory seed
    pub roster_accounts: u32,
    pub bots: RandomBotConfig,
}

/// CLI values that take precedence over the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub remote_bind: Option<SocketAddr>,
    pub metrics_bind: Option<SocketAddr>,
    pub storage: Option<StorageMode>,
    pub roster_accounts: Option<u32>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values given on the command line
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value is malformed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let remote_bind = match overrides.remote_bind {
            Some(addr) => addr,
            None => parse_addr("RNDBOT_REMOTE_BIND")?.unwrap_or(SocketAddr::from(([127, 0, 0, 1], 7878))),
        };

        let metrics_bind = match overrides.metrics_bind {
            Some(addr) => Some(addr),
            None => parse_addr("RNDBOT_METRICS_BIND")?,
        };

        let storage = match overrides.storage {
            Some(mode) => mode,
            None => match std::env::var("RNDBOT_STORAGE") {
                Ok(value) => value.parse()?,
                Err(_) => StorageMode::Postgres,
            },
        };

        let database = match storage {
            StorageMode::Postgres => Some(DatabaseConfig::from_env().map_err(|_| {
                ConfigError::MissingRequired {
                    var: "DATABASE_URL".to_string(),
                    hint: "Set it to a PostgreSQL connection string or pass --storage memory".to_string(),
                }
            })?),
            StorageMode::Memory => None,
        };

        let bots = RandomBotConfig::from_env().map_err(|e| ConfigError::Bots(e.to_string()))?;

        let default_roster = bots.max_random_bots.div_ceil(bots.chars_per_account.max(1)) + bots.add_class_pool_size;
        let roster_accounts = overrides
            .roster_accounts
            .unwrap_or_else(|| parse_env_or("RNDBOT_ROSTER_ACCOUNTS", default_roster));

        Ok(ServerConfig {
            remote_bind,
            metrics_bind,
            storage,
            database,
            roster_accounts,
            bots,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bots.validate().map_err(|e| ConfigError::Bots(e.to_string()))?;

        if self.metrics_bind == Some(self.remote_bind) {
            return Err(ConfigError::Invalid {
                var: "RNDBOT_METRICS_BIND".to_string(),
                reason: format!("Must differ from the remote bind address ({})", self.remote_bind),
            });
        }

        if self.storage == StorageMode::Memory && self.roster_accounts == 0 {
            return Err(ConfigError::Invalid {
                var: "RNDBOT_ROSTER_ACCOUNTS".to_string(),
                reason: "Must be greater than 0 in memory mode".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Invalid bot configuration: {0}")]
    Bots(String),
}

fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not an IP:PORT address"),
        }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
