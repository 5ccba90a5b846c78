//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use crate::config::{ConfigError, ConfigResult, parse_env_or};
use std::env;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,

    /// Per-query deadline in milliseconds
    pub query_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 2)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    /// - `DB_QUERY_TIMEOUT_MS`: Per-query deadline (default: 5000)
    ///
    /// # Returns
    ///
    /// * `ConfigResult<DatabaseConfig>` - Configuration, or an error if `DATABASE_URL` is not set
    pub fn from_env() -> ConfigResult<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Set it to a PostgreSQL connection string or use the memory storage mode"
                .to_string(),
        })?;
        let d = Self::development();

        Ok(Self {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", d.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", d.min_connections),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT", d.connection_timeout_secs),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT", d.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME", d.max_lifetime_secs),
            query_timeout_ms: parse_env_or("DB_QUERY_TIMEOUT_MS", d.query_timeout_ms),
        })
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/rndbot` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/rndbot".to_string(),
            max_connections: 10,
            min_connections: 2,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            query_timeout_ms: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_requires_url() {
        unsafe {
            env::remove_var("DATABASE_URL");
        }
        let err = DatabaseConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "DATABASE_URL"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_pool_sizes() {
        unsafe {
            env::set_var("DATABASE_URL", "postgres://bots@localhost/bots");
            env::set_var("DB_MAX_CONNECTIONS", "3");
        }
        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://bots@localhost/bots");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.min_connections, 2);
        unsafe {
            env::remove_var("DATABASE_URL");
            env::remove_var("DB_MAX_CONNECTIONS");
        }
    }
}
