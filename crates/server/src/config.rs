//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PACKHOUSE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   the generic `DATABASE_URL`)
//!
//! ## Optional
//! - `PACKHOUSE_HOST` - Bind address (default: 127.0.0.1)
//! - `PACKHOUSE_PORT` - Listen port (default: 3100)
//! - `PACKHOUSE_LOCK_TIMEOUT_MS` - Row-lock wait bound per transition in
//!   milliseconds (default: 5000). When exceeded the transition fails with a
//!   retryable contention error instead of blocking.
//! - `PACKHOUSE_LOG_JSON` - Any value switches log output to JSON lines

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: &str = "3100";
const DEFAULT_LOCK_TIMEOUT_MS: &str = "5000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bounded row-lock wait per transition before surfacing contention
    pub lock_timeout: Duration,
    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PACKHOUSE_DATABASE_URL")?;
        let host = get_env_or_default("PACKHOUSE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PACKHOUSE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PACKHOUSE_PORT", DEFAULT_PORT)
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PACKHOUSE_PORT".to_string(), e.to_string()))?;
        let lock_timeout_ms = get_env_or_default("PACKHOUSE_LOCK_TIMEOUT_MS", DEFAULT_LOCK_TIMEOUT_MS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PACKHOUSE_LOCK_TIMEOUT_MS".to_string(), e.to_string())
            })?;
        let log_json = std::env::var("PACKHOUSE_LOG_JSON").is_ok();

        Ok(Self {
            database_url,
            host,
            port,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            log_json,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3100,
            lock_timeout: Duration::from_millis(5000),
            log_json: false,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3100);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("PACKHOUSE_DATABASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: PACKHOUSE_DATABASE_URL"
        );
    }
}
