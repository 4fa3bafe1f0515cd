//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. `main` loads a `.env` file first when one is present.

use chrono_tz::Tz;
use std::env;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// Zone in which slot times are expressed
    pub business_timezone: Tz,

    /// Upper bound on a single notification attempt
    pub notify_timeout: Duration,

    /// Allow any origin (dashboard and booking page served elsewhere)
    pub cors_permissive: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parsed("HTTP_PORT", "5000")?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./trim.db".to_string()),

            db_max_connections: parsed("DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Production deployments set JWT_SECRET
                "trim-dev-secret-change-in-production".to_string()
            }),

            jwt_access_lifetime_secs: parsed("JWT_ACCESS_LIFETIME_SECS", "86400")?,

            business_timezone: parsed("BUSINESS_TIMEZONE", "America/New_York")?,

            notify_timeout: Duration::from_secs(parsed("NOTIFY_TIMEOUT_SECS", "5")?),

            cors_permissive: parsed("CORS_PERMISSIVE", "true")?,
        };

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_ACCESS_LIFETIME_SECS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Configuration for tests: in-memory database, fixed secret.
    pub fn for_tests() -> Self {
        ApiConfig {
            http_port: 0,
            database_path: ":memory:".to_string(),
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime_secs: 3600,
            business_timezone: trim_core::BUSINESS_TIMEZONE,
            notify_timeout: Duration::from_millis(200),
            cors_permissive: true,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_falls_back_to_default() {
        let port: u16 = parsed("TRIM_TEST_UNSET_PORT", "5000").unwrap();
        assert_eq!(port, 5000);

        let tz: Tz = parsed("TRIM_TEST_UNSET_TZ", "America/New_York").unwrap();
        assert_eq!(tz, chrono_tz::America::New_York);
    }

    #[test]
    fn test_invalid_default_reports_key() {
        let err = parsed::<u16>("TRIM_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for TRIM_TEST_UNSET_PORT");
    }
}
