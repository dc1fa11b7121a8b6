use std::time::Duration;

use idrive_core::AppError;

/// Configuration for the database connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a request waits for a free connection before failing
    /// `ServiceUnavailable`.
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Read configuration from environment variables.
    ///
    /// - `DATABASE_URL` (required)
    /// - `DATABASE_MAX_CONNECTIONS` (optional, defaults to 5)
    /// - `DATABASE_ACQUIRE_TIMEOUT_SECS` (optional, defaults to 5)
    pub fn from_env() -> Result<Self, AppError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| {
            AppError::Config("DATABASE_URL not set. Required for database operations.".into())
        })?;

        let max_connections = positive_from_env("DATABASE_MAX_CONNECTIONS", 5)?;
        let acquire_timeout = positive_from_env("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?;

        Ok(Self {
            url,
            max_connections,
            acquire_timeout: Duration::from_secs(u64::from(acquire_timeout)),
        })
    }
}

fn positive_from_env(name: &str, default: u32) -> Result<u32, AppError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let parsed: u32 = raw.parse().map_err(|_| {
                AppError::Config(format!(
                    "Invalid {name} '{raw}': must be a positive integer"
                ))
            })?;
            if parsed == 0 {
                return Err(AppError::Config(format!("{name} must be at least 1")));
            }
            Ok(parsed)
        }
    }
}
