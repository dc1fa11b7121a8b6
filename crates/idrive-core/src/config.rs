use chrono::TimeDelta;

use crate::error::AppError;

/// Shortest accepted HMAC signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime: 7 days.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Longest accepted password-reset token lifetime: 1 day.
pub const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 24 * 60;

/// Configuration for session tokens and password recovery.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub issuer: String,
    /// Session token lifetime. Also the window in which revoked permissions stay usable.
    pub token_ttl: TimeDelta,
    /// Lifetime of a password-reset token.
    pub reset_token_ttl: TimeDelta,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: "idrive".to_string(),
            token_ttl: TimeDelta::minutes(60),
            reset_token_ttl: TimeDelta::minutes(30),
        }
    }

    pub fn with_token_ttl(mut self, ttl: TimeDelta) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Read configuration from environment variables.
    ///
    /// - `IDRIVE_JWT_SECRET` (required, at least 32 bytes)
    /// - `IDRIVE_JWT_ISSUER` (optional, defaults to `idrive`)
    /// - `IDRIVE_TOKEN_TTL_MINUTES` (optional, defaults to 60)
    /// - `IDRIVE_RESET_TOKEN_TTL_MINUTES` (optional, defaults to 30)
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("IDRIVE_JWT_SECRET").map_err(|_| {
            AppError::Config("IDRIVE_JWT_SECRET not set. Required to sign session tokens.".into())
        })?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "IDRIVE_JWT_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        let mut config = Self::new(secret);
        if let Ok(issuer) = std::env::var("IDRIVE_JWT_ISSUER") {
            config.issuer = issuer;
        }
        config.token_ttl = minutes_from_env("IDRIVE_TOKEN_TTL_MINUTES", 60, MAX_TOKEN_TTL_MINUTES)?;
        config.reset_token_ttl = minutes_from_env(
            "IDRIVE_RESET_TOKEN_TTL_MINUTES",
            30,
            MAX_RESET_TOKEN_TTL_MINUTES,
        )?;

        Ok(config)
    }
}

fn minutes_from_env(name: &str, default: i64, max: i64) -> Result<TimeDelta, AppError> {
    parse_minutes(name, std::env::var(name).ok().as_deref(), default, max)
}

/// Parse a lifetime in minutes, bounded to `1..=max`.
fn parse_minutes(name: &str, raw: Option<&str>, default: i64, max: i64) -> Result<TimeDelta, AppError> {
    let minutes = match raw {
        None => default,
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            AppError::Config(format!(
                "Invalid {name} '{raw}': must be a positive integer"
            ))
        })?,
    };
    if !(1..=max).contains(&minutes) {
        return Err(AppError::Config(format!(
            "{name} must be between 1 and {max} minutes"
        )));
    }
    TimeDelta::try_minutes(minutes)
        .ok_or_else(|| AppError::Config(format!("{name} is out of range")))
}
