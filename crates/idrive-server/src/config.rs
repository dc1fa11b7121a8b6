use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use idrive_core::AppError;

/// Origins allowed when `IDRIVE_CORS_ORIGINS` is not set.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:8080",
    "http://127.0.0.1:3000",
];

/// HTTP-level settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Return raw password-reset tokens in the HTTP response. Development only.
    pub expose_reset_tokens: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            expose_reset_tokens: false,
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `IDRIVE_SERVER_PORT` (optional, defaults to 8000)
    /// - `IDRIVE_CORS_ORIGINS` (optional, comma-separated)
    /// - `IDRIVE_EXPOSE_RESET_TOKENS` (optional, defaults to false)
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("IDRIVE_SERVER_PORT") {
            config.port = raw.parse().map_err(|_| {
                AppError::Config(format!("Invalid IDRIVE_SERVER_PORT '{raw}'"))
            })?;
        }
        if let Ok(raw) = std::env::var("IDRIVE_CORS_ORIGINS") {
            config.cors_origins = parse_origins(&raw);
        }
        if let Ok(raw) = std::env::var("IDRIVE_EXPOSE_RESET_TOKENS") {
            config.expose_reset_tokens = parse_flag(&raw).ok_or_else(|| {
                AppError::Config(format!("Invalid IDRIVE_EXPOSE_RESET_TOKENS '{raw}'"))
            })?;
        }

        Ok(config)
    }

    /// CORS policy allowing the configured origins with credentials.
    pub fn cors_layer(&self) -> Result<CorsLayer, AppError> {
        let origins = self
            .cors_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o)
                    .map_err(|_| AppError::Config(format!("Invalid CORS origin '{o}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
