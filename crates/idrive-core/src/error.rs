use thiserror::Error;

/// Application-wide error taxonomy for iDrive.
///
/// Every layer translates its failures into one of these variants at the
/// operation boundary; the HTTP layer maps each variant to a status code.
#[derive(Error, Debug)]
pub enum AppError {
    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness, capacity, state or referential conflict.
    #[error("{0}")]
    Conflict(String),

    /// Empty or invalid input.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired token, or bad credentials.
    #[error("{0}")]
    Unauthenticated(String),

    /// Inactive account or missing permission.
    #[error("{0}")]
    Forbidden(String),

    /// The datastore is unreachable or the pool is exhausted.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable kind, used as the `error` field of API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthenticated(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to show to API clients.
    ///
    /// Server-side failures carry datastore or configuration details that
    /// must stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns true if the failure is on the server side rather than the caller's.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::ServiceUnavailable(_) | AppError::Config(_) | AppError::Internal(_)
        )
    }
}
