use std::sync::Arc;

use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use idrive_core::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware that validates `Authorization: Bearer <token>` as a session token.
///
/// On success the decoded [`idrive_core::SessionClaims`] are stored in the
/// request extensions for handlers to check permissions against.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return ApiError(AppError::Unauthenticated(
            "Missing or invalid Authorization header. Expected: Bearer <token>".to_string(),
        ))
        .into_response();
    };

    match state.auth.validate(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rejected session token");
            ApiError(err).into_response()
        }
    }
}
