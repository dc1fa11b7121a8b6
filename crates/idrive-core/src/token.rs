//! Session token issuance/validation and password-reset token generation.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AppError;

/// Claims embedded in every session token.
///
/// `permissions` is a snapshot taken at login: revoking a permission only
/// takes effect once the token expires and the user logs in again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user id.
    pub sub: String,
    pub permissions: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthenticated("Invalid token subject".to_string()))
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Capability check against the embedded permission snapshot.
    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing permission: {permission}"
            )))
        }
    }
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// `now + ttl`, failing instead of overflowing the calendar.
pub(crate) fn expires_after(now: DateTime<Utc>, ttl: TimeDelta) -> Result<DateTime<Utc>, AppError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(format!("Token lifetime {ttl} overflows the clock")))
}

/// Sign a session token for a user and their current permission set.
pub fn issue_session_token(
    user_id: i64,
    permissions: Vec<String>,
    config: &AuthConfig,
) -> Result<IssuedToken, AppError> {
    let now = Utc::now();
    let expires_at = expires_after(now, config.token_ttl)?;
    let claims = SessionClaims {
        sub: user_id.to_string(),
        permissions,
        iss: config.issuer.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode_claims(&claims, config)?;
    Ok(IssuedToken { token, expires_at })
}

pub(crate) fn encode_claims(claims: &SessionClaims, config: &AuthConfig) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AppError::Internal(format!("JWT encode: {e}")))
}

/// Verify signature, issuer and expiry and return the claims.
///
/// Purely stateless: no datastore lookup.
pub fn decode_session_token(token: &str, config: &AuthConfig) -> Result<SessionClaims, AppError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthenticated("Session token has expired".to_string())
            }
            _ => AppError::Unauthenticated("Invalid session token".to_string()),
        })
}

/// Validate a token and check that it grants `permission`.
pub fn authorize(
    token: &str,
    permission: &str,
    config: &AuthConfig,
) -> Result<SessionClaims, AppError> {
    let claims = decode_session_token(token, config)?;
    claims.require(permission)?;
    Ok(claims)
}

/// Generate an opaque single-use reset token (32 random bytes, hex-encoded).
pub fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// SHA-256 of a raw reset token, hex-encoded. This is what gets stored.
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}
