//! Password hashing with Argon2id and the account password policy.

use std::sync::LazyLock;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::Rng;
use rand::distr::Alphanumeric;
use rand_core::OsRng;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
const TEMPORARY_PASSWORD_LEN: usize = 12;

/// Hash verified when a login names an unknown user, so that both paths
/// spend the same time in Argon2.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("idrive-placeholder-credential").ok());

/// Hash a password into an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a PHC hash.
///
/// Returns `Ok(false)` on mismatch and `Err(Internal)` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("verify error: {e}"))),
    }
}

/// Verify against `hash`, or against a placeholder hash when there is none.
///
/// Always returns `false` without a real hash.
pub fn verify_or_placeholder(password: &str, hash: Option<&str>) -> Result<bool, AppError> {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            Ok(false)
        }
    }
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password_policy(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(AppError::BadRequest(
            "Password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(AppError::BadRequest(
            "Password must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "Password must contain a digit".to_string(),
        ));
    }
    Ok(())
}

/// Generate a random temporary password that satisfies the policy.
pub fn generate_temporary_password() -> String {
    let mut rng = rand::rng();
    loop {
        let candidate: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(TEMPORARY_PASSWORD_LEN)
            .map(char::from)
            .collect();
        if validate_password_policy(&candidate).is_ok() {
            return candidate;
        }
    }
}
