use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{NewUserRecord, User, UserChanges, UserCredentials};

/// Persists users, credential hashes, role permissions and reset tokens.
///
/// Passwords never reach the store in clear text; the auth service hashes
/// them first.
pub trait CredentialStore: Send + Sync + Clone {
    /// Look up the login data of a user by email.
    fn find_credentials(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserCredentials>, AppError>> + Send;

    /// Permission names granted to a role.
    fn role_permissions(
        &self,
        role_id: i64,
    ) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    /// Stamp the last-access time of a user.
    fn record_access(&self, user_id: i64) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Insert a user. Duplicate email or national id fails `Conflict`.
    fn insert_user(
        &self,
        record: NewUserRecord,
    ) -> impl Future<Output = Result<User, AppError>> + Send;

    fn get_user(&self, user_id: i64) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, AppError>> + Send;

    /// Apply changes to a user. Returns `None` if the user does not exist.
    fn update_user(
        &self,
        user_id: i64,
        changes: UserChanges,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Delete a user. Returns `false` if the user does not exist.
    fn delete_user(&self, user_id: i64) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Replace the credential hash and set the forced-change flag.
    ///
    /// Also stamps the last-access time. Returns `false` if the user does not exist.
    fn set_password(
        &self,
        user_id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Persist the hash of a freshly issued reset token.
    fn store_reset_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Consume an unexpired, unused reset token and store `password_hash` for
    /// its owner in one transaction, clearing the forced-change flag.
    ///
    /// Returns the owning user id, or `None` if no usable token matches. On
    /// any error the token stays usable.
    fn reset_password_with_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<i64>, AppError>> + Send;
}
