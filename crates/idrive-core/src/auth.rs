//! Authentication and account administration on top of a [`CredentialStore`].

use chrono::{DateTime, Utc};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::{NewUser, NewUserRecord, User, UserChanges, UserPatch, UserStatus};
use crate::password;
use crate::token::{self, SessionClaims};
use crate::traits::CredentialStore;

const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Successful login result.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    /// Signed session token.
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    /// The account still uses an administrator-issued temporary password.
    pub must_change_password: bool,
    pub user_id: i64,
    pub name: String,
    pub role_id: i64,
    pub permissions: Vec<String>,
}

/// A newly created account together with its one-time temporary password.
#[derive(Debug, Clone)]
pub struct CreatedUser {
    pub user: User,
    pub temporary_password: String,
}

/// A freshly issued password-reset token. `token` is the raw value and is
/// never stored.
#[derive(Debug, Clone)]
pub struct ResetTicket {
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service.
///
/// Generic over the credential store so that this crate has no dependency on
/// the database layer.
#[derive(Clone)]
pub struct AuthService<S: CredentialStore> {
    store: S,
    config: AuthConfig,
}

impl<S: CredentialStore> AuthService<S> {
    pub fn new(store: S, config: AuthConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verify an email + password pair and issue a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    /// Account status is only revealed once the password has matched.
    pub async fn authenticate(&self, email: &str, secret: &str) -> Result<LoginOutput, AppError> {
        let credentials = self.store.find_credentials(email.trim()).await?;

        let matched = password::verify_or_placeholder(
            secret,
            credentials.as_ref().map(|c| c.password_hash.as_str()),
        )?;

        let credentials = match credentials {
            Some(c) if matched => c,
            _ => {
                tracing::warn!("Rejected login: invalid credentials");
                return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
            }
        };

        if credentials.status != UserStatus::Active {
            tracing::warn!(user_id = credentials.id, "Rejected login: account inactive");
            return Err(AppError::Forbidden("User account is inactive".to_string()));
        }

        let permissions = self.store.role_permissions(credentials.role_id).await?;
        let issued = token::issue_session_token(credentials.id, permissions.clone(), &self.config)?;
        self.store.record_access(credentials.id).await?;

        tracing::info!(user_id = credentials.id, "User logged in");

        Ok(LoginOutput {
            access_token: issued.token,
            expires_at: issued.expires_at,
            must_change_password: credentials.must_change_password,
            user_id: credentials.id,
            name: credentials.name,
            role_id: credentials.role_id,
            permissions,
        })
    }

    /// Validate a session token without checking any permission.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AppError> {
        token::decode_session_token(token, &self.config)
    }

    /// Validate a session token and require `permission` in its snapshot.
    pub fn authorize(&self, token: &str, permission: &str) -> Result<SessionClaims, AppError> {
        token::authorize(token, permission, &self.config)
    }

    /// Create an account with a generated temporary password.
    pub async fn create_user(&self, new_user: NewUser) -> Result<CreatedUser, AppError> {
        new_user.validate()?;

        let temporary_password = password::generate_temporary_password();
        let password_hash = password::hash_password(&temporary_password)?;

        let user = self
            .store
            .insert_user(NewUserRecord {
                user: new_user,
                password_hash,
                must_change_password: true,
            })
            .await?;

        tracing::info!(user_id = user.id, role_id = user.role_id, "User created");

        Ok(CreatedUser {
            user,
            temporary_password,
        })
    }

    /// Replace the password of the calling user and clear the forced-change flag.
    pub async fn change_password(&self, user_id: i64, new_secret: &str) -> Result<(), AppError> {
        password::validate_password_policy(new_secret)?;
        let hash = password::hash_password(new_secret)?;

        if !self.store.set_password(user_id, &hash, false).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Issue a reset token for an active account.
    ///
    /// Returns `None` for unknown or inactive emails so that callers cannot
    /// discover which accounts exist.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<ResetTicket>, AppError> {
        let Some(credentials) = self.store.find_credentials(email.trim()).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(None);
        };
        if credentials.status != UserStatus::Active {
            tracing::info!(user_id = credentials.id, "Password reset requested for inactive account");
            return Ok(None);
        }

        let raw = token::generate_reset_token();
        let expires_at = token::expires_after(Utc::now(), self.config.reset_token_ttl)?;
        self.store
            .store_reset_token(credentials.id, &token::hash_reset_token(&raw), expires_at)
            .await?;

        tracing::info!(user_id = credentials.id, %expires_at, "Password reset token issued");

        Ok(Some(ResetTicket {
            user_id: credentials.id,
            token: raw,
            expires_at,
        }))
    }

    /// Consume a reset token and set a new password.
    ///
    /// Both happen in one store transaction, so a failed write leaves the
    /// token usable for a retry.
    pub async fn reset_password(&self, raw_token: &str, new_secret: &str) -> Result<(), AppError> {
        password::validate_password_policy(new_secret)?;
        let hash = password::hash_password(new_secret)?;

        let user_id = self
            .store
            .reset_password_with_token(
                &token::hash_reset_token(raw_token.trim()),
                &hash,
                Utc::now(),
            )
            .await?
            .ok_or_else(|| {
                tracing::warn!("Rejected password reset: invalid or expired token");
                AppError::Unauthenticated("Reset token is invalid or has expired".to_string())
            })?;

        tracing::info!(user_id, "Password reset completed");
        Ok(())
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, AppError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.store.list_users().await
    }

    /// Apply an administrator patch. A new password is hashed before it
    /// reaches the store.
    pub async fn update_user(&self, user_id: i64, patch: UserPatch) -> Result<User, AppError> {
        patch.validate()?;

        let password_hash = patch
            .password
            .as_deref()
            .map(password::hash_password)
            .transpose()?;

        let changes = UserChanges {
            name: patch.name,
            email: patch.email,
            phone: patch.phone,
            national_id: patch.national_id,
            role_id: patch.role_id,
            status: patch.status,
            password_hash,
        };

        let user = self
            .store
            .update_user(user_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        tracing::info!(user_id, "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), AppError> {
        if !self.store.delete_user(user_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        tracing::info!(user_id, "User deleted");
        Ok(())
    }
}
