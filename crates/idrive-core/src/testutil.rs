//! Test utilities: in-memory implementation of [`CredentialStore`].
//!
//! State lives behind `Arc<Mutex<_>>` so clones share it and tests can
//! inspect what the service recorded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{NewUserRecord, User, UserChanges, UserCredentials, UserStatus};
use crate::password;
use crate::permissions;
use crate::traits::CredentialStore;

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct StoredResetToken {
    user_id: i64,
    token_hash: String,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<StoredUser>,
    roles: HashMap<i64, Vec<String>>,
    reset_tokens: Vec<StoredResetToken>,
    accesses: HashMap<i64, usize>,
    fail_password_writes: bool,
}

/// Mock credential store keeping users, role grants and reset tokens in memory.
#[derive(Clone, Default)]
pub struct MockCredentialStore {
    state: Arc<Mutex<State>>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permissions` to `role_id`.
    pub fn with_role(self, role_id: i64, grants: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .roles
            .insert(role_id, grants.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Make every password write fail with `ServiceUnavailable` until reset.
    pub fn fail_password_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_password_writes = fail;
    }

    /// Insert a student account with the given password. Returns its id.
    pub fn add_user(&self, email: &str, password: &str, status: UserStatus) -> i64 {
        let hash = password::hash_password(password).unwrap();
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();
        state.users.push(StoredUser {
            user: User {
                id,
                name: format!("User {id}"),
                email: email.to_string(),
                phone: "3000000000".to_string(),
                national_id: format!("{:08}", 10_000_000 + id),
                role_id: permissions::ROLE_STUDENT,
                role_name: "Estudiante".to_string(),
                status,
                must_change_password: false,
                created_at: now,
                updated_at: now,
                last_access_at: None,
            },
            password_hash: hash,
        });
        id
    }

    /// Number of times `record_access` was called for a user.
    pub fn access_count(&self, user_id: i64) -> usize {
        self.state
            .lock()
            .unwrap()
            .accesses
            .get(&user_id)
            .copied()
            .unwrap_or(0)
    }
}

impl CredentialStore for MockCredentialStore {
    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.user.email.eq_ignore_ascii_case(email))
            .map(|u| UserCredentials {
                id: u.user.id,
                name: u.user.name.clone(),
                role_id: u.user.role_id,
                password_hash: u.password_hash.clone(),
                status: u.user.status,
                must_change_password: u.user.must_change_password,
            }))
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.roles.get(&role_id).cloned().unwrap_or_default())
    }

    async fn record_access(&self, user_id: i64) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        *state.accesses.entry(user_id).or_default() += 1;
        if let Some(u) = state.users.iter_mut().find(|u| u.user.id == user_id) {
            u.user.last_access_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn insert_user(&self, record: NewUserRecord) -> Result<User, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| {
            u.user.email.eq_ignore_ascii_case(&record.user.email)
                || u.user.national_id == record.user.national_id
        }) {
            return Err(AppError::Conflict(
                "A user with this email or national id already exists".to_string(),
            ));
        }

        state.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_id,
            name: record.user.name,
            email: record.user.email,
            phone: record.user.phone,
            national_id: record.user.national_id,
            role_id: record.user.role_id,
            role_name: String::new(),
            status: UserStatus::Active,
            must_change_password: record.must_change_password,
            created_at: now,
            updated_at: now,
            last_access_at: None,
        };
        state.users.push(StoredUser {
            user: user.clone(),
            password_hash: record.password_hash,
        });
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.user.id == user_id)
            .map(|u| u.user.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().map(|u| u.user.clone()).collect())
    }

    async fn update_user(
        &self,
        user_id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.users.iter_mut().find(|u| u.user.id == user_id) else {
            return Ok(None);
        };
        let user = &mut stored.user;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(national_id) = changes.national_id {
            user.national_id = national_id;
        }
        if let Some(role_id) = changes.role_id {
            user.role_id = role_id;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        if let Some(hash) = changes.password_hash {
            stored.password_hash = hash;
        }
        stored.user.updated_at = Utc::now();
        Ok(Some(stored.user.clone()))
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.user.id != user_id);
        Ok(state.users.len() != before)
    }

    async fn set_password(
        &self,
        user_id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_password_writes {
            return Err(AppError::ServiceUnavailable("password write failed".into()));
        }
        let Some(stored) = state.users.iter_mut().find(|u| u.user.id == user_id) else {
            return Ok(false);
        };
        stored.password_hash = password_hash.to_string();
        stored.user.must_change_password = must_change_password;
        stored.user.last_access_at = Some(Utc::now());
        Ok(true)
    }

    async fn store_reset_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.state.lock().unwrap().reset_tokens.push(StoredResetToken {
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            used: false,
        });
        Ok(())
    }

    async fn reset_password_with_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_password_writes {
            return Err(AppError::ServiceUnavailable("password write failed".into()));
        }
        let Some(token) = state
            .reset_tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && !t.used && t.expires_at > now)
        else {
            return Ok(None);
        };
        token.used = true;
        let user_id = token.user_id;

        if let Some(stored) = state.users.iter_mut().find(|u| u.user.id == user_id) {
            stored.password_hash = password_hash.to_string();
            stored.user.must_change_password = false;
            stored.user.last_access_at = Some(now);
        }
        Ok(Some(user_id))
    }
}
