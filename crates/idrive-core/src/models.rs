use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation;

/// Account status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" | "activo" => Ok(UserStatus::Active),
            "inactive" | "inactivo" => Ok(UserStatus::Inactive),
            _ => Err(format!("Unknown user status: {}", s)),
        }
    }
}

/// A user profile, joined with its role name. Never carries the credential hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub role_id: i64,
    pub role_name: String,
    pub status: UserStatus,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

/// The subset of a user needed to verify a login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub name: String,
    pub role_id: i64,
    pub password_hash: String,
    pub status: UserStatus,
    pub must_change_password: bool,
}

/// Input for creating a user. The password is generated by the service.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub role_id: i64,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::validate_name(&self.name)?;
        validation::validate_email(&self.email)?;
        validation::validate_phone(&self.phone)?;
        validation::validate_national_id(&self.national_id)?;
        validation::validate_id("role_id", self.role_id)
    }
}

/// A user row ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub user: NewUser,
    pub password_hash: String,
    pub must_change_password: bool,
}

/// Partial update of a user as received from an administrator.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub role_id: Option<i64>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.national_id.is_none()
            && self.role_id.is_none()
            && self.status.is_none()
            && self.password.is_none()
    }

    /// Rejects empty patches and invalid field values before anything is persisted.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::BadRequest(
                "No fields provided to update".to_string(),
            ));
        }
        if let Some(name) = &self.name {
            validation::validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validation::validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validation::validate_phone(phone)?;
        }
        if let Some(national_id) = &self.national_id {
            validation::validate_national_id(national_id)?;
        }
        if let Some(role_id) = self.role_id {
            validation::validate_id("role_id", role_id)?;
        }
        if let Some(password) = &self.password {
            crate::password::validate_password_policy(password)?;
        }
        Ok(())
    }
}

/// Stored form of a [`UserPatch`]: the password has already been hashed.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub role_id: Option<i64>,
    pub status: Option<UserStatus>,
    pub password_hash: Option<String>,
}

/// A role and its display name.
#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// A physical classroom. Capacity is informational; class seats are set per class.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub capacity: i32,
}
