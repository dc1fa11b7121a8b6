use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Pool, Postgres};

use idrive_core::error::AppError;
use idrive_core::models::{NewUserRecord, User, UserChanges, UserCredentials, UserStatus};
use idrive_core::traits::CredentialStore;

use crate::error::{db_error, is_foreign_key_violation};

const USER_SELECT: &str = r#"
    SELECT
        u.id, u.name, u.email, u.phone, u.national_id, u.role_id,
        r.name AS role_name,
        u.status, u.must_change_password, u.created_at, u.updated_at, u.last_access_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

/// PostgreSQL-backed credential store: users, role grants and reset tokens.
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    national_id: String,
    role_id: i64,
    role_name: String,
    status: String,
    must_change_password: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_access_at: Option<DateTime<Utc>>,
}

fn parse_status(user_id: i64, raw: &str) -> Result<UserStatus, AppError> {
    raw.parse::<UserStatus>()
        .map_err(|e| AppError::Internal(format!("User {user_id}: {e}")))
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            national_id: row.national_id,
            role_id: row.role_id,
            role_name: row.role_name,
            status: parse_status(row.id, &row.status)?,
            must_change_password: row.must_change_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_access_at: row.last_access_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: i64,
    name: String,
    role_id: i64,
    password_hash: String,
    status: String,
    must_change_password: bool,
}

impl TryFrom<CredentialsRow> for UserCredentials {
    type Error = AppError;

    fn try_from(row: CredentialsRow) -> Result<Self, Self::Error> {
        Ok(UserCredentials {
            status: parse_status(row.id, &row.status)?,
            id: row.id,
            name: row.name,
            role_id: row.role_id,
            password_hash: row.password_hash,
            must_change_password: row.must_change_password,
        })
    }
}

async fn fetch_user(conn: &mut PgConnection, user_id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("{USER_SELECT} WHERE u.id = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(db_error)?;

    row.map(TryInto::try_into).transpose()
}

// -- Trait implementation --

impl CredentialStore for UserRepository {
    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, name, role_id, password_hash, status, must_change_password
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn record_access(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_access_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn insert_user(&self, record: NewUserRecord) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users
                (name, email, phone, national_id, password_hash, role_id, must_change_password)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(record.user.name.trim())
        .bind(record.user.email.trim())
        .bind(record.user.phone.trim())
        .bind(record.user.national_id.trim())
        .bind(&record.password_hash)
        .bind(record.user.role_id)
        .bind(record.must_change_password)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let user = fetch_user(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {user_id} vanished after insert")))?;
        tx.commit().await.map_err(db_error)?;

        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        fetch_user(&mut conn, user_id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("{USER_SELECT} ORDER BY u.name, u.id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_user(
        &self,
        user_id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                national_id = COALESCE($5, national_id),
                role_id = COALESCE($6, role_id),
                status = COALESCE($7, status),
                password_hash = COALESCE($8, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.email.as_deref().map(str::trim))
        .bind(changes.phone.as_deref().map(str::trim))
        .bind(changes.national_id.as_deref().map(str::trim))
        .bind(changes.role_id)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.password_hash.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.is_none() {
            return Ok(None);
        }

        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(user)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(format!(
                        "User {user_id} is still referenced by bookings or classes"
                    ))
                } else {
                    db_error(e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_password(
        &self,
        user_id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                must_change_password = $3,
                last_access_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(must_change_password)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn store_reset_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn reset_password_with_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE password_reset_tokens
            SET used_at = $2
            WHERE token_hash = $1
              AND used_at IS NULL
              AND expires_at > $2
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                must_change_password = FALSE,
                last_access_at = $3,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(Some(user_id))
    }
}
