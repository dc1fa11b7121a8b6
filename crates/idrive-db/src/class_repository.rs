use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Pool, Postgres};

use idrive_core::class::{self, Class, ClassPatch, NewClass};
use idrive_core::error::AppError;
use idrive_core::ledger::ClassRegistry;

use crate::error::db_error;

/// Class columns plus the number of confirmed bookings, from which the
/// remaining seats are derived.
const CLASS_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.description, c.scheduled_at, c.instructor_id, c.room_id,
        c.total_seats, c.duration_minutes, c.created_at, c.updated_at,
        COALESCE(cb.confirmed, 0) AS confirmed
    FROM classes c
    LEFT JOIN (
        SELECT class_id, COUNT(*) AS confirmed
        FROM bookings
        WHERE state = 'confirmed'
        GROUP BY class_id
    ) cb ON cb.class_id = c.id
"#;

/// PostgreSQL-backed class registry.
#[derive(Clone)]
pub struct ClassRepository {
    pool: Pool<Postgres>,
}

impl ClassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ClassRow {
    id: i64,
    name: String,
    description: Option<String>,
    scheduled_at: DateTime<Utc>,
    instructor_id: i64,
    room_id: i64,
    total_seats: i32,
    duration_minutes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    confirmed: i64,
}

impl From<ClassRow> for Class {
    fn from(row: ClassRow) -> Self {
        Class {
            id: row.id,
            name: row.name,
            description: row.description,
            scheduled_at: row.scheduled_at,
            instructor_id: row.instructor_id,
            room_id: row.room_id,
            total_seats: row.total_seats,
            seats_remaining: class::seats_remaining(row.total_seats, row.confirmed),
            duration_minutes: row.duration_minutes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn fetch_class(conn: &mut PgConnection, class_id: i64) -> Result<Class, AppError> {
    let sql = format!("{CLASS_SELECT} WHERE c.id = $1");
    sqlx::query_as::<_, ClassRow>(&sql)
        .bind(class_id)
        .fetch_optional(conn)
        .await
        .map_err(db_error)?
        .map(Into::into)
        .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))
}

/// Lock a class row for the rest of the transaction. `NotFound` if absent.
async fn lock_class(conn: &mut PgConnection, class_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM classes WHERE id = $1 FOR UPDATE")
        .bind(class_id)
        .fetch_optional(conn)
        .await
        .map_err(db_error)?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))
}

impl ClassRegistry for ClassRepository {
    async fn create_class(&self, request: NewClass) -> Result<Class, AppError> {
        request.validate()?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let class_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO classes
                (name, description, scheduled_at, instructor_id, room_id, total_seats, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.scheduled_at)
        .bind(request.instructor_id)
        .bind(request.room_id)
        .bind(request.total_seats)
        .bind(request.duration_or_default())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let class = fetch_class(&mut tx, class_id).await?;
        tx.commit().await.map_err(db_error)?;

        tracing::info!(class_id, total_seats = class.total_seats, "Class created");
        Ok(class)
    }

    async fn get_class(&self, class_id: i64) -> Result<Option<Class>, AppError> {
        let sql = format!("{CLASS_SELECT} WHERE c.id = $1");
        let row = sqlx::query_as::<_, ClassRow>(&sql)
            .bind(class_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_classes(&self) -> Result<Vec<Class>, AppError> {
        let sql = format!("{CLASS_SELECT} ORDER BY c.scheduled_at DESC, c.id DESC");
        let rows = sqlx::query_as::<_, ClassRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_available_classes(&self, now: DateTime<Utc>) -> Result<Vec<Class>, AppError> {
        let sql = format!(
            "{CLASS_SELECT} WHERE c.scheduled_at > $1 AND COALESCE(cb.confirmed, 0) < c.total_seats \
             ORDER BY c.scheduled_at ASC, c.id ASC"
        );
        let rows = sqlx::query_as::<_, ClassRow>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_class(&self, class_id: i64, patch: ClassPatch) -> Result<Class, AppError> {
        patch.validate()?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        lock_class(&mut tx, class_id).await?;

        if let Some(total_seats) = patch.total_seats {
            let confirmed = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM bookings WHERE class_id = $1 AND state = 'confirmed'",
            )
            .bind(class_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

            if i64::from(total_seats) < confirmed {
                return Err(AppError::Conflict(format!(
                    "Class {class_id} already has {confirmed} confirmed bookings; \
                     total seats cannot drop to {total_seats}"
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE classes
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                scheduled_at = COALESCE($4, scheduled_at),
                instructor_id = COALESCE($5, instructor_id),
                room_id = COALESCE($6, room_id),
                total_seats = COALESCE($7, total_seats),
                duration_minutes = COALESCE($8, duration_minutes),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(class_id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(&patch.description)
        .bind(patch.scheduled_at)
        .bind(patch.instructor_id)
        .bind(patch.room_id)
        .bind(patch.total_seats)
        .bind(patch.duration_minutes)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let class = fetch_class(&mut tx, class_id).await?;
        tx.commit().await.map_err(db_error)?;

        tracing::info!(class_id, "Class updated");
        Ok(class)
    }

    async fn delete_class(&self, class_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        lock_class(&mut tx, class_id).await?;

        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE class_id = $1 AND state <> 'cancelled'",
        )
        .bind(class_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Class {class_id} still has {active} active booking(s)"
            )));
        }

        let purged = sqlx::query("DELETE FROM bookings WHERE class_id = $1 AND state = 'cancelled'")
            .bind(class_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected();

        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        tracing::info!(class_id, cancelled_bookings_removed = purged, "Class deleted");
        Ok(())
    }
}
