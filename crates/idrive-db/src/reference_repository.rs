use sqlx::{PgPool, Pool, Postgres};

use idrive_core::error::AppError;
use idrive_core::models::{Role, Room};

use crate::error::db_error;

/// Read-only access to roles and rooms.
#[derive(Clone)]
pub struct ReferenceRepository {
    pool: Pool<Postgres>,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        let rows = sqlx::query_as::<_, RoomRow>(
            "SELECT id, name, location, capacity FROM rooms ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i64,
    name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: i64,
    name: String,
    location: String,
    capacity: i32,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            id: row.id,
            name: row.name,
            location: row.location,
            capacity: row.capacity,
        }
    }
}
