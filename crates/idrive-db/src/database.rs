use idrive_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::booking_repository::BookingRepository;
use crate::class_repository::ClassRepository;
use crate::config::DatabaseConfig;
use crate::error::db_error;
use crate::reference_repository::ReferenceRepository;
use crate::user_repository::UserRepository;

/// Central database facade. Owns the connection pool, runs migrations
/// and vends repository instances.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Get a [`BookingRepository`] backed by this pool.
    pub fn booking_repo(&self) -> BookingRepository {
        BookingRepository::new(self.pool.clone())
    }

    /// Get a [`ClassRepository`] backed by this pool.
    pub fn class_repo(&self) -> ClassRepository {
        ClassRepository::new(self.pool.clone())
    }

    /// Get a [`UserRepository`] backed by this pool.
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Get a [`ReferenceRepository`] backed by this pool.
    pub fn reference_repo(&self) -> ReferenceRepository {
        ReferenceRepository::new(self.pool.clone())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for checked-out connections to be returned and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
