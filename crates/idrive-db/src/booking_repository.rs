use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Pool, Postgres};

use idrive_core::booking::{
    self, Booking, BookingDetail, BookingFilter, BookingPatch, BookingState, NewBooking,
    ReservationMethod, StudentRef, Transition,
};
use idrive_core::error::AppError;
use idrive_core::ledger::BookingLedger;
use idrive_core::validation;

use crate::error::db_error;

/// Booking joined with its class, room, instructor and student.
const DETAIL_SELECT: &str = r#"
    SELECT
        b.id, b.student_id, b.class_id, b.state, b.method, b.reserved_at, b.confirmed_at,
        c.name AS class_name,
        c.scheduled_at AS class_starts_at,
        instructor.name AS instructor_name,
        r.name AS room_name,
        student.name AS student_name
    FROM bookings b
    JOIN classes c ON c.id = b.class_id
    JOIN users instructor ON instructor.id = c.instructor_id
    JOIN rooms r ON r.id = c.room_id
    JOIN users student ON student.id = b.student_id
"#;

const DETAIL_ORDER: &str = "ORDER BY b.reserved_at DESC, b.id DESC";

/// PostgreSQL-backed booking ledger.
///
/// Every mutation runs in one transaction. Rows are locked booking first,
/// class second, so concurrent confirmations for one class queue up on the
/// class row and each sees the count left by the previous one.
#[derive(Clone)]
pub struct BookingRepository {
    pool: Pool<Postgres>,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    student_id: i64,
    class_id: i64,
    state: String,
    method: Option<String>,
    reserved_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse::<BookingState>()
            .map_err(|e| AppError::Internal(format!("Booking {}: {e}", row.id)))?;
        let method = row
            .method
            .map(|m| m.parse::<ReservationMethod>())
            .transpose()
            .map_err(|e| AppError::Internal(format!("Booking {}: {e}", row.id)))?;

        Ok(Booking {
            id: row.id,
            student_id: row.student_id,
            class_id: row.class_id,
            state,
            method,
            reserved_at: row.reserved_at,
            confirmed_at: row.confirmed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingDetailRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    class_name: String,
    class_starts_at: DateTime<Utc>,
    instructor_name: String,
    room_name: String,
    student_name: String,
}

impl TryFrom<BookingDetailRow> for BookingDetail {
    type Error = AppError;

    fn try_from(row: BookingDetailRow) -> Result<Self, Self::Error> {
        Ok(BookingDetail {
            booking: row.booking.try_into()?,
            class_name: row.class_name,
            class_starts_at: row.class_starts_at,
            instructor_name: row.instructor_name,
            room_name: row.room_name,
            student_name: row.student_name,
        })
    }
}

// -- Statement helpers shared by the transactional operations --

async fn lock_booking(conn: &mut PgConnection, booking_id: i64) -> Result<Booking, AppError> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT id, student_id, class_id, state, method, reserved_at, confirmed_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(conn)
    .await
    .map_err(db_error)?
    .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?
    .try_into()
}

/// Lock a class row and return its capacity.
async fn lock_class(conn: &mut PgConnection, class_id: i64) -> Result<i32, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT total_seats FROM classes WHERE id = $1 FOR UPDATE")
        .bind(class_id)
        .fetch_optional(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::Conflict(format!("Class {} does not exist", class_id)))
}

async fn count_confirmed(conn: &mut PgConnection, class_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM bookings WHERE class_id = $1 AND state = 'confirmed'",
    )
    .bind(class_id)
    .fetch_one(conn)
    .await
    .map_err(db_error)
}

/// Lock the class and fail `Conflict` if every seat is already confirmed.
async fn reserve_seat(conn: &mut PgConnection, class_id: i64) -> Result<(), AppError> {
    let total_seats = lock_class(&mut *conn, class_id).await?;
    let confirmed = count_confirmed(&mut *conn, class_id).await?;
    booking::ensure_seat_available(class_id, confirmed, total_seats)
}

async fn fetch_detail(conn: &mut PgConnection, booking_id: i64) -> Result<BookingDetail, AppError> {
    let sql = format!("{DETAIL_SELECT} WHERE b.id = $1");
    sqlx::query_as::<_, BookingDetailRow>(&sql)
        .bind(booking_id)
        .fetch_optional(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?
        .try_into()
}

async fn resolve_student(conn: &mut PgConnection, student: &StudentRef) -> Result<i64, AppError> {
    let found = match student {
        StudentRef::Id(id) => {
            validation::validate_id("student_id", *id)?;
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await
        }
        StudentRef::NationalId(national_id) => {
            validation::validate_national_id(national_id)?;
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE national_id = $1")
                .bind(national_id.trim())
                .fetch_optional(conn)
                .await
        }
    }
    .map_err(db_error)?;

    found.ok_or_else(|| AppError::NotFound(format!("Student with {} not found", student)))
}

// -- Trait implementation --

impl BookingLedger for BookingRepository {
    async fn create_booking(&self, request: NewBooking) -> Result<BookingDetail, AppError> {
        validation::validate_id("class_id", request.class_id)?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let student_id = resolve_student(&mut tx, &request.student).await?;

        let booking_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO bookings (student_id, class_id, state, method)
            VALUES ($1, $2, 'pending', $3)
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(request.class_id)
        .bind(request.method.map(|m| m.as_str()))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let detail = fetch_detail(&mut tx, booking_id).await?;
        tx.commit().await.map_err(db_error)?;

        tracing::info!(
            booking_id,
            student_id,
            class_id = request.class_id,
            "Booking created"
        );
        Ok(detail)
    }

    async fn confirm_booking(&self, booking_id: i64) -> Result<BookingDetail, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let current = lock_booking(&mut tx, booking_id).await?;
        match booking::plan_transition(current.state, BookingState::Confirmed)? {
            Transition::AlreadyApplied => {
                tracing::debug!(booking_id, "Booking already confirmed");
            }
            Transition::Apply => {
                reserve_seat(&mut tx, current.class_id).await?;
                sqlx::query(
                    r#"
                    UPDATE bookings
                    SET state = 'confirmed', confirmed_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(booking_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
                tracing::info!(booking_id, class_id = current.class_id, "Booking confirmed");
            }
        }

        let detail = fetch_detail(&mut tx, booking_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(detail)
    }

    async fn cancel_booking(&self, booking_id: i64) -> Result<BookingDetail, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let current = lock_booking(&mut tx, booking_id).await?;
        if booking::plan_transition(current.state, BookingState::Cancelled)? == Transition::Apply {
            sqlx::query("UPDATE bookings SET state = 'cancelled' WHERE id = $1")
                .bind(booking_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            tracing::info!(
                booking_id,
                class_id = current.class_id,
                previous = %current.state,
                "Booking cancelled"
            );
        }

        let detail = fetch_detail(&mut tx, booking_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(detail)
    }

    async fn update_booking(
        &self,
        booking_id: i64,
        patch: BookingPatch,
    ) -> Result<BookingDetail, AppError> {
        if patch.is_empty() {
            return Err(AppError::BadRequest(
                "No fields provided to update".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let current = lock_booking(&mut tx, booking_id).await?;
        let plan = patch.plan(&current)?;

        if !plan.is_noop() {
            let target_class = plan.class_id.unwrap_or(current.class_id);
            if plan.takes_seat() {
                reserve_seat(&mut tx, target_class).await?;
            } else if plan.class_id.is_some() {
                lock_class(&mut tx, target_class).await?;
            }

            sqlx::query(
                r#"
                UPDATE bookings
                SET class_id = COALESCE($2, class_id),
                    state = COALESCE($3, state),
                    method = COALESCE($4, method),
                    confirmed_at = CASE WHEN $3 = 'confirmed' THEN NOW() ELSE confirmed_at END
                WHERE id = $1
                "#,
            )
            .bind(booking_id)
            .bind(plan.class_id)
            .bind(plan.state.map(|s| s.as_str()))
            .bind(plan.method.map(|m| m.as_str()))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            tracing::info!(
                booking_id,
                class_id = target_class,
                state = ?plan.state,
                "Booking updated"
            );
        }

        let detail = fetch_detail(&mut tx, booking_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(detail)
    }

    async fn get_booking(&self, booking_id: i64) -> Result<Option<BookingDetail>, AppError> {
        let sql = format!("{DETAIL_SELECT} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BookingDetailRow>(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<BookingDetail>, AppError> {
        let rows = match &filter {
            BookingFilter::All => {
                let sql = format!("{DETAIL_SELECT} {DETAIL_ORDER}");
                sqlx::query_as::<_, BookingDetailRow>(&sql)
                    .fetch_all(&self.pool)
                    .await
            }
            BookingFilter::Student(student_id) => {
                let sql = format!("{DETAIL_SELECT} WHERE b.student_id = $1 {DETAIL_ORDER}");
                sqlx::query_as::<_, BookingDetailRow>(&sql)
                    .bind(student_id)
                    .fetch_all(&self.pool)
                    .await
            }
            BookingFilter::StudentNationalId(national_id) => {
                let sql = format!("{DETAIL_SELECT} WHERE student.national_id = $1 {DETAIL_ORDER}");
                sqlx::query_as::<_, BookingDetailRow>(&sql)
                    .bind(national_id.trim())
                    .fetch_all(&self.pool)
                    .await
            }
            BookingFilter::Class(class_id) => {
                let sql = format!("{DETAIL_SELECT} WHERE b.class_id = $1 {DETAIL_ORDER}");
                sqlx::query_as::<_, BookingDetailRow>(&sql)
                    .bind(class_id)
                    .fetch_all(&self.pool)
                    .await
            }
            BookingFilter::State(state) => {
                let sql = format!("{DETAIL_SELECT} WHERE b.state = $1 {DETAIL_ORDER}");
                sqlx::query_as::<_, BookingDetailRow>(&sql)
                    .bind(state.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn confirmed_count(&self, class_id: i64) -> Result<i64, AppError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        count_confirmed(&mut conn, class_id).await
    }
}
