//! Translation of sqlx errors into the application taxonomy.

use idrive_core::AppError;

/// Map a datastore error to an [`AppError`], logging it on the way.
///
/// Constraint violations become client errors; connectivity problems become
/// `ServiceUnavailable`; anything else is `Internal`.
pub(crate) fn db_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::error!(error = %err, "Database unavailable");
            AppError::ServiceUnavailable(err.to_string())
        }
        sqlx::Error::Database(db) => {
            let code = db.code();
            let code = code.as_deref().unwrap_or_default();
            let constraint = db.constraint().unwrap_or_default();
            match code {
                "23505" | "23503" => {
                    tracing::warn!(%code, %constraint, "Constraint violation");
                    AppError::Conflict(constraint_message(constraint).to_string())
                }
                "23514" | "23502" => {
                    tracing::warn!(%code, %constraint, "Check violation");
                    AppError::BadRequest(format!("Invalid value rejected by the datastore ({constraint})"))
                }
                c if c.starts_with("22") => {
                    tracing::warn!(%code, error = %db, "Data exception");
                    AppError::BadRequest(db.message().to_string())
                }
                _ => {
                    tracing::error!(%code, error = %db, "Database error");
                    AppError::Internal(err.to_string())
                }
            }
        }
        _ => {
            tracing::error!(error = %err, "Database error");
            AppError::Internal(err.to_string())
        }
    }
}

/// Whether `err` is a foreign-key violation, for callers that need a more
/// specific message than [`db_error`] gives.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn constraint_message(constraint: &str) -> &'static str {
    match constraint {
        "bookings_active_student_class" => "Student already has an active booking for this class",
        "bookings_class_id_fkey" => "Class does not exist",
        "bookings_student_id_fkey" => "Student does not exist",
        "classes_instructor_id_fkey" => "Instructor does not exist",
        "classes_room_id_fkey" => "Room does not exist",
        "users_role_id_fkey" => "Role does not exist",
        "users_email_key" => "A user with this email already exists",
        "users_national_id_key" => "A user with this national id already exists",
        _ => "Operation conflicts with existing data",
    }
}
