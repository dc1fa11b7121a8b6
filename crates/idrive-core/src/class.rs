use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::validation;

/// Default class length when none is given.
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// A scheduled teaching session.
///
/// `seats_remaining` is derived from the confirmed bookings at read time;
/// it is never stored.
#[derive(Debug, Clone, Serialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub instructor_id: i64,
    pub room_id: i64,
    pub total_seats: i32,
    pub seats_remaining: i32,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seats still open in a class, clamped to `0..=total_seats`.
pub fn seats_remaining(total_seats: i32, confirmed: i64) -> i32 {
    let remaining = i64::from(total_seats) - confirmed;
    remaining.clamp(0, i64::from(total_seats.max(0))) as i32
}

/// Request to schedule a new class.
#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub instructor_id: i64,
    pub room_id: i64,
    pub total_seats: i32,
    pub duration_minutes: Option<i32>,
}

impl NewClass {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_class_name(&self.name)?;
        validation::validate_id("instructor_id", self.instructor_id)?;
        validation::validate_id("room_id", self.room_id)?;
        validate_total_seats(self.total_seats)?;
        if let Some(duration) = self.duration_minutes {
            validate_duration(duration)?;
        }
        Ok(())
    }

    pub fn duration_or_default(&self) -> i32 {
        self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }
}

/// Partial update of a class. Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub instructor_id: Option<i64>,
    pub room_id: Option<i64>,
    pub total_seats: Option<i32>,
    pub duration_minutes: Option<i32>,
}

impl ClassPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.scheduled_at.is_none()
            && self.instructor_id.is_none()
            && self.room_id.is_none()
            && self.total_seats.is_none()
            && self.duration_minutes.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::BadRequest(
                "No fields provided to update".to_string(),
            ));
        }
        if let Some(name) = &self.name {
            validate_class_name(name)?;
        }
        if let Some(id) = self.instructor_id {
            validation::validate_id("instructor_id", id)?;
        }
        if let Some(id) = self.room_id {
            validation::validate_id("room_id", id)?;
        }
        if let Some(seats) = self.total_seats {
            validate_total_seats(seats)?;
        }
        if let Some(duration) = self.duration_minutes {
            validate_duration(duration)?;
        }
        Ok(())
    }
}

fn validate_class_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Class name cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_total_seats(seats: i32) -> Result<(), AppError> {
    if seats <= 0 {
        return Err(AppError::BadRequest(
            "total_seats must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_duration(minutes: i32) -> Result<(), AppError> {
    if minutes <= 0 {
        return Err(AppError::BadRequest(
            "duration_minutes must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
