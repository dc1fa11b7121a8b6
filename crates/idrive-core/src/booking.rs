use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// State of a booking.
///
/// ```text
/// Pending --confirm--> Confirmed
/// Pending --cancel---> Cancelled
/// Confirmed --cancel--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Pending => "pending",
            BookingState::Confirmed => "confirmed",
            BookingState::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingState::Cancelled)
    }

    pub fn can_transition_to(&self, next: BookingState) -> bool {
        matches!(
            (self, next),
            (BookingState::Pending, BookingState::Confirmed)
                | (BookingState::Pending, BookingState::Cancelled)
                | (BookingState::Confirmed, BookingState::Cancelled)
        )
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(BookingState::Pending),
            "confirmed" | "confirmado" => Ok(BookingState::Confirmed),
            "cancelled" | "cancelado" => Ok(BookingState::Cancelled),
            _ => Err(format!("Unknown booking state: {}", s)),
        }
    }
}

/// Channel through which a booking was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationMethod {
    Web,
    Mobile,
    InPerson,
}

impl ReservationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationMethod::Web => "web",
            ReservationMethod::Mobile => "mobile",
            ReservationMethod::InPerson => "in_person",
        }
    }
}

impl fmt::Display for ReservationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(ReservationMethod::Web),
            "mobile" | "movil" | "móvil" => Ok(ReservationMethod::Mobile),
            "in_person" | "presencial" => Ok(ReservationMethod::InPerson),
            _ => Err(format!("Unknown reservation method: {}", s)),
        }
    }
}

/// A student's reservation against a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub state: BookingState,
    pub method: Option<ReservationMethod>,
    pub reserved_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// A booking joined with the class, room, instructor and student it refers to.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub class_name: String,
    pub class_starts_at: DateTime<Utc>,
    pub instructor_name: String,
    pub room_name: String,
    pub student_name: String,
}

/// How the student of a new booking is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentRef {
    Id(i64),
    /// National identity number (cédula).
    NationalId(String),
}

impl fmt::Display for StudentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentRef::Id(id) => write!(f, "id {id}"),
            StudentRef::NationalId(national_id) => write!(f, "national id {national_id}"),
        }
    }
}

/// Request to create a booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub student: StudentRef,
    pub class_id: i64,
    pub method: Option<ReservationMethod>,
}

impl NewBooking {
    pub fn new(student: StudentRef, class_id: i64) -> Self {
        Self {
            student,
            class_id,
            method: None,
        }
    }

    pub fn with_method(mut self, method: ReservationMethod) -> Self {
        self.method = Some(method);
        self
    }
}

/// Selection criteria for listing bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingFilter {
    All,
    Student(i64),
    StudentNationalId(String),
    Class(i64),
    State(BookingState),
}

/// Result of checking a requested state change against the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The booking must be moved to the target state.
    Apply,
    /// The booking is already in the target state; nothing to write.
    AlreadyApplied,
}

/// Check a state change against the booking state machine.
///
/// Repeating a transition that already happened is accepted as a no-op, so
/// confirming or cancelling twice returns the same record.
pub fn plan_transition(current: BookingState, target: BookingState) -> Result<Transition, AppError> {
    if current == target {
        return Ok(Transition::AlreadyApplied);
    }
    if current.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Booking is {current} and can no longer change state"
        )));
    }
    if current.can_transition_to(target) {
        return Ok(Transition::Apply);
    }
    Err(AppError::Conflict(format!(
        "Booking cannot move from {current} to {target}"
    )))
}

/// Capacity gate for confirmation. `confirmed` must be read under the class row lock.
pub fn ensure_seat_available(class_id: i64, confirmed: i64, total_seats: i32) -> Result<(), AppError> {
    if confirmed >= i64::from(total_seats) {
        return Err(AppError::Conflict(format!(
            "Class {class_id} is full ({confirmed} of {total_seats} seats confirmed)"
        )));
    }
    Ok(())
}

/// Partial update of a booking. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    pub class_id: Option<i64>,
    pub state: Option<BookingState>,
    pub method: Option<ReservationMethod>,
}

/// The writes a [`BookingPatch`] resolves to for a given booking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchPlan {
    /// Target class, set only when the booking actually moves.
    pub class_id: Option<i64>,
    /// Target state, set only when the state actually changes.
    pub state: Option<BookingState>,
    pub method: Option<ReservationMethod>,
}

impl PatchPlan {
    /// Whether applying this plan takes a seat and needs the capacity check.
    pub fn takes_seat(&self) -> bool {
        self.state == Some(BookingState::Confirmed)
    }

    pub fn is_noop(&self) -> bool {
        self.class_id.is_none() && self.state.is_none() && self.method.is_none()
    }
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        self.class_id.is_none() && self.state.is_none() && self.method.is_none()
    }

    /// Resolve the patch against the current booking.
    ///
    /// Moving to another class is only allowed while the booking is pending;
    /// state changes follow [`plan_transition`].
    pub fn plan(&self, current: &Booking) -> Result<PatchPlan, AppError> {
        if self.is_empty() {
            return Err(AppError::BadRequest(
                "No fields provided to update".to_string(),
            ));
        }

        let class_id = match self.class_id {
            Some(id) if id < 1 => {
                return Err(AppError::BadRequest(
                    "class_id must be at least 1".to_string(),
                ));
            }
            Some(id) if id != current.class_id => {
                if current.state != BookingState::Pending {
                    return Err(AppError::Conflict(format!(
                        "Booking {} is {} and cannot move to another class",
                        current.id, current.state
                    )));
                }
                Some(id)
            }
            _ => None,
        };

        let state = match self.state {
            Some(target) => match plan_transition(current.state, target)? {
                Transition::Apply => Some(target),
                Transition::AlreadyApplied => None,
            },
            None => None,
        };

        let method = self.method.filter(|m| current.method != Some(*m));

        Ok(PatchPlan {
            class_id,
            state,
            method,
        })
    }
}
