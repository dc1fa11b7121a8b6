use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use idrive_core::booking::{BookingDetail, BookingPatch, NewBooking, StudentRef};
use idrive_core::class::{Class, ClassPatch, NewClass};
use idrive_core::models::{NewUser, Role, Room, User, UserPatch};
use idrive_core::{AppError, CreatedUser, LoginOutput};

fn parse_field<T>(field: &str, raw: Option<String>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    raw.map(|v| {
        v.parse::<T>()
            .map_err(|e| AppError::BadRequest(format!("Invalid {field}: {e}")))
    })
    .transpose()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Form-encoded login credentials. `username` is the account email.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub must_change_password: bool,
    pub user_id: i64,
    pub name: String,
    pub role_id: i64,
    pub permissions: Vec<String>,
}

impl From<LoginOutput> for LoginResponse {
    fn from(out: LoginOutput) -> Self {
        Self {
            access_token: out.access_token,
            token_type: "bearer",
            expires_at: out.expires_at,
            must_change_password: out.must_change_password,
            user_id: out.user_id,
            name: out.name,
            role_id: out.role_id,
            permissions: out.permissions,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PasswordResetRequestResponse {
    pub message: String,
    /// Only present when the server is configured to expose reset tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub role_id: i64,
}

impl From<CreateUserRequest> for NewUser {
    fn from(body: CreateUserRequest) -> Self {
        NewUser {
            name: body.name,
            email: body.email,
            phone: body.phone,
            national_id: body.national_id,
            role_id: body.role_id,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub role_id: Option<i64>,
    /// `active` or `inactive`.
    pub status: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserPatch {
    type Error = AppError;

    fn try_from(body: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(UserPatch {
            name: body.name,
            email: body.email,
            phone: body.phone,
            national_id: body.national_id,
            role_id: body.role_id,
            status: parse_field("status", body.status)?,
            password: body.password,
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub role_id: i64,
    pub role_name: String,
    pub status: String,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            national_id: user.national_id,
            role_id: user.role_id,
            role_name: user.role_name,
            status: user.status.to_string(),
            must_change_password: user.must_change_password,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_access_at: user.last_access_at,
        }
    }
}

/// A created user plus the temporary password, which is shown only once.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreatedUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub temporary_password: String,
}

impl From<CreatedUser> for CreatedUserResponse {
    fn from(created: CreatedUser) -> Self {
        Self {
            user: created.user.into(),
            temporary_password: created.temporary_password,
        }
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RoomResponse {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub capacity: i32,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            location: room.location,
            capacity: room.capacity,
        }
    }
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateClassRequest {
    pub name: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub instructor_id: i64,
    pub room_id: i64,
    pub total_seats: i32,
    /// Defaults to 60.
    pub duration_minutes: Option<i32>,
}

impl From<CreateClassRequest> for NewClass {
    fn from(body: CreateClassRequest) -> Self {
        NewClass {
            name: body.name,
            description: body.description,
            scheduled_at: body.scheduled_at,
            instructor_id: body.instructor_id,
            room_id: body.room_id,
            total_seats: body.total_seats,
            duration_minutes: body.duration_minutes,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub instructor_id: Option<i64>,
    pub room_id: Option<i64>,
    pub total_seats: Option<i32>,
    pub duration_minutes: Option<i32>,
}

impl From<UpdateClassRequest> for ClassPatch {
    fn from(body: UpdateClassRequest) -> Self {
        ClassPatch {
            name: body.name,
            description: body.description,
            scheduled_at: body.scheduled_at,
            instructor_id: body.instructor_id,
            room_id: body.room_id,
            total_seats: body.total_seats,
            duration_minutes: body.duration_minutes,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ClassResponse {
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

impl From<Class> for ClassResponse {
    fn from(class: Class) -> Self {
        Self {
            id: class.id,
            name: class.name,
            description: class.description,
            scheduled_at: class.scheduled_at,
            instructor_id: class.instructor_id,
            room_id: class.room_id,
            total_seats: class.total_seats,
            seats_remaining: class.seats_remaining,
            duration_minutes: class.duration_minutes,
            created_at: class.created_at,
            updated_at: class.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

/// Identify the student either by id or by national id (cédula), not both.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateBookingRequest {
    pub student_id: Option<i64>,
    pub national_id: Option<String>,
    pub class_id: i64,
    /// `web`, `mobile` or `in_person`.
    pub method: Option<String>,
}

impl TryFrom<CreateBookingRequest> for NewBooking {
    type Error = AppError;

    fn try_from(body: CreateBookingRequest) -> Result<Self, Self::Error> {
        let student = match (body.student_id, body.national_id) {
            (Some(id), None) => StudentRef::Id(id),
            (None, Some(national_id)) => StudentRef::NationalId(national_id),
            _ => {
                return Err(AppError::BadRequest(
                    "Provide exactly one of student_id or national_id".to_string(),
                ));
            }
        };

        Ok(NewBooking {
            student,
            class_id: body.class_id,
            method: parse_field("method", body.method)?,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateBookingRequest {
    pub class_id: Option<i64>,
    /// `pending`, `confirmed` or `cancelled`.
    pub state: Option<String>,
    pub method: Option<String>,
}

impl TryFrom<UpdateBookingRequest> for BookingPatch {
    type Error = AppError;

    fn try_from(body: UpdateBookingRequest) -> Result<Self, Self::Error> {
        Ok(BookingPatch {
            class_id: body.class_id,
            state: parse_field("state", body.state)?,
            method: parse_field("method", body.method)?,
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BookingResponse {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub state: String,
    pub method: Option<String>,
    pub reserved_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub class_name: String,
    pub class_starts_at: DateTime<Utc>,
    pub instructor_name: String,
    pub room_name: String,
    pub student_name: String,
}

impl From<BookingDetail> for BookingResponse {
    fn from(detail: BookingDetail) -> Self {
        let booking = detail.booking;
        Self {
            id: booking.id,
            student_id: booking.student_id,
            class_id: booking.class_id,
            state: booking.state.to_string(),
            method: booking.method.map(|m| m.to_string()),
            reserved_at: booking.reserved_at,
            confirmed_at: booking.confirmed_at,
            class_name: detail.class_name,
            class_starts_at: detail.class_starts_at,
            instructor_name: detail.instructor_name,
            room_name: detail.room_name,
            student_name: detail.student_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
