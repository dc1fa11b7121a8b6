use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Form, Router, middleware};
use chrono::Utc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use idrive_core::permissions;
use idrive_core::{
    AppError, BookingFilter, BookingLedger, BookingPatch, BookingState, ClassRegistry, NewBooking,
    SessionClaims, UserPatch,
};

use crate::auth::require_session;
use crate::dto::{
    BookingResponse, ChangePasswordRequest, ClassResponse, CreateBookingRequest,
    CreateClassRequest, CreateUserRequest, CreatedUserResponse, HealthResponse, LoginForm,
    LoginResponse, MessageResponse, PasswordResetRequest, PasswordResetRequestResponse,
    ResetPasswordRequest, RoleResponse, RoomResponse, UpdateBookingRequest, UpdateClassRequest,
    UpdateUserRequest, UserResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/usuarios/cambiar-password", put(change_password))
        .route("/usuarios/", post(create_user).get(list_users))
        .route(
            "/usuarios/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/clases/", get(list_classes).post(create_class))
        .route("/clases/disponibles", get(list_available_classes))
        .route(
            "/clases/{id}",
            get(get_class).put(update_class).delete(delete_class),
        )
        .route("/agendamientos/", get(list_bookings).post(create_booking))
        .route(
            "/agendamientos/{id}",
            get(get_booking).put(update_booking).delete(cancel_booking),
        )
        .route("/agendamientos/confirmar/{id}", post(confirm_booking))
        .route(
            "/agendamientos/estudiante/{id}",
            get(list_bookings_by_student),
        )
        .route(
            "/agendamientos/cedula/{cedula}",
            get(list_bookings_by_national_id),
        )
        .route("/agendamientos/clase/{id}", get(list_bookings_by_class))
        .route("/agendamientos/estado/{state}", get(list_bookings_by_state))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .route("/usuarios/login", post(login))
        .route("/usuarios/solicitar-reseteo", post(request_password_reset))
        .route("/usuarios/reseteo-password", post(reset_password))
        .route("/roles/", get(list_roles))
        .route("/salones/", get(list_rooms))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/usuarios/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 401, description = "Incorrect email or password", body = crate::dto::ErrorResponse),
        (status = 403, description = "Account is inactive", body = crate::dto::ErrorResponse),
    ),
    tag = "session"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let output = state.auth.authenticate(&form.username, &form.password).await?;
    Ok(axum::Json(LoginResponse::from(output)))
}

#[utoipa::path(
    put,
    path = "/usuarios/cambiar-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Password does not meet the policy", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "session"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    axum::Json(body): axum::Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.user_id()?;
    state.auth.change_password(user_id, &body.new_password).await?;
    Ok(axum::Json(MessageResponse::new("Password updated")))
}

#[utoipa::path(
    post,
    path = "/usuarios/solicitar-reseteo",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset requested; the answer is the same whether or not the email exists", body = PasswordResetRequestResponse),
    ),
    tag = "session"
)]
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = state.auth.request_password_reset(&body.email).await?;

    let ticket = ticket.filter(|_| state.expose_reset_tokens);

    let response = PasswordResetRequestResponse {
        message: "If the account exists, a reset token has been issued".to_string(),
        expires_at: ticket.as_ref().map(|t| t.expires_at),
        reset_token: ticket.map(|t| t.token),
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    post,
    path = "/usuarios/reseteo-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Password does not meet the policy", body = crate::dto::ErrorResponse),
        (status = 401, description = "Token is unknown, used or expired", body = crate::dto::ErrorResponse),
    ),
    tag = "session"
)]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .reset_password(&body.token, &body.new_password)
        .await?;
    Ok(axum::Json(MessageResponse::new("Password has been reset")))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/usuarios/",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Invalid user data", body = crate::dto::ErrorResponse),
        (status = 403, description = "Missing permission", body = crate::dto::ErrorResponse),
        (status = 409, description = "Email or national id already registered", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    axum::Json(body): axum::Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::USERS_CREATE)?;

    let created = state.auth.create_user(body.into()).await?;
    Ok((
        StatusCode::CREATED,
        axum::Json(CreatedUserResponse::from(created)),
    ))
}

#[utoipa::path(
    get,
    path = "/usuarios/",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 403, description = "Missing permission", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::USERS_READ)?;

    let users = state.auth.list_users().await?;
    let body: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(axum::Json(body))
}

#[utoipa::path(
    get,
    path = "/usuarios/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::USERS_READ)?;

    let user = state.auth.get_user(id).await?;
    Ok(axum::Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/usuarios/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Empty or invalid patch", body = crate::dto::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Email or national id already registered", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::USERS_EDIT)?;

    let patch = UserPatch::try_from(body)?;
    let user = state.auth.update_user(id, patch).await?;
    Ok(axum::Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/usuarios/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "User is still referenced", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::USERS_DELETE)?;

    state.auth.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/roles/",
    responses((status = 200, description = "All roles", body = Vec<RoleResponse>)),
    tag = "reference"
)]
pub async fn list_roles(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let roles = state.db.reference_repo().list_roles().await?;
    let body: Vec<RoleResponse> = roles.into_iter().map(Into::into).collect();
    Ok(axum::Json(body))
}

#[utoipa::path(
    get,
    path = "/salones/",
    responses((status = 200, description = "All rooms", body = Vec<RoomResponse>)),
    tag = "reference"
)]
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let rooms = state.db.reference_repo().list_rooms().await?;
    let body: Vec<RoomResponse> = rooms.into_iter().map(Into::into).collect();
    Ok(axum::Json(body))
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/clases/",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "Invalid class data", body = crate::dto::ErrorResponse),
        (status = 409, description = "Unknown instructor or room", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "classes"
)]
pub async fn create_class(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    axum::Json(body): axum::Json<CreateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::CLASSES_CREATE)?;

    let class = state.db.class_repo().create_class(body.into()).await?;
    Ok((StatusCode::CREATED, axum::Json(ClassResponse::from(class))))
}

#[utoipa::path(
    get,
    path = "/clases/",
    responses((status = 200, description = "All classes, latest first", body = Vec<ClassResponse>)),
    security(("bearer" = [])),
    tag = "classes"
)]
pub async fn list_classes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let classes = state.db.class_repo().list_classes().await?;
    let body: Vec<ClassResponse> = classes.into_iter().map(Into::into).collect();
    Ok(axum::Json(body))
}

#[utoipa::path(
    get,
    path = "/clases/disponibles",
    responses((status = 200, description = "Upcoming classes with free seats", body = Vec<ClassResponse>)),
    security(("bearer" = [])),
    tag = "classes"
)]
pub async fn list_available_classes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let classes = state
        .db
        .class_repo()
        .list_available_classes(Utc::now())
        .await?;
    let body: Vec<ClassResponse> = classes.into_iter().map(Into::into).collect();
    Ok(axum::Json(body))
}

#[utoipa::path(
    get,
    path = "/clases/{id}",
    params(("id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class", body = ClassResponse),
        (status = 404, description = "Class not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "classes"
)]
pub async fn get_class(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let class = state
        .db
        .class_repo()
        .get_class(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Class {} not found", id)))?;
    Ok(axum::Json(ClassResponse::from(class)))
}

#[utoipa::path(
    put,
    path = "/clases/{id}",
    params(("id" = i64, Path, description = "Class ID")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = ClassResponse),
        (status = 400, description = "Empty or invalid patch", body = crate::dto::ErrorResponse),
        (status = 404, description = "Class not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Seats below confirmed bookings", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "classes"
)]
pub async fn update_class(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<UpdateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::CLASSES_EDIT)?;

    let class = state.db.class_repo().update_class(id, body.into()).await?;
    Ok(axum::Json(ClassResponse::from(class)))
}

#[utoipa::path(
    delete,
    path = "/clases/{id}",
    params(("id" = i64, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 404, description = "Class not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Class still has active bookings", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "classes"
)]
pub async fn delete_class(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::CLASSES_DELETE)?;

    state.db.class_repo().delete_class(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

async fn bookings_matching(
    state: &AppState,
    claims: &SessionClaims,
    filter: BookingFilter,
) -> Result<axum::Json<Vec<BookingResponse>>, ApiError> {
    claims.require(permissions::BOOKINGS_READ)?;

    let bookings = state.db.booking_repo().list_bookings(filter).await?;
    Ok(axum::Json(bookings.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/agendamientos/",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as pending", body = BookingResponse),
        (status = 400, description = "Invalid booking request", body = crate::dto::ErrorResponse),
        (status = 404, description = "Student not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Unknown class or duplicate booking", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    axum::Json(body): axum::Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::BOOKINGS_CREATE)?;

    let request = NewBooking::try_from(body)?;
    let booking = state.db.booking_repo().create_booking(request).await?;
    Ok((StatusCode::CREATED, axum::Json(BookingResponse::from(booking))))
}

#[utoipa::path(
    get,
    path = "/agendamientos/",
    responses((status = 200, description = "All bookings, newest first", body = Vec<BookingResponse>)),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<impl IntoResponse, ApiError> {
    bookings_matching(&state, &claims, BookingFilter::All).await
}

#[utoipa::path(
    get,
    path = "/agendamientos/{id}",
    params(("id" = i64, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 404, description = "Booking not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::BOOKINGS_READ)?;

    let booking = state
        .db
        .booking_repo()
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;
    Ok(axum::Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    get,
    path = "/agendamientos/estudiante/{id}",
    params(("id" = i64, Path, description = "Student user ID")),
    responses((status = 200, description = "Bookings of the student", body = Vec<BookingResponse>)),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn list_bookings_by_student(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    bookings_matching(&state, &claims, BookingFilter::Student(id)).await
}

#[utoipa::path(
    get,
    path = "/agendamientos/cedula/{cedula}",
    params(("cedula" = String, Path, description = "Student national id")),
    responses((status = 200, description = "Bookings of the student", body = Vec<BookingResponse>)),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn list_bookings_by_national_id(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(cedula): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    bookings_matching(&state, &claims, BookingFilter::StudentNationalId(cedula)).await
}

#[utoipa::path(
    get,
    path = "/agendamientos/clase/{id}",
    params(("id" = i64, Path, description = "Class ID")),
    responses((status = 200, description = "Bookings of the class", body = Vec<BookingResponse>)),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn list_bookings_by_class(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    bookings_matching(&state, &claims, BookingFilter::Class(id)).await
}

#[utoipa::path(
    get,
    path = "/agendamientos/estado/{state}",
    params(("state" = String, Path, description = "pending, confirmed or cancelled")),
    responses(
        (status = 200, description = "Bookings in the state", body = Vec<BookingResponse>),
        (status = 400, description = "Unknown state", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn list_bookings_by_state(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(raw_state): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_state: BookingState = raw_state
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;
    bookings_matching(&state, &claims, BookingFilter::State(booking_state)).await
}

#[utoipa::path(
    put,
    path = "/agendamientos/{id}",
    params(("id" = i64, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = 400, description = "Empty or invalid patch", body = crate::dto::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Transition not allowed or class full", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::BOOKINGS_EDIT)?;

    let patch = BookingPatch::try_from(body)?;
    let booking = state.db.booking_repo().update_booking(id, patch).await?;
    Ok(axum::Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    post,
    path = "/agendamientos/confirmar/{id}",
    params(("id" = i64, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking confirmed", body = BookingResponse),
        (status = 404, description = "Booking not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Class is full or booking is cancelled", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::BOOKINGS_CONFIRM)?;

    let booking = state.db.booking_repo().confirm_booking(id).await?;
    Ok(axum::Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    delete,
    path = "/agendamientos/{id}",
    params(("id" = i64, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 404, description = "Booking not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    claims.require(permissions::BOOKINGS_CANCEL)?;

    let booking = state.db.booking_repo().cancel_booking(id).await?;
    Ok(axum::Json(BookingResponse::from(booking)))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match state.db.health_check().await {
        Ok(()) => "ok",
        Err(_) => "error",
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
    };

    (status, axum::Json(response))
}
