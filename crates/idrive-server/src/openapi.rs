use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "iDrive API",
        version = "0.1.0",
        description = "Class scheduling and seat booking for a driving school."
    ),
    paths(
        crate::routes::login,
        crate::routes::change_password,
        crate::routes::request_password_reset,
        crate::routes::reset_password,
        crate::routes::create_user,
        crate::routes::list_users,
        crate::routes::get_user,
        crate::routes::update_user,
        crate::routes::delete_user,
        crate::routes::list_roles,
        crate::routes::list_rooms,
        crate::routes::create_class,
        crate::routes::list_classes,
        crate::routes::list_available_classes,
        crate::routes::get_class,
        crate::routes::update_class,
        crate::routes::delete_class,
        crate::routes::create_booking,
        crate::routes::list_bookings,
        crate::routes::get_booking,
        crate::routes::list_bookings_by_student,
        crate::routes::list_bookings_by_national_id,
        crate::routes::list_bookings_by_class,
        crate::routes::list_bookings_by_state,
        crate::routes::update_booking,
        crate::routes::confirm_booking,
        crate::routes::cancel_booking,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::LoginForm,
        crate::dto::LoginResponse,
        crate::dto::ChangePasswordRequest,
        crate::dto::PasswordResetRequest,
        crate::dto::PasswordResetRequestResponse,
        crate::dto::ResetPasswordRequest,
        crate::dto::MessageResponse,
        crate::dto::CreateUserRequest,
        crate::dto::UpdateUserRequest,
        crate::dto::UserResponse,
        crate::dto::CreatedUserResponse,
        crate::dto::RoleResponse,
        crate::dto::RoomResponse,
        crate::dto::CreateClassRequest,
        crate::dto::UpdateClassRequest,
        crate::dto::ClassResponse,
        crate::dto::CreateBookingRequest,
        crate::dto::UpdateBookingRequest,
        crate::dto::BookingResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "session", description = "Login and password management"),
        (name = "users", description = "User administration"),
        (name = "reference", description = "Roles and rooms"),
        (name = "classes", description = "Class scheduling"),
        (name = "bookings", description = "Seat bookings"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the Bearer session token scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from POST /usuarios/login."))
                        .build(),
                ),
            );
        }
    }
}
