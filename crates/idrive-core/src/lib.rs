pub mod auth;
pub mod booking;
pub mod class;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod password;
pub mod permissions;
pub mod token;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub mod testutil;

pub use auth::{AuthService, CreatedUser, LoginOutput, ResetTicket};
pub use booking::{
    Booking, BookingDetail, BookingFilter, BookingPatch, BookingState, NewBooking, PatchPlan,
    ReservationMethod, StudentRef,
};
pub use class::{Class, ClassPatch, NewClass};
pub use config::AuthConfig;
pub use error::AppError;
pub use ledger::{BookingLedger, ClassRegistry};
pub use models::{NewUser, Role, Room, User, UserPatch, UserStatus};
pub use token::SessionClaims;
pub use traits::CredentialStore;
