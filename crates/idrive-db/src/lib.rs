pub mod booking_repository;
pub mod class_repository;
pub mod config;
pub mod database;
mod error;
pub mod reference_repository;
pub mod user_repository;

pub use booking_repository::BookingRepository;
pub use class_repository::ClassRepository;
pub use config::DatabaseConfig;
pub use database::Database;
pub use reference_repository::ReferenceRepository;
pub use user_repository::UserRepository;
