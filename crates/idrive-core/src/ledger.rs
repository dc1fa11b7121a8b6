use std::future::Future;

use chrono::{DateTime, Utc};

use crate::booking::{BookingDetail, BookingFilter, BookingPatch, NewBooking};
use crate::class::{Class, ClassPatch, NewClass};
use crate::error::AppError;

/// Persistent booking ledger.
///
/// Implementations must run every mutation in one transaction and take a
/// row lock on the class (`SELECT ... FOR UPDATE` or equivalent) before
/// reading the confirmed count, so that concurrent confirmations cannot
/// push a class past its capacity.
pub trait BookingLedger: Send + Sync + Clone {
    /// Book a student into a class in the `pending` state.
    ///
    /// Fails `NotFound` for an unknown student and `Conflict` for an unknown
    /// class or an existing active booking of the same pair.
    fn create_booking(
        &self,
        request: NewBooking,
    ) -> impl Future<Output = Result<BookingDetail, AppError>> + Send;

    /// Confirm a booking if the class still has a free seat.
    ///
    /// Confirming an already confirmed booking returns it unchanged.
    fn confirm_booking(
        &self,
        booking_id: i64,
    ) -> impl Future<Output = Result<BookingDetail, AppError>> + Send;

    /// Soft-cancel a booking. Cancelling twice is a no-op.
    fn cancel_booking(
        &self,
        booking_id: i64,
    ) -> impl Future<Output = Result<BookingDetail, AppError>> + Send;

    fn update_booking(
        &self,
        booking_id: i64,
        patch: BookingPatch,
    ) -> impl Future<Output = Result<BookingDetail, AppError>> + Send;

    fn get_booking(
        &self,
        booking_id: i64,
    ) -> impl Future<Output = Result<Option<BookingDetail>, AppError>> + Send;

    /// List bookings, newest first. No match yields an empty list.
    fn list_bookings(
        &self,
        filter: BookingFilter,
    ) -> impl Future<Output = Result<Vec<BookingDetail>, AppError>> + Send;

    fn confirmed_count(
        &self,
        class_id: i64,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// Persistent class registry.
pub trait ClassRegistry: Send + Sync + Clone {
    fn create_class(
        &self,
        request: NewClass,
    ) -> impl Future<Output = Result<Class, AppError>> + Send;

    fn get_class(
        &self,
        class_id: i64,
    ) -> impl Future<Output = Result<Option<Class>, AppError>> + Send;

    fn list_classes(&self) -> impl Future<Output = Result<Vec<Class>, AppError>> + Send;

    /// Classes scheduled after `now` that still have at least one free seat.
    fn list_available_classes(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Class>, AppError>> + Send;

    /// Apply a patch. Lowering `total_seats` below the confirmed count fails `Conflict`.
    fn update_class(
        &self,
        class_id: i64,
        patch: ClassPatch,
    ) -> impl Future<Output = Result<Class, AppError>> + Send;

    /// Delete a class. Fails `Conflict` while active bookings reference it.
    fn delete_class(&self, class_id: i64) -> impl Future<Output = Result<(), AppError>> + Send;
}
