use chrono::{TimeDelta, Utc};
use idrive_core::AppError;
use idrive_core::booking::{NewBooking, StudentRef};
use idrive_core::class::{ClassPatch, NewClass};
use idrive_core::ledger::{BookingLedger, ClassRegistry};
use idrive_core::permissions::{ROLE_INSTRUCTOR, ROLE_STUDENT};

use crate::integration::common::{create_class, first_room_id, insert_user, setup_test_db};

#[tokio::test]
async fn create_class_defaults_duration_and_full_seats() {
    let (db, _container) = setup_test_db().await;
    let instructor = insert_user(db.pool(), "Carlos Instructor", "900100", ROLE_INSTRUCTOR).await;
    let class_id = create_class(&db, instructor, 4).await;

    let class = db.class_repo().get_class(class_id).await.unwrap().unwrap();
    assert_eq!(class.total_seats, 4);
    assert_eq!(class.seats_remaining, 4);
    assert_eq!(class.duration_minutes, 60);
}

#[tokio::test]
async fn create_class_rejects_bad_input_and_unknown_references() {
    let (db, _container) = setup_test_db().await;
    let instructor = insert_user(db.pool(), "Carlos Instructor", "900100", ROLE_INSTRUCTOR).await;
    let room_id = first_room_id(db.pool()).await;
    let registry = db.class_repo();

    let base = NewClass {
        name: "Mecánica básica".to_string(),
        description: None,
        scheduled_at: Utc::now() + TimeDelta::days(2),
        instructor_id: instructor,
        room_id,
        total_seats: 5,
        duration_minutes: Some(90),
    };

    let err = registry
        .create_class(NewClass {
            total_seats: 0,
            ..base.clone()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = registry
        .create_class(NewClass {
            room_id: 9_999,
            ..base.clone()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = registry
        .create_class(NewClass {
            instructor_id: 9_999,
            ..base.clone()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let class = registry.create_class(base).await.unwrap();
    assert_eq!(class.duration_minutes, 90);
}

#[tokio::test]
async fn list_classes_is_empty_then_newest_first() {
    let (db, _container) = setup_test_db().await;
    let registry = db.class_repo();
    assert!(registry.list_classes().await.unwrap().is_empty());

    let instructor = insert_user(db.pool(), "Carlos Instructor", "900100", ROLE_INSTRUCTOR).await;
    let room_id = first_room_id(db.pool()).await;
    for days in [1, 5, 3] {
        registry
            .create_class(NewClass {
                name: format!("Clase día {days}"),
                description: None,
                scheduled_at: Utc::now() + TimeDelta::days(days),
                instructor_id: instructor,
                room_id,
                total_seats: 2,
                duration_minutes: None,
            })
            .await
            .unwrap();
    }

    let names: Vec<_> = registry
        .list_classes()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Clase día 5", "Clase día 3", "Clase día 1"]);
}

#[tokio::test]
async fn available_classes_exclude_full_and_past() {
    let (db, _container) = setup_test_db().await;
    let instructor = insert_user(db.pool(), "Carlos Instructor", "900100", ROLE_INSTRUCTOR).await;
    let student = insert_user(db.pool(), "Ana Estudiante", "100200", ROLE_STUDENT).await;
    let room_id = first_room_id(db.pool()).await;
    let registry = db.class_repo();
    let ledger = db.booking_repo();

    let open = create_class(&db, instructor, 2).await;
    let full = create_class(&db, instructor, 1).await;
    registry
        .create_class(NewClass {
            name: "Clase pasada".to_string(),
            description: None,
            scheduled_at: Utc::now() - TimeDelta::days(1),
            instructor_id: instructor,
            room_id,
            total_seats: 5,
            duration_minutes: None,
        })
        .await
        .unwrap();

    let booking = ledger
        .create_booking(NewBooking::new(StudentRef::Id(student), full))
        .await
        .unwrap();
    ledger.confirm_booking(booking.booking.id).await.unwrap();

    let available = registry.list_available_classes(Utc::now()).await.unwrap();
    let ids: Vec<_> = available.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![open]);
}

#[tokio::test]
async fn update_class_applies_patch_and_guards_capacity() {
    let (db, _container) = setup_test_db().await;
    let instructor = insert_user(db.pool(), "Carlos Instructor", "900100", ROLE_INSTRUCTOR).await;
    let ana = insert_user(db.pool(), "Ana Estudiante", "100200", ROLE_STUDENT).await;
    let luis = insert_user(db.pool(), "Luis Estudiante", "100300", ROLE_STUDENT).await;
    let class_id = create_class(&db, instructor, 3).await;
    let registry = db.class_repo();
    let ledger = db.booking_repo();

    for student in [ana, luis] {
        let b = ledger
            .create_booking(NewBooking::new(StudentRef::Id(student), class_id))
            .await
            .unwrap();
        ledger.confirm_booking(b.booking.id).await.unwrap();
    }

    let err = registry
        .update_class(
            class_id,
            ClassPatch {
                total_seats: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let updated = registry
        .update_class(
            class_id,
            ClassPatch {
                name: Some("Teoría avanzada".to_string()),
                total_seats: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Teoría avanzada");
    assert_eq!(updated.total_seats, 2);
    assert_eq!(updated.seats_remaining, 0);
    assert_eq!(updated.description.as_deref(), Some("Normas básicas"));

    let err = registry
        .update_class(class_id, ClassPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = registry
        .update_class(
            424_242,
            ClassPatch {
                duration_minutes: Some(45),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_class_blocked_by_active_bookings() {
    let (db, _container) = setup_test_db().await;
    let instructor = insert_user(db.pool(), "Carlos Instructor", "900100", ROLE_INSTRUCTOR).await;
    let student = insert_user(db.pool(), "Ana Estudiante", "100200", ROLE_STUDENT).await;
    let class_id = create_class(&db, instructor, 3).await;
    let registry = db.class_repo();
    let ledger = db.booking_repo();

    let booking = ledger
        .create_booking(NewBooking::new(StudentRef::Id(student), class_id))
        .await
        .unwrap();

    let err = registry.delete_class(class_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg.contains("1 active")));

    ledger.cancel_booking(booking.booking.id).await.unwrap();
    registry.delete_class(class_id).await.unwrap();

    assert!(registry.get_class(class_id).await.unwrap().is_none());
    assert!(ledger.get_booking(booking.booking.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_missing_class_is_not_found() {
    let (db, _container) = setup_test_db().await;
    let err = db.class_repo().delete_class(12345).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
