use axum::http::{StatusCode, header};
use chrono::{TimeDelta, Utc};
use serde_json::json;
use tower::ServiceExt;

use crate::integration::common::{
    ADMIN_EMAIL, INACTIVE_EMAIL, INSTRUCTOR_EMAIL, PASSWORD, STUDENT_EMAIL, TestApp, empty_request,
    first_room_id, json_request, login_request, setup_test_app,
    setup_test_app_exposing_reset_tokens,
};

async fn create_class(app: &TestApp, token: &str, total_seats: i32) -> i64 {
    let room_id = first_room_id(&app.db).await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/clases/",
            Some(token),
            json!({
                "name": "Manejo defensivo",
                "scheduled_at": (Utc::now() + TimeDelta::days(2)).to_rfc3339(),
                "instructor_id": app.instructor_id,
                "room_id": room_id,
                "total_seats": total_seats,
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let (status, body) = app.send(empty_request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn missing_token_returns_401_with_challenge() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/agendamientos/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn garbage_token_returns_401() {
    let app = setup_test_app().await;

    let (status, body) = app
        .send(empty_request("GET", "/clases/", Some("not-a-jwt")))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn login_returns_token_and_permissions() {
    let app = setup_test_app().await;

    let (status, body) = app.send(login_request(STUDENT_EMAIL, PASSWORD)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user_id"], app.student_id);
    assert_eq!(body["must_change_password"], false);
    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(permissions.contains(&"agendamientos:crear"));
    assert!(!permissions.contains(&"usuarios:crear"));
}

#[tokio::test]
async fn wrong_password_returns_401() {
    let app = setup_test_app().await;

    let (status, body) = app
        .send(login_request(ADMIN_EMAIL, "Incorrecta#99"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect email or password");

    let (status, _) = app
        .send(login_request("nobody@idrive.test", PASSWORD))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_account_returns_403() {
    let app = setup_test_app().await;

    let (status, body) = app.send(login_request(INACTIVE_EMAIL, PASSWORD)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn missing_permission_returns_403() {
    let app = setup_test_app().await;
    let token = app.login(STUDENT_EMAIL).await;

    let (status, body) = app
        .send(empty_request("GET", "/usuarios/", Some(&token)))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("usuarios:leer"));
}

#[tokio::test]
async fn reference_data_is_public() {
    let app = setup_test_app().await;

    let (status, roles) = app.send(empty_request("GET", "/roles/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roles.as_array().unwrap().len(), 3);

    let (status, rooms) = app.send(empty_request("GET", "/salones/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!rooms.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_booking_list_returns_empty_array() {
    let app = setup_test_app().await;
    let token = app.login(ADMIN_EMAIL).await;

    let (status, body) = app
        .send(empty_request("GET", "/agendamientos/", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let uri = format!("/agendamientos/estudiante/{}", app.student_id);
    let (status, body) = app.send(empty_request("GET", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn booking_flow_create_confirm_cancel() {
    let app = setup_test_app().await;
    let instructor = app.login(INSTRUCTOR_EMAIL).await;
    let student = app.login(STUDENT_EMAIL).await;
    let admin = app.login(ADMIN_EMAIL).await;

    let class_id = create_class(&app, &instructor, 1).await;

    let (status, booking) = app
        .send(json_request(
            "POST",
            "/agendamientos/",
            Some(&student),
            json!({ "national_id": "1000000003", "class_id": class_id, "method": "web" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    assert_eq!(booking["state"], "pending");
    assert_eq!(booking["student_id"], app.student_id);
    assert_eq!(booking["instructor_name"], "Carlos Instructor");
    let booking_id = booking["id"].as_i64().unwrap();

    // Students may not confirm.
    let uri = format!("/agendamientos/confirmar/{booking_id}");
    let (status, _) = app.send(empty_request("POST", &uri, Some(&student))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, confirmed) = app
        .send(empty_request("POST", &uri, Some(&instructor)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["state"], "confirmed");

    // Confirming again returns the same record.
    let (status, again) = app
        .send(empty_request("POST", &uri, Some(&instructor)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["confirmed_at"], confirmed["confirmed_at"]);

    let (status, available) = app
        .send(empty_request("GET", "/clases/disponibles", Some(&student)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        available
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["id"] != class_id)
    );

    let (status, by_state) = app
        .send(empty_request(
            "GET",
            "/agendamientos/estado/confirmed",
            Some(&admin),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_state.as_array().unwrap().len(), 1);

    let uri = format!("/agendamientos/{booking_id}");
    let (status, cancelled) = app
        .send(empty_request("DELETE", &uri, Some(&student)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["state"], "cancelled");

    let uri = format!("/clases/{class_id}");
    let (status, class) = app.send(empty_request("GET", &uri, Some(&student))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(class["seats_remaining"], 1);
}

#[tokio::test]
async fn create_booking_requires_exactly_one_student_reference() {
    let app = setup_test_app().await;
    let instructor = app.login(INSTRUCTOR_EMAIL).await;
    let admin = app.login(ADMIN_EMAIL).await;
    let class_id = create_class(&app, &instructor, 5).await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/agendamientos/",
            Some(&admin),
            json!({ "class_id": class_id }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn duplicate_booking_returns_409() {
    let app = setup_test_app().await;
    let instructor = app.login(INSTRUCTOR_EMAIL).await;
    let student = app.login(STUDENT_EMAIL).await;
    let class_id = create_class(&app, &instructor, 5).await;

    let body = json!({ "student_id": app.student_id, "class_id": class_id });
    let (status, _) = app
        .send(json_request("POST", "/agendamientos/", Some(&student), body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(json_request("POST", "/agendamientos/", Some(&student), body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn delete_class_with_active_booking_returns_409() {
    let app = setup_test_app().await;
    let instructor = app.login(INSTRUCTOR_EMAIL).await;
    let student = app.login(STUDENT_EMAIL).await;
    let admin = app.login(ADMIN_EMAIL).await;
    let class_id = create_class(&app, &instructor, 3).await;

    let (status, _) = app
        .send(json_request(
            "POST",
            "/agendamientos/",
            Some(&student),
            json!({ "student_id": app.student_id, "class_id": class_id }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/clases/{class_id}");
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let empty_class = create_class(&app, &instructor, 3).await;
    let uri = format!("/clases/{empty_class}");
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(empty_request("GET", &uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_user_returns_temporary_password() {
    let app = setup_test_app().await;
    let admin = app.login(ADMIN_EMAIL).await;

    let (status, created) = app
        .send(json_request(
            "POST",
            "/usuarios/",
            Some(&admin),
            json!({
                "name": "Sofía Gómez",
                "email": "sofia@idrive.test",
                "phone": "3109876543",
                "national_id": "52123456",
                "role_id": 3,
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["must_change_password"], true);
    let temporary = created["temporary_password"].as_str().unwrap().to_string();

    let (status, login) = app
        .send(login_request("sofia@idrive.test", &temporary))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["must_change_password"], true);
    let token = login["access_token"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(json_request(
            "PUT",
            "/usuarios/cambiar-password",
            Some(&token),
            json!({ "new_password": "NuevaClave9" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, login) = app
        .send(login_request("sofia@idrive.test", "NuevaClave9"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["must_change_password"], false);
}

#[tokio::test]
async fn update_user_deactivates_account() {
    let app = setup_test_app().await;
    let admin = app.login(ADMIN_EMAIL).await;

    let uri = format!("/usuarios/{}", app.student_id);
    let (status, user) = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&admin),
            json!({ "status": "inactive" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["status"], "inactive");

    let (status, _) = app.send(login_request(STUDENT_EMAIL, PASSWORD)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(json_request("PUT", &uri, Some(&admin), json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = setup_test_app_exposing_reset_tokens().await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/usuarios/solicitar-reseteo",
            None,
            json!({ "email": STUDENT_EMAIL }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["reset_token"].as_str().unwrap().to_string();

    let reset = json!({ "token": token, "new_password": "Recuperada7" });
    let (status, _) = app
        .send(json_request(
            "POST",
            "/usuarios/reseteo-password",
            None,
            reset.clone(),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Tokens are single use.
    let (status, _) = app
        .send(json_request("POST", "/usuarios/reseteo-password", None, reset))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(login_request(STUDENT_EMAIL, "Recuperada7")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reset_request_hides_token_by_default() {
    let app = setup_test_app().await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/usuarios/solicitar-reseteo",
            None,
            json!({ "email": STUDENT_EMAIL }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("reset_token").is_none());

    let (status, unknown) = app
        .send(json_request(
            "POST",
            "/usuarios/solicitar-reseteo",
            None,
            json!({ "email": "ghost@idrive.test" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown["message"], body["message"]);
}
