use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use http_body_util::BodyExt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tower::ServiceExt;

use idrive_core::AuthConfig;
use idrive_core::password::hash_password;
use idrive_core::permissions::{ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_STUDENT};
use idrive_db::Database;
use idrive_server::routes;
use idrive_server::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "Segura#2024";

pub const ADMIN_EMAIL: &str = "admin@idrive.test";
pub const INSTRUCTOR_EMAIL: &str = "instructor@idrive.test";
pub const STUDENT_EMAIL: &str = "student@idrive.test";
pub const INACTIVE_EMAIL: &str = "inactive@idrive.test";

/// A running API backed by a throwaway PostgreSQL container.
///
/// Keep the value alive for the whole test; dropping `_container` stops the database.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub admin_id: i64,
    pub instructor_id: i64,
    pub student_id: i64,
    _container: ContainerAsync<GenericImage>,
}

pub async fn setup_test_app() -> TestApp {
    setup(false).await
}

/// Same as [`setup_test_app`] but reset tokens are echoed in API responses.
pub async fn setup_test_app_exposing_reset_tokens() -> TestApp {
    setup(true).await
}

async fn setup(expose_reset_tokens: bool) -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "idrive_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/idrive_test");
    let pool = retry_connect(&url).await;

    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");

    let admin_id = seed_user(db.pool(), "Admin", ADMIN_EMAIL, "1000000001", ROLE_ADMIN, "active").await;
    let instructor_id = seed_user(
        db.pool(),
        "Carlos Instructor",
        INSTRUCTOR_EMAIL,
        "1000000002",
        ROLE_INSTRUCTOR,
        "active",
    )
    .await;
    let student_id = seed_user(
        db.pool(),
        "Laura Estudiante",
        STUDENT_EMAIL,
        "1000000003",
        ROLE_STUDENT,
        "active",
    )
    .await;
    seed_user(
        db.pool(),
        "Pedro Inactivo",
        INACTIVE_EMAIL,
        "1000000004",
        ROLE_STUDENT,
        "inactive",
    )
    .await;

    let state = Arc::new(AppState::new(
        db.clone(),
        AuthConfig::new(TEST_SECRET),
        expose_reset_tokens,
    ));

    TestApp {
        router: routes::router(state),
        db,
        admin_id,
        instructor_id,
        student_id,
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}

async fn seed_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    national_id: &str,
    role_id: i64,
    status: &str,
) -> i64 {
    let hash = hash_password(PASSWORD).expect("Failed to hash password");
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (name, email, phone, national_id, password_hash, role_id, status)
        VALUES ($1, $2, '3001234567', $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(national_id)
    .bind(hash)
    .bind(role_id)
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("Failed to seed user")
}

pub async fn first_room_id(db: &Database) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT id FROM rooms ORDER BY id LIMIT 1")
        .fetch_one(db.pool())
        .await
        .expect("Seeded room missing")
}

impl TestApp {
    /// Send a request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> (axum::http::StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    /// Log in through the API and return the access token.
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self.send(login_request(email, PASSWORD)).await;
        assert!(status.is_success(), "login failed for {email}: {body}");
        body["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }
}

pub fn login_request(email: &str, password: &str) -> Request<Body> {
    let form = format!(
        "username={}&password={}",
        urlencode(email),
        urlencode(password)
    );
    Request::post("/usuarios/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap()
}

fn urlencode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
