use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use idrive_core::AuthConfig;
use idrive_db::{Database, DatabaseConfig};
use idrive_server::config::ServerConfig;
use idrive_server::routes;
use idrive_server::state::AppState;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("idrive=info".parse()?))
        .with_target(false)
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let auth_config = AuthConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    let addr = format!("0.0.0.0:{}", server_config.port);

    let db = Database::connect(&db_config).await?;
    db.migrate().await?;

    if server_config.expose_reset_tokens {
        tracing::warn!("Password reset tokens are returned in API responses");
    }

    let state = Arc::new(AppState::new(
        db.clone(),
        auth_config,
        server_config.expose_reset_tokens,
    ));

    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(server_config.cors_layer()?)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
