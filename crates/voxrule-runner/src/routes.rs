//! Router setup and server startup for the runner.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use voxrule_core::config::RunnerConfig;
use voxrule_core::VoxruleError;

use crate::handlers;
use crate::state::RunnerState;

/// Environment variable that overrides the configured port.
pub const PORT_ENV: &str = "REMOTE_EXECUTOR_PORT";

pub fn create_router(state: RunnerState) -> Router {
    // Callers are other hosts on the network, not a browser dashboard.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/execute", post(handlers::execute))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `REMOTE_EXECUTOR_PORT` wins over the configured port. An unparsable
/// value is ignored.
pub fn resolve_port(env_value: Option<&str>, configured: u16) -> u16 {
    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                tracing::warn!(value = raw, "Ignoring invalid {}", PORT_ENV);
                configured
            }
        },
        None => configured,
    }
}

/// Serve until `shutdown` resolves.
pub async fn start_server<F>(config: &RunnerConfig, shutdown: F) -> Result<(), VoxruleError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let env_port = std::env::var(PORT_ENV).ok();
    let port = resolve_port(env_port.as_deref(), config.port);
    let addr = format!("{}:{}", config.host, port);

    let router = create_router(RunnerState::new(config.clone()));

    tracing::info!("Starting runner on {}", addr);
    tracing::info!("Execute endpoint: http://{}/execute", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VoxruleError::Runner(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| VoxruleError::Runner(format!("Server error: {}", e)))?;

    Ok(())
}
