//! Router setup and server startup for the admin API.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use voxrule_core::VoxruleError;

use crate::handlers;
use crate::state::AppState;

/// Environment variable that overrides every other port source.
pub const PORT_ENV: &str = "VOXRULE_PORT";

fn local_origins(port: u16) -> Vec<HeaderValue> {
    ["127.0.0.1", "localhost"]
        .iter()
        .filter_map(|host| format!("http://{}:{}", host, port).parse().ok())
        .collect()
}

/// Build the router. Everything except `/health` requires the bearer token.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(local_origins(state.port)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let public_routes = Router::new().route("/health", get(handlers::health));

    let protected_routes = Router::new()
        .route(
            "/api/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route(
            "/api/rules/{id}",
            get(handlers::get_rule)
                .put(handlers::update_rule)
                .delete(handlers::delete_rule),
        )
        .route("/api/rules/{id}/enabled", post(handlers::set_rule_enabled))
        .route(
            "/api/settings",
            get(handlers::get_settings).post(handlers::save_settings),
        )
        .route("/api/reload", post(handlers::reload))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `VOXRULE_PORT` > `--port` > configured port. Unparsable env values are
/// ignored.
pub fn resolve_port(env_value: Option<&str>, cli: Option<u16>, configured: u16) -> u16 {
    let from_env = env_value.and_then(|raw| match raw.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!(value = raw, "Ignoring invalid {}", PORT_ENV);
            None
        }
    });
    from_env.or(cli).unwrap_or(configured)
}

/// Serve until `shutdown` resolves.
pub async fn start_server<F>(host: &str, state: AppState, shutdown: F) -> Result<(), VoxruleError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", host, state.port);
    let router = create_router(state);

    tracing::info!("Starting admin API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VoxruleError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| VoxruleError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
