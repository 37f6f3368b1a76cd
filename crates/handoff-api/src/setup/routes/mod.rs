//! Route configuration and setup.

mod health;

use crate::api_doc::ApiDoc;
use crate::constants::{API_PREFIX, HTTP_CONCURRENCY_LIMIT, MEDIA_ROUTE, OPENAPI_ROUTE};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use handoff_core::{Config, StorageBackend};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let mut app = Router::new()
        .merge(health_routes())
        .merge(session_routes())
        .merge(handoff_routes())
        .merge(upload_routes())
        .route(OPENAPI_ROUTE, get(|| async { Json(ApiDoc::openapi()) }));

    if config.storage_backend() == StorageBackend::Local {
        tracing::info!(
            path = %config.local_storage_path(),
            route = MEDIA_ROUTE,
            "Serving local media files"
        );
        app = app.nest_service(MEDIA_ROUTE, ServeDir::new(config.local_storage_path()));
    }

    let body_limit = config.max_request_body_bytes();
    tracing::info!(
        body_limit_mb = body_limit / 1024 / 1024,
        max_files = config.max_files_per_batch(),
        "Upload body limit configured"
    );

    let app = app
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/sessions", API_PREFIX),
            post(handlers::sessions::create_session),
        )
        .route(
            &format!("{}/sessions/{{token}}/status", API_PREFIX),
            get(handlers::sessions::session_status),
        )
        .route(
            &format!("{}/sessions/{{token}}/qr.svg", API_PREFIX),
            get(handlers::sessions::session_qr),
        )
}

fn handoff_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/handoff/{{token}}", API_PREFIX),
            get(handlers::handoff::resolve_handoff),
        )
        .route(
            &format!("{}/handoff/{{token}}/files", API_PREFIX),
            post(handlers::handoff::upload_to_handoff),
        )
}

fn upload_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/uploads", API_PREFIX),
        post(handlers::uploads::upload_batch),
    )
}
