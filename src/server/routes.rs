//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Room for multipart framing and form fields on top of the file itself.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/extract", post(handlers::extract))
        .route("/api/export", post(handlers::export_report))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
