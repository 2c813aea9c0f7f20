//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Analysis
        .route("/api/analyze", post(handlers::analyze_texts))
        .route("/api/analyze/single", post(handlers::analyze_single))
        .route("/api/analyze/batch", post(handlers::analyze_batch))
        // Export
        .route("/api/export", post(handlers::export_results))
        // Status
        .route("/api/status", get(handlers::api_status))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
