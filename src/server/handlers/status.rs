//! Status endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::super::AppState;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Backend and batching configuration.
pub async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "provider": state.provider,
        "model": state.model,
        "backend": state.service.backend_name(),
        "pipeline": state.service.mode(),
        "round_trips_per_text": state.service.mode().round_trips(),
        "chunk_size": state.service.chunk_size(),
        "max_concurrent_chunks": state.service.max_concurrent_chunks(),
    }))
}
