//! Analysis endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use crate::analysis::AnalysisError;
use crate::models::SentimentDistribution;

/// Body for single-text analysis.
#[derive(Debug, Deserialize)]
pub struct SingleRequest {
    pub text: String,
}

/// Body for multi-text analysis.
#[derive(Debug, Deserialize)]
pub struct TextsRequest {
    pub texts: Vec<String>,
}

/// Map an analysis error to a JSON error response without backend payloads.
fn error_response(err: &AnalysisError) -> Response {
    let status = if err.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };

    (
        status,
        Json(serde_json::json!({
            "error": err.category(),
            "message": err.user_message(),
        })),
    )
        .into_response()
}

/// Dashboard analysis: ids, verbatim texts, and the distribution summary.
pub async fn analyze_texts(
    State(state): State<AppState>,
    Json(body): Json<TextsRequest>,
) -> impl IntoResponse {
    match state.service.analyze_texts(&body.texts, None).await {
        Ok(run) => {
            let distribution = SentimentDistribution::from_results(&run.results);
            Json(serde_json::json!({
                "run_id": run.id,
                "started_at": run.started_at,
                "results": run.results,
                "distribution": distribution,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::warn!("Analysis failed: {}", e);
            error_response(&e)
        }
    }
}

/// Analyze one text.
pub async fn analyze_single(
    State(state): State<AppState>,
    Json(body): Json<SingleRequest>,
) -> impl IntoResponse {
    match state.service.analyze_single_text(&body.text).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => {
            tracing::warn!("Single analysis failed: {}", e);
            error_response(&e)
        }
    }
}

/// Analyze several texts; results are in input order.
pub async fn analyze_batch(
    State(state): State<AppState>,
    Json(body): Json<TextsRequest>,
) -> impl IntoResponse {
    match state.service.analyze_multiple_texts(&body.texts).await {
        Ok(results) => Json(results).into_response(),
        Err(e) => {
            tracing::warn!("Batch analysis failed: {}", e);
            error_response(&e)
        }
    }
}
