//! Export endpoint.

use axum::{
    body::Body,
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::export::ExportFormat;
use crate::models::AnalysisResult;

/// Query params for export.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Export format (json, jsonl, csv, txt)
    #[serde(default)]
    pub format: ExportFormat,
}

/// Encode posted results as a download.
pub async fn export_results(
    Query(params): Query<ExportQuery>,
    Json(results): Json<Vec<AnalysisResult>>,
) -> Response {
    let encoded = match params.format.encode(&results) {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let disposition = format!("attachment; filename=\"{}\"", params.format.filename());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, params.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(encoded),
    )
        .into_response()
}
