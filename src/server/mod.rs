//! JSON API for the sentiment dashboard.
//!
//! Exposes single, batch and dashboard analysis plus result export. The server
//! keeps no state between requests; each analysis run is independent.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::analysis::SentimentService;
use crate::llm::LlmConfig;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SentimentService>,
    /// Provider display name for status output.
    pub provider: String,
    /// Model identifier for status output.
    pub model: String,
}

impl AppState {
    pub fn new(service: SentimentService, llm: &LlmConfig) -> Self {
        Self {
            service: Arc::new(service),
            provider: llm.provider_name().to_string(),
            model: llm.model().to_string(),
        }
    }
}

/// Start the web server.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = bind.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
