//! `SentimentBackend` backed by an LLM completion API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::backend::{
    AnalyzeRequest, AnalyzeResponse, BatchRequest, BatchResponse, ClassifyRequest,
    ClassifyResponse, DriversRequest, DriversResponse, ExplainRequest, ExplainResponse,
    SentimentBackend,
};
use super::error::BackendError;
use crate::llm::{prompts, LlmClient, LlmError};

/// Sentiment backend that prompts an LLM for JSON responses.
pub struct LlmSentimentBackend {
    client: LlmClient,
    name: String,
}

impl LlmSentimentBackend {
    pub fn new(client: LlmClient) -> Self {
        let name = format!(
            "{}:{}",
            client.config().provider_name(),
            client.config().model()
        );
        Self { client, name }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    async fn ask<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, BackendError> {
        self.client.generate_json(prompt).await.map_err(|e| match e {
            LlmError::Parse(msg) => BackendError::Malformed(msg),
            other => BackendError::Llm(other),
        })
    }
}

/// Fill `{text}` last so placeholders inside the user's text are left alone.
fn render(template: &str, text: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out.replace("{text}", text)
}

#[async_trait]
impl SentimentBackend for LlmSentimentBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, BackendError> {
        let prompt = render(
            self.client.config().app.get_classify_prompt(),
            &request.text,
            &[],
        );
        self.ask(&prompt).await
    }

    async fn extract_drivers(
        &self,
        request: &DriversRequest,
    ) -> Result<DriversResponse, BackendError> {
        let prompt = render(
            self.client.config().app.get_drivers_prompt(),
            &request.text,
            &[("sentiment", request.sentiment.as_str())],
        );
        self.ask(&prompt).await
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<ExplainResponse, BackendError> {
        let keywords = prompts::render_keywords(&request.keywords);
        let prompt = render(
            self.client.config().app.get_explain_prompt(),
            &request.text,
            &[("keywords", keywords.as_str())],
        );
        self.ask(&prompt).await
    }

    async fn analyze_one(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError> {
        let prompt = render(
            self.client.config().app.get_analyze_prompt(),
            &request.text,
            &[],
        );
        self.ask(&prompt).await
    }

    async fn analyze_batch(&self, request: &BatchRequest) -> Result<BatchResponse, BackendError> {
        debug!("Batch prompt for {} texts", request.texts.len());
        let prompt = self
            .client
            .config()
            .app
            .get_batch_prompt()
            .replace("{texts}", &prompts::render_text_list(&request.texts));
        self.ask(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmConfig;

    #[test]
    fn test_render_fills_text_last() {
        let out = render(
            "Sentiment {sentiment} for: {text}",
            "literal {sentiment} here",
            &[("sentiment", "positive")],
        );
        assert_eq!(out, "Sentiment positive for: literal {sentiment} here");
    }

    #[test]
    fn test_backend_name_includes_model() {
        let mut config = LlmConfig::default();
        config.set_model("test-model".to_string());
        let backend = LlmSentimentBackend::new(LlmClient::new(config).unwrap());
        assert!(backend.name().ends_with(":test-model"));
    }

    #[tokio::test]
    async fn test_disabled_llm_surfaces_as_backend_error() {
        let mut config = LlmConfig::default();
        config.app.enabled = false;
        let backend = LlmSentimentBackend::new(LlmClient::new(config).unwrap());

        let err = backend
            .classify(&ClassifyRequest {
                text: "hello".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Llm(LlmError::Disabled)));
    }
}
