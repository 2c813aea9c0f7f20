//! LLM client for JSON-constrained completions.
//!
//! Supports Ollama (local), OpenAI-compatible APIs (OpenAI, Groq, Together.ai)
//! and Google Gemini. Every call asks the provider for JSON output; callers get
//! either the raw JSON text or a deserialized value.

mod config;
pub mod prompts;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use config::{LlmAppConfig, LlmConfig, LlmDeviceConfig, LlmProvider};

/// Base delay for retry backoff.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to LLM service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    /// Provider rate limited the request
    #[error("Rate limited by {provider}")]
    RateLimited {
        provider: &'static str,
        retry_after_secs: Option<u64>,
    },
    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
    /// Hosted provider configured without a key
    #[error("API key missing for {0}")]
    MissingApiKey(&'static str),
    /// LLM is disabled
    #[error("LLM is disabled")]
    Disabled,
}

impl LlmError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Connection(_) | LlmError::RateLimited { .. } => true,
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// OpenAI chat completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Gemini generateContent request format.
#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiApiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

/// LLM client for sentiment prompts.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.app.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is available.
    pub async fn is_available(&self) -> bool {
        if !self.config.enabled() {
            return false;
        }
        if self.config.device.requires_api_key() && self.config.api_key().is_none() {
            return false;
        }
        self.list_models().await.is_ok()
    }

    /// List available models.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        #[derive(Deserialize)]
        struct OllamaTags {
            models: Vec<NamedModel>,
        }

        #[derive(Deserialize)]
        struct NamedModel {
            name: String,
        }

        #[derive(Deserialize)]
        struct OpenAiModels {
            data: Vec<OpenAiModel>,
        }

        #[derive(Deserialize)]
        struct OpenAiModel {
            id: String,
        }

        let endpoint = self.endpoint();
        match self.config.provider() {
            LlmProvider::Ollama => {
                let request = self.client.get(format!("{}/api/tags", endpoint));
                let tags: OllamaTags = self.send_json(request).await?;
                Ok(tags.models.into_iter().map(|m| m.name).collect())
            }
            LlmProvider::OpenAI => {
                let request = self
                    .client
                    .get(format!("{}/v1/models", endpoint))
                    .bearer_auth(self.require_api_key()?);
                let models: OpenAiModels = self.send_json(request).await?;
                Ok(models.data.into_iter().map(|m| m.id).collect())
            }
            LlmProvider::Gemini => {
                let request = self
                    .client
                    .get(format!("{}/v1beta/models", endpoint))
                    .header("x-goog-api-key", self.require_api_key()?);
                let models: OllamaTags = self.send_json(request).await?;
                Ok(models
                    .models
                    .into_iter()
                    .map(|m| m.name.trim_start_matches("models/").to_string())
                    .collect())
            }
        }
    }

    /// Complete a prompt and deserialize the JSON response.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        let raw = self.complete_json(prompt).await?;
        let json = extract_json(&raw)
            .ok_or_else(|| LlmError::Parse("Response contained no JSON object".to_string()))?;
        serde_json::from_str(json).map_err(|e| LlmError::Parse(e.to_string()))
    }

    /// Complete a prompt in JSON mode, retrying transient failures.
    pub async fn complete_json(&self, prompt: &str) -> Result<String, LlmError> {
        if !self.config.enabled() {
            return Err(LlmError::Disabled);
        }

        let max_retries = self.config.app.max_retries;
        let mut attempt = 0;
        loop {
            let result = match self.config.provider() {
                LlmProvider::Ollama => self.call_ollama(prompt).await,
                LlmProvider::OpenAI => self.call_openai(prompt).await,
                LlmProvider::Gemini => self.call_gemini(prompt).await,
            };

            match result {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = retry_delay(&e, attempt);
                    warn!(
                        "{} call failed ({}), retrying in {:?} ({}/{})",
                        self.config.provider_name(),
                        e,
                        delay,
                        attempt + 1,
                        max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn endpoint(&self) -> &str {
        self.config.endpoint().trim_end_matches('/')
    }

    fn require_api_key(&self) -> Result<&str, LlmError> {
        self.config
            .api_key()
            .ok_or(LlmError::MissingApiKey(self.config.provider_name()))
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: self.config.model(),
            prompt,
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.config.app.temperature,
                num_predict: self.config.app.max_tokens,
            },
        };

        debug!("Ollama generate (model: {})", self.config.model());
        let builder = self
            .client
            .post(format!("{}/api/generate", self.endpoint()))
            .json(&request);
        let resp: OllamaResponse = self.send_json(builder).await?;
        Ok(resp.response)
    }

    /// Call an OpenAI-compatible chat completions API.
    async fn call_openai(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.app.temperature,
            max_tokens: self.config.app.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(
            "{} chat completion (model: {})",
            self.config.provider_name(),
            self.config.model()
        );
        let builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint()))
            .bearer_auth(self.require_api_key()?)
            .json(&request);
        let resp: ChatResponse = self.send_json(builder).await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))
    }

    /// Call the Gemini generateContent API.
    async fn call_gemini(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.app.temperature,
                max_output_tokens: self.config.app.max_tokens,
                response_mime_type: "application/json",
            },
        };

        debug!("Gemini generateContent (model: {})", self.config.model());
        let builder = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.endpoint(),
                self.config.model()
            ))
            .header("x-goog-api-key", self.require_api_key()?)
            .json(&request);
        let resp: GeminiResponse = self.send_json(builder).await?;

        if let Some(error) = resp.error {
            return Err(LlmError::Parse(format!("Gemini error: {}", error.message)));
        }

        resp.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| LlmError::Parse("No candidates in response".to_string()))
    }

    /// Send a request and decode a JSON body, mapping HTTP failures to `LlmError`.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, LlmError> {
        let resp = request
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(LlmError::RateLimited {
                provider: self.config.provider_name(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        resp.json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }
}

/// Backoff delay for a retry, honoring Retry-After when present.
fn retry_delay(error: &LlmError, attempt: u32) -> Duration {
    if let LlmError::RateLimited {
        retry_after_secs: Some(secs),
        ..
    } = error
    {
        return Duration::from_secs(*secs);
    }
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt)
}

/// Extract the JSON object from a model response.
///
/// Models in JSON mode usually return a bare object, but some still wrap it in
/// a ```json fence or add a sentence before it.
fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
        assert_eq!(
            extract_json("```json\n{\"drivers\": []}\n```"),
            Some("{\"drivers\": []}")
        );
        assert_eq!(
            extract_json("Here you go: {\"x\": {\"y\": 2}} hope it helps"),
            Some("{\"x\": {\"y\": 2}}")
        );
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LlmError::Connection("reset".into()).is_retryable());
        assert!(LlmError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!LlmError::Api {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!LlmError::Parse("bad".into()).is_retryable());
        assert!(LlmError::RateLimited {
            provider: "Gemini",
            retry_after_secs: None
        }
        .is_retryable());
    }

    #[test]
    fn test_retry_delay() {
        let limited = LlmError::RateLimited {
            provider: "Groq",
            retry_after_secs: Some(7),
        };
        assert_eq!(retry_delay(&limited, 0), Duration::from_secs(7));

        let conn = LlmError::Connection("x".into());
        assert_eq!(retry_delay(&conn, 0), Duration::from_millis(500));
        assert_eq!(retry_delay(&conn, 2), Duration::from_millis(2000));
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: "hi" }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.2,
                max_output_tokens: 100,
                response_mime_type: "application/json",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 100);
    }

    #[test]
    fn test_openai_request_uses_json_mode() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.2,
            max_tokens: 10,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_disabled_client_refuses() {
        let mut config = LlmConfig::default();
        config.app.enabled = false;
        let client = LlmClient::new(config).unwrap();

        assert!(!client.is_available().await);
        assert!(matches!(
            client.complete_json("{}").await,
            Err(LlmError::Disabled)
        ));
    }
}
