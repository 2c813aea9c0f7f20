//! LLM client configuration.
//!
//! Split into two tiers:
//! - `LlmAppConfig`: from the config file (prompts, generation params, retries)
//! - `LlmDeviceConfig`: from env vars, device-specific (provider, endpoint, model, api_key)
//!
//! Env vars: SENTISCOPE_PROVIDER, SENTISCOPE_MODEL, SENTISCOPE_ENDPOINT, SENTISCOPE_API_KEY
//! (LLM_* names also accepted as fallback)

use serde::{Deserialize, Serialize};

use super::prompts::{
    DEFAULT_ANALYZE_PROMPT, DEFAULT_BATCH_PROMPT, DEFAULT_CLASSIFY_PROMPT,
    DEFAULT_DRIVERS_PROMPT, DEFAULT_EXPLAIN_PROMPT,
};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    OpenAI,
    /// Google Gemini generateContent API
    Gemini,
}

impl prefer::FromValue for LlmProvider {
    fn from_value(value: &prefer::ConfigValue) -> prefer::Result<Self> {
        match value.as_str() {
            Some(s) => LlmProvider::from_str(s).ok_or_else(|| prefer::Error::ConversionError {
                key: String::new(),
                type_name: "LlmProvider".to_string(),
                source: format!("unknown provider: {}", s).into(),
            }),
            None => Err(prefer::Error::ConversionError {
                key: String::new(),
                type_name: "LlmProvider".to_string(),
                source: "expected string".into(),
            }),
        }
    }
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            "gemini" | "google" | "googleai" => Some(Self::Gemini),
            _ => None,
        }
    }
}

/// Application-level LLM config (from the config file).
/// Controls what the LLM is asked to do, not how to connect to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct LlmAppConfig {
    /// Whether LLM analysis is enabled
    #[serde(default = "default_enabled")]
    #[prefer(default)]
    pub enabled: bool,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    #[prefer(default)]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    #[prefer(default)]
    pub temperature: f32,
    /// Retries for rate-limited or transient failures (per call)
    #[serde(default = "default_max_retries")]
    #[prefer(default)]
    pub max_retries: u32,
    /// HTTP timeout per request in seconds
    #[serde(default = "default_timeout_secs")]
    #[prefer(default)]
    pub timeout_secs: u64,
    /// Custom classify prompt (uses {text})
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub classify_prompt: Option<String>,
    /// Custom drivers prompt (uses {text} and {sentiment})
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub drivers_prompt: Option<String>,
    /// Custom explain prompt (uses {text} and {keywords})
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub explain_prompt: Option<String>,
    /// Custom single-shot prompt (uses {text})
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub analyze_prompt: Option<String>,
    /// Custom batch prompt (uses {texts})
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub batch_prompt: Option<String>,
}

/// Device-level LLM config (from env vars, varies per device).
/// Controls how to connect to the LLM backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmDeviceConfig {
    /// LLM provider
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    pub endpoint: String,
    /// Model to use
    pub model: String,
    /// API key for hosted providers
    pub api_key: Option<String>,
}

/// Combined LLM configuration (runtime).
///
/// Serde: only the app config is serialized/deserialized.
/// Device config is populated from environment variables during Default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct LlmConfig {
    #[serde(flatten)]
    #[prefer(flatten)]
    pub app: LlmAppConfig,
    #[serde(skip)]
    #[prefer(skip)]
    pub device: LlmDeviceConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_retries() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    120
}

// === LlmAppConfig implementations ===

impl Default for LlmAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            classify_prompt: None,
            drivers_prompt: None,
            explain_prompt: None,
            analyze_prompt: None,
            batch_prompt: None,
        }
    }
}

impl LlmAppConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn get_classify_prompt(&self) -> &str {
        self.classify_prompt
            .as_deref()
            .unwrap_or(DEFAULT_CLASSIFY_PROMPT)
    }

    pub fn get_drivers_prompt(&self) -> &str {
        self.drivers_prompt
            .as_deref()
            .unwrap_or(DEFAULT_DRIVERS_PROMPT)
    }

    pub fn get_explain_prompt(&self) -> &str {
        self.explain_prompt
            .as_deref()
            .unwrap_or(DEFAULT_EXPLAIN_PROMPT)
    }

    pub fn get_analyze_prompt(&self) -> &str {
        self.analyze_prompt
            .as_deref()
            .unwrap_or(DEFAULT_ANALYZE_PROMPT)
    }

    pub fn get_batch_prompt(&self) -> &str {
        self.batch_prompt.as_deref().unwrap_or(DEFAULT_BATCH_PROMPT)
    }
}

// === LlmDeviceConfig implementations ===

impl Default for LlmDeviceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl LlmDeviceConfig {
    /// Create device config from environment variables.
    ///
    /// Env vars (SENTISCOPE_* preferred, LLM_* accepted as fallback):
    /// - SENTISCOPE_PROVIDER / LLM_PROVIDER: ollama, gemini, groq, openai, together
    /// - SENTISCOPE_MODEL / LLM_MODEL: model ID
    /// - SENTISCOPE_ENDPOINT / LLM_ENDPOINT: API base URL
    /// - SENTISCOPE_API_KEY / LLM_API_KEY: API key
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Resolve device config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |primary: &str, fallback: &str| lookup(primary).or_else(|| lookup(fallback));

        let mut config = Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
        };

        let explicit_provider = var("SENTISCOPE_PROVIDER", "LLM_PROVIDER");
        if let Some(provider) = explicit_provider.as_deref().and_then(LlmProvider::from_str) {
            config.provider = provider;
        }

        // Explicit endpoint always wins, then OLLAMA_HOST for Ollama provider
        let explicit_endpoint = var("SENTISCOPE_ENDPOINT", "LLM_ENDPOINT");
        if let Some(ref endpoint) = explicit_endpoint {
            config.endpoint = endpoint.clone();
        } else if let Some(ollama_host) = lookup("OLLAMA_HOST") {
            config.endpoint = ollama_host;
        }

        config.api_key = var("SENTISCOPE_API_KEY", "LLM_API_KEY");
        let explicit_model = var("SENTISCOPE_MODEL", "LLM_MODEL");

        if let Some(ref provider_str) = explicit_provider {
            let flavor = provider_str.to_lowercase();

            if explicit_endpoint.is_none() {
                if let Some(endpoint) = hosted_endpoint(&flavor) {
                    config.endpoint = endpoint.to_string();
                }
            }

            if config.api_key.is_none() {
                config.api_key = match flavor.as_str() {
                    "gemini" | "google" | "googleai" => {
                        lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY"))
                    }
                    "groq" => lookup("GROQ_API_KEY"),
                    "openai" => lookup("OPENAI_API_KEY"),
                    "together" => lookup("TOGETHER_API_KEY"),
                    _ => None,
                };
            }

            if let Some(model) = hosted_model(&flavor) {
                config.model = model.to_string();
            }
        } else if config.api_key.is_none() {
            // No explicit provider - auto-detect from available keys
            let detected = [
                ("gemini", lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY"))),
                ("groq", lookup("GROQ_API_KEY")),
                ("openai", lookup("OPENAI_API_KEY")),
            ]
            .into_iter()
            .find_map(|(flavor, key)| key.map(|k| (flavor, k)));

            if let Some((flavor, key)) = detected {
                config.api_key = Some(key);
                if let Some(provider) = LlmProvider::from_str(flavor) {
                    config.provider = provider;
                }
                if explicit_endpoint.is_none() {
                    if let Some(endpoint) = hosted_endpoint(flavor) {
                        config.endpoint = endpoint.to_string();
                    }
                }
                if let Some(model) = hosted_model(flavor) {
                    config.model = model.to_string();
                }
            }
        }

        if let Some(model) = explicit_model {
            config.model = model;
        }

        config
    }

    /// Get the provider name for display.
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::Ollama => "Ollama",
            LlmProvider::Gemini => "Gemini",
            LlmProvider::OpenAI => {
                if self.endpoint.contains("groq.com") {
                    "Groq"
                } else if self.endpoint.contains("together.xyz") {
                    "Together.ai"
                } else {
                    "OpenAI"
                }
            }
        }
    }

    /// Whether the provider needs an API key to be usable.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self.provider, LlmProvider::Ollama)
    }

    /// Get a provider-aware availability hint for error messages.
    pub fn availability_hint(&self) -> String {
        match self.provider {
            LlmProvider::Ollama => format!(
                "Ollama not available at {}. Make sure Ollama is running: ollama serve",
                self.endpoint
            ),
            LlmProvider::Gemini if self.api_key.is_none() => {
                "Gemini API key not set. Set GEMINI_API_KEY or SENTISCOPE_API_KEY".to_string()
            }
            LlmProvider::OpenAI if self.api_key.is_none() => {
                "OpenAI API key not set. Set OPENAI_API_KEY or SENTISCOPE_API_KEY".to_string()
            }
            _ => format!(
                "{} API not available at {}",
                self.provider_name(),
                self.endpoint
            ),
        }
    }
}

fn hosted_endpoint(flavor: &str) -> Option<&'static str> {
    match flavor {
        "gemini" | "google" | "googleai" => Some("https://generativelanguage.googleapis.com"),
        "groq" => Some("https://api.groq.com/openai"),
        "openai" => Some("https://api.openai.com"),
        "together" => Some("https://api.together.xyz"),
        _ => None,
    }
}

fn hosted_model(flavor: &str) -> Option<&'static str> {
    match flavor {
        "gemini" | "google" | "googleai" => Some("gemini-2.0-flash"),
        "groq" => Some("llama-3.3-70b-versatile"),
        "openai" => Some("gpt-4o-mini"),
        "together" => Some("meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo"),
        _ => None,
    }
}

// === LlmConfig (combined) implementations ===

impl LlmConfig {
    pub fn new(app: LlmAppConfig, device: LlmDeviceConfig) -> Self {
        Self { app, device }
    }

    pub fn is_default(&self) -> bool {
        self.app.is_default()
    }

    pub fn enabled(&self) -> bool {
        self.app.enabled
    }

    pub fn provider(&self) -> LlmProvider {
        self.device.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.device.endpoint
    }

    pub fn model(&self) -> &str {
        &self.device.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.device.api_key.as_deref()
    }

    pub fn provider_name(&self) -> &'static str {
        self.device.provider_name()
    }

    pub fn availability_hint(&self) -> String {
        self.device.availability_hint()
    }

    // Setters for CLI override use cases

    pub fn set_endpoint(&mut self, endpoint: String) {
        self.device.endpoint = endpoint;
    }

    pub fn set_model(&mut self, model: String) {
        self.device.model = model;
    }
}
