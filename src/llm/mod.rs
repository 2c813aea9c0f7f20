//! LLM integration for sentiment analysis.
//!
//! Talks to a hosted or local model (Ollama, OpenAI-compatible APIs, Gemini) and
//! asks for JSON-only completions that the analysis layer validates.

mod client;

pub use client::prompts;
pub use client::{LlmAppConfig, LlmClient, LlmConfig, LlmDeviceConfig, LlmError, LlmProvider};
