//! Configuration management for sentiscope using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::{PipelineMode, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENT_CHUNKS};
use crate::llm::LlmConfig;

/// Default API server bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3040";

/// Batch and pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct AnalysisConfig {
    /// Maximum texts per batch request.
    #[serde(default = "default_chunk_size")]
    #[prefer(default)]
    pub chunk_size: usize,
    /// Chunk requests in flight at once (1 = sequential).
    #[serde(default = "default_max_concurrent_chunks")]
    #[prefer(default)]
    pub max_concurrent_chunks: usize,
    /// Single-item strategy: "staged" or "single-shot".
    #[serde(default)]
    #[prefer(default)]
    pub pipeline: PipelineMode,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_concurrent_chunks() -> usize {
    DEFAULT_MAX_CONCURRENT_CHUNKS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_concurrent_chunks: default_max_concurrent_chunks(),
            pipeline: PipelineMode::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// API server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct ServerConfig {
    /// Address to bind, e.g. "127.0.0.1:3040".
    #[serde(default = "default_bind")]
    #[prefer(default)]
    pub bind: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ServerConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// LLM configuration (app-level; connection settings come from env).
    #[serde(default, skip_serializing_if = "LlmConfig::is_default")]
    #[prefer(default)]
    pub llm: LlmConfig,
    /// Batch and pipeline configuration.
    #[serde(default, skip_serializing_if = "AnalysisConfig::is_default")]
    #[prefer(default)]
    pub analysis: AnalysisConfig,
    /// API server configuration.
    #[serde(default, skip_serializing_if = "ServerConfig::is_default")]
    #[prefer(default)]
    pub server: ServerConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers sentiscope config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("sentiscope").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found, use defaults (device settings still come from env)
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config contents in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Apply one-off overrides (typically CLI flags).
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref model) = overrides.model {
            self.llm.set_model(model.clone());
        }
        if let Some(ref endpoint) = overrides.endpoint {
            self.llm.set_endpoint(endpoint.clone());
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.analysis.chunk_size = chunk_size.max(1);
        }
        if let Some(concurrency) = overrides.concurrency {
            self.analysis.max_concurrent_chunks = concurrency.max(1);
        }
        if let Some(mode) = overrides.mode {
            self.analysis.pipeline = mode;
        }
        if let Some(ref bind) = overrides.bind {
            self.server.bind = bind.clone();
        }
    }

    /// Serialize the file-backed portion of the config as TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))
    }
}

/// Per-invocation overrides layered on top of the loaded config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub chunk_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub mode: Option<PipelineMode>,
    pub bind: Option<String>,
}

/// Options for loading configuration.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_config_path(path: Option<&str>) -> Self {
        Self {
            config_path: path.map(|p| PathBuf::from(shellexpand::tilde(p).as_ref())),
        }
    }
}

/// Load config with explicit options.
///
/// An explicit `--config` path must load; discovered files fall back to
/// defaults when unreadable.
pub async fn load_config(options: &LoadOptions) -> Result<Config, String> {
    match options.config_path {
        Some(ref path) => Config::load_from_path(path).await,
        None => Ok(Config::load().await),
    }
}
