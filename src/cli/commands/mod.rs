//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod helpers;
mod llm;
mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::analysis::{LlmSentimentBackend, PipelineMode, SentimentService};
use crate::config::{load_config, Config, ConfigOverrides, LoadOptions};
use crate::llm::LlmClient;

use analyze::OutputFormat;

#[derive(Parser)]
#[command(name = "sentiscope")]
#[command(about = "Sentiment analysis over generative-AI backends")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Backend flags shared by commands that call the model.
#[derive(clap::Args, Debug, Default)]
struct BackendArgs {
    /// Model to use (overrides SENTISCOPE_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Backend endpoint (overrides SENTISCOPE_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the sentiment of one or more texts
    Analyze {
        /// Texts to analyze (each argument is one text)
        texts: Vec<String>,

        /// Read texts from a .txt, .csv or .json file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Treat each non-blank line of a text file as a separate text
        #[arg(long, requires = "file")]
        lines: bool,

        /// Pipeline for single texts
        #[arg(short, long, value_enum)]
        mode: Option<PipelineMode>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write results to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Texts per backend request in batch mode
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Chunks in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Start the web server for the dashboard API
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default from config: 127.0.0.1:3040)
        bind: Option<String>,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// List models available from the configured provider
    Models {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Show the effective configuration and check the backend is reachable
    Check {
        #[command(flatten)]
        backend: BackendArgs,
    },
}

/// Build the sentiment service from a fully resolved config.
fn build_service(config: &Config) -> anyhow::Result<SentimentService> {
    let client = LlmClient::new(config.llm.clone())?;
    let backend = LlmSentimentBackend::new(client);
    Ok(SentimentService::new(Arc::new(backend), &config.analysis))
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions::with_config_path(cli.config.as_deref().and_then(|p| p.to_str()));
    let mut config = load_config(&options)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Analyze {
            texts,
            file,
            lines,
            mode,
            format,
            output,
            chunk_size,
            concurrency,
            backend,
        } => {
            config.apply_overrides(&ConfigOverrides {
                model: backend.model,
                endpoint: backend.endpoint,
                chunk_size,
                concurrency,
                mode,
                bind: None,
            });
            let service = build_service(&config)?;
            analyze::cmd_analyze(
                &service,
                texts,
                file.as_deref(),
                lines,
                format,
                output.as_deref(),
            )
            .await
        }
        Commands::Serve { bind, backend } => {
            config.apply_overrides(&ConfigOverrides {
                model: backend.model,
                endpoint: backend.endpoint,
                bind,
                ..Default::default()
            });
            let service = build_service(&config)?;
            serve::cmd_serve(&config, service).await
        }
        Commands::Models { backend } => {
            config.apply_overrides(&ConfigOverrides {
                model: backend.model,
                endpoint: backend.endpoint,
                ..Default::default()
            });
            llm::cmd_models(&config).await
        }
        Commands::Check { backend } => {
            config.apply_overrides(&ConfigOverrides {
                model: backend.model,
                endpoint: backend.endpoint,
                ..Default::default()
            });
            llm::cmd_check(&config).await
        }
    }
}
