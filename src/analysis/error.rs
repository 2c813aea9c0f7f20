//! Error taxonomy for sentiment analysis.
//!
//! - `InputError`: rejected before any backend call
//! - `BackendError`: one backend call failed or returned something unusable
//! - `AnalysisError`: what the caller finally sees

use thiserror::Error;

use super::pipeline::Stage;
use crate::llm::LlmError;

/// Invalid caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Text to analyze must not be empty")]
    EmptyText,
    #[error("No texts to analyze")]
    EmptyBatch,
    #[error("All provided texts are blank")]
    AllTextsBlank,
}

/// Failure of a single backend call, or an unusable item in its response.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed backend response: {0}")]
    Malformed(String),

    #[error("Invalid sentiment label: {0:?}")]
    InvalidSentiment(String),

    #[error("Confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    #[error("Backend returned no results")]
    EmptyBatchResponse,

    #[error("Index {index} outside chunk of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Index {0} is not a non-negative integer")]
    NonIntegerIndex(f64),

    #[error("Duplicate index {0}")]
    DuplicateIndex(usize),

    #[error("All {rejected} returned items were rejected")]
    NoValidItems { rejected: usize },
}

impl BackendError {
    /// Whether this error concerns where an item goes rather than what it says.
    ///
    /// Such items are dropped individually; any other item error fails its chunk.
    pub fn is_placement_error(&self) -> bool {
        matches!(
            self,
            BackendError::IndexOutOfRange { .. }
                | BackendError::NonIntegerIndex(_)
                | BackendError::DuplicateIndex(_)
        )
    }

    /// Human-readable cause without raw backend payloads.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Llm(LlmError::Connection(_)) => {
                "Could not reach the AI service".to_string()
            }
            BackendError::Llm(LlmError::Api { status, .. }) => {
                format!("The AI service returned an error (HTTP {})", status)
            }
            BackendError::Llm(LlmError::RateLimited { provider, .. }) => {
                format!("{} is rate limiting requests, try again shortly", provider)
            }
            BackendError::Llm(LlmError::MissingApiKey(provider)) => {
                format!("No API key configured for {}", provider)
            }
            BackendError::Llm(LlmError::Disabled) => "AI analysis is disabled".to_string(),
            BackendError::Llm(LlmError::Parse(_)) | BackendError::Malformed(_) => {
                "The AI service returned an unexpected response".to_string()
            }
            BackendError::EmptyBatchResponse | BackendError::NoValidItems { .. } => {
                "The AI service returned no usable results".to_string()
            }
            BackendError::InvalidSentiment(_)
            | BackendError::ConfidenceOutOfRange(_)
            | BackendError::IndexOutOfRange { .. }
            | BackendError::NonIntegerIndex(_)
            | BackendError::DuplicateIndex(_) => {
                "The AI service returned an invalid result".to_string()
            }
        }
    }
}

/// A batch chunk that contributed no results.
///
/// `offset` and `len` give the span of the caller's input the chunk covered.
#[derive(Debug, Error)]
#[error("chunk at offset {offset} ({len} texts): {cause}")]
pub struct ChunkFailure {
    pub offset: usize,
    pub len: usize,
    pub cause: BackendError,
}

/// Error surfaced to the caller of an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("{stage} stage failed: {source}")]
    StageFailed { stage: Stage, source: BackendError },

    #[error("{stage} stage ran before the {missing} stage")]
    StageOutOfOrder { stage: Stage, missing: Stage },

    #[error("All {chunks} batch chunks failed")]
    AllChunksFailed {
        chunks: usize,
        failures: Vec<ChunkFailure>,
    },
}

impl AnalysisError {
    /// Stable category for notifications.
    pub fn category(&self) -> &'static str {
        match self {
            AnalysisError::Input(_) => "Input Error",
            _ => "Analysis Failed",
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, AnalysisError::Input(_))
    }

    /// Message safe to show an end user.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Input(e) => e.to_string(),
            AnalysisError::StageFailed { stage, source } => {
                format!("The {} step failed: {}", stage.label(), source.user_message())
            }
            AnalysisError::StageOutOfOrder { .. } => {
                "The analysis pipeline is misconfigured".to_string()
            }
            AnalysisError::AllChunksFailed { chunks, failures } => {
                let cause = failures
                    .first()
                    .map(|f| f.cause.user_message())
                    .unwrap_or_else(|| "no results were returned".to_string());
                if *chunks == 1 {
                    format!("The batch could not be analyzed: {}", cause)
                } else {
                    format!("None of the {} batch chunks could be analyzed: {}", chunks, cause)
                }
            }
        }
    }
}
