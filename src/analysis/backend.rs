//! AI backend contract for sentiment analysis.
//!
//! Backends return the raw wire shapes; validation into domain types happens
//! here so every backend gets the same checks (label parsing, confidence range,
//! index bounds).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::BackendError;
use crate::models::{Sentiment, SentimentAnalysis};

/// Stage 1 input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// Stage 1 output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub sentiment: String,
    pub confidence: f64,
}

/// Stage 2 input: the text plus the sentiment from stage 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriversRequest {
    pub text: String,
    pub sentiment: Sentiment,
}

/// Stage 2 output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriversResponse {
    pub drivers: Vec<String>,
}

/// Stage 3 input: the text plus the drivers from stage 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub text: String,
    pub keywords: Vec<String>,
}

/// Stage 3 output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

/// Single-shot input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Single-shot output: everything in one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub sentiment: String,
    pub confidence: f64,
    pub drivers: Vec<String>,
    pub explanation: String,
}

/// Batch input: one chunk of texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub texts: Vec<String>,
}

/// Batch output. Items may arrive in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchResultItem>,
}

/// One item of a batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResultItem {
    pub sentiment: String,
    pub confidence: f64,
    pub drivers: Vec<String>,
    pub explanation: String,
    /// Position within the submitted chunk. Kept as a JSON number so
    /// fractional or negative values can be rejected per item.
    pub original_index: f64,
}

/// A validated batch item, still indexed locally to its chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkItem {
    pub local_index: usize,
    pub analysis: SentimentAnalysis,
}

/// Trait for AI backends that can analyze sentiment.
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    /// Backend identifier for logs and status output.
    fn name(&self) -> &str;

    /// Classify sentiment with a confidence score.
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, BackendError>;

    /// Extract phrases driving an already-classified sentiment.
    async fn extract_drivers(
        &self,
        request: &DriversRequest,
    ) -> Result<DriversResponse, BackendError>;

    /// Explain the sentiment in terms of the drivers.
    async fn explain(&self, request: &ExplainRequest) -> Result<ExplainResponse, BackendError>;

    /// Full analysis in one call.
    async fn analyze_one(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError>;

    /// Full analysis of a chunk of texts.
    async fn analyze_batch(&self, request: &BatchRequest) -> Result<BatchResponse, BackendError>;
}

/// Parse a sentiment label from a backend response.
pub fn parse_sentiment(label: &str) -> Result<Sentiment, BackendError> {
    Sentiment::from_str(label).ok_or_else(|| BackendError::InvalidSentiment(label.to_string()))
}

/// Check a confidence value is a finite number within [0, 1].
pub fn check_confidence(confidence: f64) -> Result<f64, BackendError> {
    if confidence.is_finite() && (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(BackendError::ConfidenceOutOfRange(confidence))
    }
}

/// Trim drivers and drop empty entries, keeping backend order.
pub fn clean_drivers(drivers: Vec<String>) -> Vec<String> {
    drivers
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

impl ClassifyResponse {
    pub fn validate(self) -> Result<(Sentiment, f64), BackendError> {
        Ok((
            parse_sentiment(&self.sentiment)?,
            check_confidence(self.confidence)?,
        ))
    }
}

impl AnalyzeResponse {
    pub fn into_analysis(self) -> Result<SentimentAnalysis, BackendError> {
        Ok(SentimentAnalysis {
            sentiment: parse_sentiment(&self.sentiment)?,
            confidence: check_confidence(self.confidence)?,
            drivers: clean_drivers(self.drivers),
            explanation: self.explanation,
        })
    }
}

impl BatchResultItem {
    /// Validate this item against the size of the chunk it answers.
    pub fn into_chunk_item(self, chunk_len: usize) -> Result<ChunkItem, BackendError> {
        let raw = self.original_index;
        if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 {
            return Err(BackendError::NonIntegerIndex(raw));
        }
        if raw >= chunk_len as f64 {
            return Err(BackendError::IndexOutOfRange {
                index: raw as usize,
                len: chunk_len,
            });
        }

        Ok(ChunkItem {
            local_index: raw as usize,
            analysis: SentimentAnalysis {
                sentiment: parse_sentiment(&self.sentiment)?,
                confidence: check_confidence(self.confidence)?,
                drivers: clean_drivers(self.drivers),
                explanation: self.explanation,
            },
        })
    }
}
