//! Deterministic backend for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::backend::{
    AnalyzeRequest, AnalyzeResponse, BatchRequest, BatchResponse, BatchResultItem,
    ClassifyRequest, ClassifyResponse, DriversRequest, DriversResponse, ExplainRequest,
    ExplainResponse, SentimentBackend,
};
use super::error::BackendError;
use super::pipeline::Stage;
use crate::llm::LlmError;
use crate::models::Sentiment;

const POSITIVE_WORDS: &[&str] = &["great", "good", "love", "excellent"];
const NEGATIVE_WORDS: &[&str] = &["terrible", "bad", "hate", "awful"];

/// Backend call, as recorded by `ScriptedBackend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Classify,
    Drivers,
    Explain,
    AnalyzeOne,
    Batch { size: usize },
}

/// Keyword-driven backend that records every call.
///
/// Sentiment comes from fixed word lists, so the same text always gets the
/// same analysis.
pub struct ScriptedBackend {
    calls: Mutex<Vec<Call>>,
    drivers_requests: Mutex<Vec<DriversRequest>>,
    explain_requests: Mutex<Vec<ExplainRequest>>,
    failing_stage: Option<Stage>,
    confidence: f64,
    reverse_batches: bool,
    failing_chunks: Vec<String>,
    empty_chunks: Vec<String>,
    extra_items: Vec<BatchResultItem>,
    confidence_overrides: Vec<(String, f64)>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            drivers_requests: Mutex::new(Vec::new()),
            explain_requests: Mutex::new(Vec::new()),
            failing_stage: None,
            confidence: 0.9,
            reverse_batches: false,
            failing_chunks: Vec::new(),
            empty_chunks: Vec::new(),
            extra_items: Vec::new(),
            confidence_overrides: Vec::new(),
        }
    }

    /// Fail every call belonging to `stage`.
    pub fn fail_stage(mut self, stage: Stage) -> Self {
        self.failing_stage = Some(stage);
        self
    }

    /// Report this confidence for every text.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Report `confidence` for `text` only, in batch responses.
    pub fn with_confidence_for(mut self, text: &str, confidence: f64) -> Self {
        self.confidence_overrides.push((text.to_string(), confidence));
        self
    }

    /// Return batch results in reverse order.
    pub fn reversed(mut self) -> Self {
        self.reverse_batches = true;
        self
    }

    /// Fail any batch call whose chunk contains `text`.
    pub fn fail_chunk_containing(mut self, text: &str) -> Self {
        self.failing_chunks.push(text.to_string());
        self
    }

    /// Return zero results for any chunk containing `text`.
    pub fn empty_chunk_containing(mut self, text: &str) -> Self {
        self.empty_chunks.push(text.to_string());
        self
    }

    /// Append `item` to every batch response.
    pub fn inject_item(mut self, item: BatchResultItem) -> Self {
        self.extra_items.push(item);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Sizes of all batch calls, ascending.
    pub fn batch_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Batch { size } => Some(size),
                _ => None,
            })
            .collect();
        sizes.sort_unstable();
        sizes
    }

    pub fn last_drivers_request(&self) -> Option<DriversRequest> {
        self.drivers_requests.lock().unwrap().last().cloned()
    }

    pub fn last_explain_request(&self) -> Option<ExplainRequest> {
        self.explain_requests.lock().unwrap().last().cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_stage(&self, stage: Stage) -> Result<(), BackendError> {
        if self.failing_stage == Some(stage) {
            return Err(BackendError::Llm(LlmError::Connection(format!(
                "scripted {} failure",
                stage
            ))));
        }
        Ok(())
    }

    pub fn sentiment_of(text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        if POSITIVE_WORDS.iter().any(|w| lower.contains(w)) {
            Sentiment::Positive
        } else if NEGATIVE_WORDS.iter().any(|w| lower.contains(w)) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    fn drivers_of(text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        POSITIVE_WORDS
            .iter()
            .chain(NEGATIVE_WORDS)
            .filter(|w| lower.contains(*w))
            .map(|w| w.to_string())
            .collect()
    }

    fn explanation_of(sentiment: Sentiment, drivers: &[String]) -> String {
        format!("{} because of [{}]", sentiment, drivers.join(", "))
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, BackendError> {
        self.record(Call::Classify);
        self.check_stage(Stage::Classify)?;
        Ok(ClassifyResponse {
            sentiment: Self::sentiment_of(&request.text).as_str().to_string(),
            confidence: self.confidence,
        })
    }

    async fn extract_drivers(
        &self,
        request: &DriversRequest,
    ) -> Result<DriversResponse, BackendError> {
        self.record(Call::Drivers);
        self.drivers_requests.lock().unwrap().push(request.clone());
        self.check_stage(Stage::Drivers)?;
        Ok(DriversResponse {
            drivers: Self::drivers_of(&request.text),
        })
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<ExplainResponse, BackendError> {
        self.record(Call::Explain);
        self.explain_requests.lock().unwrap().push(request.clone());
        self.check_stage(Stage::Explain)?;
        Ok(ExplainResponse {
            explanation: Self::explanation_of(
                Self::sentiment_of(&request.text),
                &request.keywords,
            ),
        })
    }

    async fn analyze_one(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError> {
        self.record(Call::AnalyzeOne);
        self.check_stage(Stage::SingleShot)?;
        let sentiment = Self::sentiment_of(&request.text);
        let drivers = Self::drivers_of(&request.text);
        Ok(AnalyzeResponse {
            sentiment: sentiment.as_str().to_string(),
            confidence: self.confidence,
            explanation: Self::explanation_of(sentiment, &drivers),
            drivers,
        })
    }

    async fn analyze_batch(&self, request: &BatchRequest) -> Result<BatchResponse, BackendError> {
        self.record(Call::Batch {
            size: request.texts.len(),
        });

        // Yield so concurrent chunks interleave
        tokio::task::yield_now().await;

        let contains = |needles: &[String]| {
            request
                .texts
                .iter()
                .any(|t| needles.iter().any(|n| t == n))
        };
        if contains(&self.failing_chunks) {
            return Err(BackendError::Llm(LlmError::Api {
                status: 503,
                message: "scripted chunk failure".to_string(),
            }));
        }
        if contains(&self.empty_chunks) {
            return Ok(BatchResponse {
                results: Vec::new(),
            });
        }

        let mut results: Vec<BatchResultItem> = request
            .texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let sentiment = Self::sentiment_of(text);
                let drivers = Self::drivers_of(text);
                BatchResultItem {
                    sentiment: sentiment.as_str().to_string(),
                    confidence: self
                        .confidence_overrides
                        .iter()
                        .find(|(t, _)| t == text)
                        .map_or(self.confidence, |(_, c)| *c),
                    explanation: Self::explanation_of(sentiment, &drivers),
                    drivers,
                    original_index: i as f64,
                }
            })
            .collect();

        if self.reverse_batches {
            results.reverse();
        }
        results.extend(self.extra_items.iter().cloned());

        Ok(BatchResponse { results })
    }
}
