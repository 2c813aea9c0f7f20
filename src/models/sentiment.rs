//! Sentiment analysis result models.
//!
//! `SentimentAnalysis` is what the analyzers produce for one text. The caller-facing
//! `AnalysisResult` adds the run-scoped id and the verbatim input text, both of
//! which are assigned locally and never taken from the AI backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentiment classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Parse a label as returned by a model ("Positive", " neutral", ...).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Capitalized label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Analysis of a single text, without id or echoed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    /// Always within [0.0, 1.0].
    pub confidence: f64,
    /// Key phrases driving the sentiment, in backend order.
    pub drivers: Vec<String>,
    pub explanation: String,
}

/// Caller-facing analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Unique within one analysis run.
    pub id: String,
    /// Original input text, verbatim.
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub drivers: Vec<String>,
    pub explanation: String,
}

impl AnalysisResult {
    pub fn new(id: String, text: String, analysis: SentimentAnalysis) -> Self {
        Self {
            id,
            text,
            sentiment: analysis.sentiment,
            confidence: analysis.confidence,
            drivers: analysis.drivers,
            explanation: analysis.explanation,
        }
    }

    /// Confidence as a whole percentage, e.g. `87%`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.0}%", self.confidence * 100.0)
    }
}

/// One analysis run: a result set that replaces the previous one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub results: Vec<AnalysisResult>,
}

impl AnalysisRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Result id for the text at `index` in the caller's input.
    pub fn result_id(&self, index: usize) -> String {
        format!("{}-{}", self.id.simple(), index)
    }

    /// Append a result for the input text at `index`.
    pub fn push(&mut self, index: usize, text: &str, analysis: SentimentAnalysis) {
        let id = self.result_id(index);
        self.results
            .push(AnalysisResult::new(id, text.to_string(), analysis));
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl Default for AnalysisRun {
    fn default() -> Self {
        Self::new()
    }
}
