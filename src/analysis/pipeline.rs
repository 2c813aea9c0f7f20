//! Single-item analysis pipeline.
//!
//! Two strategies share one contract:
//!
//! - `Staged` (default): classify, then extract drivers conditioned on the
//!   classified sentiment, then explain conditioned on those drivers. Three
//!   dependent round trips; drivers and explanation are grounded in the
//!   confirmed label.
//! - `SingleShot`: one round trip returning everything at once. Roughly a third
//!   of the latency and cost, but the model picks drivers and explanation in the
//!   same breath as the label.
//!
//! Staged analysis is an ordered list of typed stages folded over a
//! `PipelineState`: each stage builds its request from prior outputs, and the
//! reducer folds the validated response back into the state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{
    clean_drivers, AnalyzeRequest, ClassifyRequest, DriversRequest, ExplainRequest,
    SentimentBackend,
};
use super::error::{AnalysisError, BackendError, InputError};
use crate::models::{Sentiment, SentimentAnalysis};

/// Which single-item strategy to run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineMode {
    /// Classify, then drivers, then explanation (3 calls).
    #[default]
    Staged,
    /// Everything in one call.
    SingleShot,
}

impl PipelineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::SingleShot => "single-shot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "staged" | "pipeline" => Some(Self::Staged),
            "single-shot" | "single" | "oneshot" => Some(Self::SingleShot),
            _ => None,
        }
    }

    /// Backend round trips per analyzed text.
    pub fn round_trips(&self) -> usize {
        match self {
            Self::Staged => Stage::STAGED.len(),
            Self::SingleShot => 1,
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl prefer::FromValue for PipelineMode {
    fn from_value(value: &prefer::ConfigValue) -> prefer::Result<Self> {
        let s = value.as_str().ok_or_else(|| prefer::Error::ConversionError {
            key: String::new(),
            type_name: "PipelineMode".to_string(),
            source: "expected string".into(),
        })?;
        PipelineMode::from_str(s).ok_or_else(|| prefer::Error::ConversionError {
            key: String::new(),
            type_name: "PipelineMode".to_string(),
            source: format!("unknown pipeline mode: {}", s).into(),
        })
    }
}

/// A backend step of single-item analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classify,
    Drivers,
    Explain,
    SingleShot,
}

impl Stage {
    /// Stages of the staged pipeline, in execution order.
    pub const STAGED: [Stage; 3] = [Stage::Classify, Stage::Drivers, Stage::Explain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Drivers => "drivers",
            Stage::Explain => "explain",
            Stage::SingleShot => "single-shot",
        }
    }

    /// Noun form for user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Classify => "sentiment classification",
            Stage::Drivers => "driver extraction",
            Stage::Explain => "explanation",
            Stage::SingleShot => "sentiment analysis",
        }
    }

    /// Build this stage's request from the outputs of earlier stages.
    fn request(&self, text: &str, state: &PipelineState) -> Result<StageRequest, AnalysisError> {
        let out_of_order = |missing| AnalysisError::StageOutOfOrder {
            stage: *self,
            missing,
        };

        match self {
            Stage::Classify => Ok(StageRequest::Classify(ClassifyRequest {
                text: text.to_string(),
            })),
            Stage::Drivers => {
                let (sentiment, _) = state
                    .classification
                    .ok_or_else(|| out_of_order(Stage::Classify))?;
                Ok(StageRequest::Drivers(DriversRequest {
                    text: text.to_string(),
                    sentiment,
                }))
            }
            Stage::Explain => {
                let keywords = state
                    .drivers
                    .clone()
                    .ok_or_else(|| out_of_order(Stage::Drivers))?;
                Ok(StageRequest::Explain(ExplainRequest {
                    text: text.to_string(),
                    keywords,
                }))
            }
            Stage::SingleShot => Ok(StageRequest::SingleShot(AnalyzeRequest {
                text: text.to_string(),
            })),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

enum StageRequest {
    Classify(ClassifyRequest),
    Drivers(DriversRequest),
    Explain(ExplainRequest),
    SingleShot(AnalyzeRequest),
}

enum StageOutput {
    Classified(Sentiment, f64),
    Drivers(Vec<String>),
    Explanation(String),
    Complete(SentimentAnalysis),
}

impl StageRequest {
    /// Send to the backend and validate the response.
    async fn send(self, backend: &dyn SentimentBackend) -> Result<StageOutput, BackendError> {
        match self {
            StageRequest::Classify(req) => {
                let (sentiment, confidence) = backend.classify(&req).await?.validate()?;
                Ok(StageOutput::Classified(sentiment, confidence))
            }
            StageRequest::Drivers(req) => {
                let resp = backend.extract_drivers(&req).await?;
                Ok(StageOutput::Drivers(clean_drivers(resp.drivers)))
            }
            StageRequest::Explain(req) => {
                let resp = backend.explain(&req).await?;
                Ok(StageOutput::Explanation(resp.explanation))
            }
            StageRequest::SingleShot(req) => {
                let analysis = backend.analyze_one(&req).await?.into_analysis()?;
                Ok(StageOutput::Complete(analysis))
            }
        }
    }
}

/// Accumulated stage outputs.
#[derive(Debug, Default)]
struct PipelineState {
    classification: Option<(Sentiment, f64)>,
    drivers: Option<Vec<String>>,
    explanation: Option<String>,
    complete: Option<SentimentAnalysis>,
}

impl PipelineState {
    fn reduce(mut self, output: StageOutput) -> Self {
        match output {
            StageOutput::Classified(sentiment, confidence) => {
                self.classification = Some((sentiment, confidence))
            }
            StageOutput::Drivers(drivers) => self.drivers = Some(drivers),
            StageOutput::Explanation(explanation) => self.explanation = Some(explanation),
            StageOutput::Complete(analysis) => self.complete = Some(analysis),
        }
        self
    }

    fn finish(self) -> Option<SentimentAnalysis> {
        if let Some(analysis) = self.complete {
            return Some(analysis);
        }
        let (sentiment, confidence) = self.classification?;
        Some(SentimentAnalysis {
            sentiment,
            confidence,
            drivers: self.drivers?,
            explanation: self.explanation?,
        })
    }
}

/// Analyzes one text at a time.
#[derive(Clone)]
pub struct SingleItemAnalyzer {
    backend: Arc<dyn SentimentBackend>,
    mode: PipelineMode,
}

impl SingleItemAnalyzer {
    pub fn new(backend: Arc<dyn SentimentBackend>, mode: PipelineMode) -> Self {
        Self { backend, mode }
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Analyze one text. Blank text is rejected before any backend call, and
    /// any failing stage aborts the whole analysis.
    pub async fn analyze(&self, text: &str) -> Result<SentimentAnalysis, AnalysisError> {
        if text.trim().is_empty() {
            return Err(InputError::EmptyText.into());
        }

        let stages: &[Stage] = match self.mode {
            PipelineMode::Staged => &Stage::STAGED,
            PipelineMode::SingleShot => &[Stage::SingleShot],
        };

        let mut state = PipelineState::default();
        for &stage in stages {
            let request = stage.request(text, &state)?;
            debug!("{} stage via {}", stage, self.backend.name());
            let output = request
                .send(self.backend.as_ref())
                .await
                .map_err(|source| AnalysisError::StageFailed { stage, source })?;
            state = state.reduce(output);
        }

        let last = stages.last().copied().unwrap_or(Stage::SingleShot);
        state.finish().ok_or_else(|| AnalysisError::StageFailed {
            stage: last,
            source: BackendError::Malformed("pipeline finished without a result".to_string()),
        })
    }
}
