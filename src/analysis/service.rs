//! Caller-facing analysis surface.
//!
//! Used by both the CLI and the HTTP API. Dispatches one text to the
//! single-item analyzer and several to the batch orchestrator.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use super::backend::SentimentBackend;
use super::batch::{BatchEvent, BatchOrchestrator};
use super::error::{AnalysisError, InputError};
use super::pipeline::{PipelineMode, SingleItemAnalyzer};
use crate::config::AnalysisConfig;
use crate::models::{AnalysisRun, SentimentAnalysis};

/// Service for analyzing text sentiment.
#[derive(Clone)]
pub struct SentimentService {
    backend: Arc<dyn SentimentBackend>,
    analyzer: SingleItemAnalyzer,
    orchestrator: BatchOrchestrator,
}

impl SentimentService {
    /// Create a new sentiment service.
    pub fn new(backend: Arc<dyn SentimentBackend>, config: &AnalysisConfig) -> Self {
        Self {
            analyzer: SingleItemAnalyzer::new(backend.clone(), config.pipeline),
            orchestrator: BatchOrchestrator::new(
                backend.clone(),
                config.chunk_size,
                config.max_concurrent_chunks,
            ),
            backend,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn mode(&self) -> PipelineMode {
        self.analyzer.mode()
    }

    pub fn chunk_size(&self) -> usize {
        self.orchestrator.chunk_size()
    }

    pub fn max_concurrent_chunks(&self) -> usize {
        self.orchestrator.max_concurrent_chunks()
    }

    /// Analyze one text.
    pub async fn analyze_single_text(&self, text: &str) -> Result<SentimentAnalysis, AnalysisError> {
        self.analyzer.analyze(text).await
    }

    /// Analyze several texts, in input order. Texts whose chunk failed are absent.
    pub async fn analyze_multiple_texts(
        &self,
        texts: &[String],
    ) -> Result<Vec<SentimentAnalysis>, AnalysisError> {
        self.orchestrator.analyze_batch(texts).await
    }

    /// Analyze a dashboard submission.
    ///
    /// Blank entries are skipped but keep their position, so result ids and
    /// texts always refer to the caller's original index.
    pub async fn analyze_texts(
        &self,
        texts: &[String],
        events: Option<&mpsc::Sender<BatchEvent>>,
    ) -> Result<AnalysisRun, AnalysisError> {
        if texts.is_empty() {
            return Err(InputError::EmptyBatch.into());
        }

        let positions: Vec<usize> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, _)| i)
            .collect();

        let mut run = AnalysisRun::new();
        match positions.as_slice() {
            [] => return Err(InputError::AllTextsBlank.into()),
            [only] => {
                let analysis = self.analyzer.analyze(&texts[*only]).await?;
                run.push(*only, &texts[*only], analysis);
            }
            _ => {
                let submitted: Vec<String> = positions.iter().map(|&i| texts[i].clone()).collect();
                let outcome = self
                    .orchestrator
                    .run_at(&submitted, Some(&positions), events)
                    .await?;
                for item in outcome.items {
                    run.push(item.index, &texts[item.index], item.analysis);
                }
            }
        }

        info!(
            "Run {} analyzed {} of {} texts",
            run.id,
            run.len(),
            texts.len()
        );
        Ok(run)
    }
}
