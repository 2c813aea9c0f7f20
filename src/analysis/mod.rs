//! Sentiment analysis core.
//!
//! - `backend`: the AI backend contract and its wire types
//! - `pipeline`: single-item analysis (staged or single-shot)
//! - `batch`: chunked batch orchestration with index reconciliation
//! - `service`: the caller-facing surface used by the CLI and the API

pub mod backend;
mod batch;
mod error;
mod llm_backend;
mod pipeline;
mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::SentimentBackend;
pub use batch::{partition, BatchEvent, BatchOrchestrator, BatchOutcome, Chunk, IndexedAnalysis};
pub use error::{AnalysisError, BackendError, ChunkFailure, InputError};
pub use llm_backend::LlmSentimentBackend;
pub use pipeline::{PipelineMode, SingleItemAnalyzer, Stage};
pub use service::SentimentService;

/// Reference chunk size for batch requests.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default number of chunk requests in flight at once.
pub const DEFAULT_MAX_CONCURRENT_CHUNKS: usize = 4;
