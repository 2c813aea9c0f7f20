//! Batch orchestration.
//!
//! Splits the input into contiguous chunks, dispatches each chunk to the
//! backend's batch call, and reassembles the results in input order. The
//! backend reports each item's position within its chunk; the global position
//! is `chunk offset + local index` and the merged list is stably sorted on it.
//!
//! A chunk that fails or returns nothing usable is logged and skipped. The run
//! fails only when no chunk produced any result.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{BatchRequest, BatchResultItem, ChunkItem, SentimentBackend};
use super::error::{AnalysisError, BackendError, ChunkFailure, InputError};
use crate::models::SentimentAnalysis;

/// Events emitted while a batch runs.
///
/// `offset` and `len` describe the span of the caller's input a chunk covers;
/// `texts` is how many texts were actually sent for it.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Batch started
    Started { total_texts: usize, chunks: usize },
    /// Chunk returned usable results
    ChunkCompleted {
        offset: usize,
        len: usize,
        texts: usize,
        analyzed: usize,
        rejected: usize,
    },
    /// Chunk contributed nothing
    ChunkFailed {
        offset: usize,
        len: usize,
        texts: usize,
        error: String,
    },
    /// All chunks settled
    Complete {
        analyzed: usize,
        failed_chunks: usize,
    },
}

/// A contiguous slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Position of the chunk's first text in the full input.
    pub offset: usize,
    pub texts: &'a [String],
}

impl Chunk<'_> {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Partition `texts` into chunks of at most `chunk_size` (minimum 1).
pub fn partition(texts: &[String], chunk_size: usize) -> Vec<Chunk<'_>> {
    let size = chunk_size.max(1);
    texts
        .chunks(size)
        .enumerate()
        .map(|(i, texts)| Chunk {
            offset: i * size,
            texts,
        })
        .collect()
}

/// An analysis tagged with its position in the caller's input.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedAnalysis {
    pub index: usize,
    pub analysis: SentimentAnalysis,
}

/// Everything a batch run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Successful analyses, ascending by `index`.
    pub items: Vec<IndexedAnalysis>,
    /// Chunks that contributed nothing.
    pub failures: Vec<ChunkFailure>,
    /// Individual items dropped from otherwise successful chunks.
    pub rejected_items: usize,
    pub total_chunks: usize,
}

impl BatchOutcome {
    pub fn analyzed(&self) -> usize {
        self.items.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() || self.rejected_items > 0
    }
}

struct ChunkOutcome {
    /// Position of the chunk's first text in the submitted list.
    first: usize,
    offset: usize,
    len: usize,
    result: Result<ReconciledChunk, BackendError>,
}

struct ReconciledChunk {
    items: Vec<ChunkItem>,
    rejected: usize,
}

/// Runs chunked batch analysis against a backend.
#[derive(Clone)]
pub struct BatchOrchestrator {
    backend: Arc<dyn SentimentBackend>,
    chunk_size: usize,
    max_concurrent_chunks: usize,
}

impl BatchOrchestrator {
    pub fn new(
        backend: Arc<dyn SentimentBackend>,
        chunk_size: usize,
        max_concurrent_chunks: usize,
    ) -> Self {
        Self {
            backend,
            chunk_size: chunk_size.max(1),
            max_concurrent_chunks: max_concurrent_chunks.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn max_concurrent_chunks(&self) -> usize {
        self.max_concurrent_chunks
    }

    /// Analyze `texts`, returning analyses in input order.
    pub async fn analyze_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<SentimentAnalysis>, AnalysisError> {
        let outcome = self.run(texts, None).await?;
        Ok(outcome.items.into_iter().map(|i| i.analysis).collect())
    }

    /// Analyze `texts`, keeping per-item indices and per-chunk failures.
    pub async fn run(
        &self,
        texts: &[String],
        events: Option<&mpsc::Sender<BatchEvent>>,
    ) -> Result<BatchOutcome, AnalysisError> {
        self.run_at(texts, None, events).await
    }

    /// Like [`run`](Self::run), for texts picked out of a larger input.
    ///
    /// `positions[i]` is where `texts[i]` sits in the caller's input. Item
    /// indices, chunk failures and events are all reported in those positions.
    pub(crate) async fn run_at(
        &self,
        texts: &[String],
        positions: Option<&[usize]>,
        events: Option<&mpsc::Sender<BatchEvent>>,
    ) -> Result<BatchOutcome, AnalysisError> {
        if texts.is_empty() {
            return Err(InputError::EmptyBatch.into());
        }

        let chunks = partition(texts, self.chunk_size);
        let total_chunks = chunks.len();
        info!(
            "Analyzing {} texts in {} chunks via {} (concurrency {})",
            texts.len(),
            total_chunks,
            self.backend.name(),
            self.max_concurrent_chunks
        );
        emit(
            events,
            BatchEvent::Started {
                total_texts: texts.len(),
                chunks: total_chunks,
            },
        )
        .await;

        // Owned requests keep the dispatch futures free of borrowed input
        let requests: Vec<(usize, BatchRequest)> = chunks
            .iter()
            .map(|chunk| {
                (
                    chunk.offset,
                    BatchRequest {
                        texts: chunk.texts.to_vec(),
                    },
                )
            })
            .collect();

        let outcomes: Vec<ChunkOutcome> = stream::iter(requests)
            .map(move |(first, request)| self.dispatch(first, request, positions, events))
            .buffer_unordered(self.max_concurrent_chunks)
            .collect()
            .await;

        let mut items = Vec::new();
        let mut failures = Vec::new();
        let mut rejected_items = 0;
        for outcome in outcomes {
            match outcome.result {
                Ok(chunk) => {
                    rejected_items += chunk.rejected;
                    items.extend(chunk.items.into_iter().map(|item| IndexedAnalysis {
                        index: caller_index(positions, outcome.first + item.local_index),
                        analysis: item.analysis,
                    }));
                }
                Err(cause) => failures.push(ChunkFailure {
                    offset: outcome.offset,
                    len: outcome.len,
                    cause,
                }),
            }
        }
        items.sort_by_key(|item| item.index);
        failures.sort_by_key(|f| f.offset);

        info!(
            "Batch complete: {} analyzed, {} of {} chunks failed, {} items rejected",
            items.len(),
            failures.len(),
            total_chunks,
            rejected_items
        );
        emit(
            events,
            BatchEvent::Complete {
                analyzed: items.len(),
                failed_chunks: failures.len(),
            },
        )
        .await;

        if items.is_empty() {
            return Err(AnalysisError::AllChunksFailed {
                chunks: total_chunks,
                failures,
            });
        }

        Ok(BatchOutcome {
            items,
            failures,
            rejected_items,
            total_chunks,
        })
    }

    async fn dispatch(
        &self,
        first: usize,
        request: BatchRequest,
        positions: Option<&[usize]>,
        events: Option<&mpsc::Sender<BatchEvent>>,
    ) -> ChunkOutcome {
        let texts = request.texts.len();
        let offset = caller_index(positions, first);
        let len = caller_index(positions, first + texts.saturating_sub(1)) + 1 - offset;
        debug!("Dispatching chunk at offset {} ({} texts)", offset, texts);

        let result = match self.backend.analyze_batch(&request).await {
            Ok(response) => reconcile(offset, texts, response.results),
            Err(e) => Err(e),
        };

        match &result {
            Ok(reconciled) => {
                emit(
                    events,
                    BatchEvent::ChunkCompleted {
                        offset,
                        len,
                        texts,
                        analyzed: reconciled.items.len(),
                        rejected: reconciled.rejected,
                    },
                )
                .await
            }
            Err(e) => {
                warn!(
                    "Chunk at offset {} ({} texts) failed: {}",
                    offset, texts, e
                );
                emit(
                    events,
                    BatchEvent::ChunkFailed {
                        offset,
                        len,
                        texts,
                        error: e.user_message(),
                    },
                )
                .await
            }
        }

        ChunkOutcome {
            first,
            offset,
            len,
            result,
        }
    }
}

/// Validate a chunk's items.
///
/// Items that cannot be placed (bad or duplicate index) are dropped one by
/// one; the first item claiming a local index wins so valid siblings are never
/// displaced. An invalid label or confidence anywhere fails the whole chunk.
fn reconcile(
    offset: usize,
    len: usize,
    results: Vec<BatchResultItem>,
) -> Result<ReconciledChunk, BackendError> {
    if results.is_empty() {
        return Err(BackendError::EmptyBatchResponse);
    }

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(results.len().min(len));
    let mut rejected = 0;

    for raw in results {
        let checked = raw.into_chunk_item(len).and_then(|item| {
            if seen.insert(item.local_index) {
                Ok(item)
            } else {
                Err(BackendError::DuplicateIndex(item.local_index))
            }
        });

        match checked {
            Ok(item) => items.push(item),
            Err(e) if e.is_placement_error() => {
                warn!("Dropping item from chunk at offset {}: {}", offset, e);
                rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if items.is_empty() {
        return Err(BackendError::NoValidItems { rejected });
    }

    Ok(ReconciledChunk { items, rejected })
}

/// Map a position in the submitted list to the caller's input.
fn caller_index(positions: Option<&[usize]>, index: usize) -> usize {
    positions
        .and_then(|p| p.get(index).copied())
        .unwrap_or(index)
}

async fn emit(events: Option<&mpsc::Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
