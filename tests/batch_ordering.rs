//! Batch ordering tests.
//!
//! Drives the public analysis API with a deterministic in-process backend that
//! answers chunks out of order, and checks results always come back in input
//! order with failed chunks dropped as a unit.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sentiscope::analysis::backend::{
    AnalyzeRequest, AnalyzeResponse, BatchRequest, BatchResponse, BatchResultItem,
    ClassifyRequest, ClassifyResponse, DriversRequest, DriversResponse, ExplainRequest,
    ExplainResponse,
};
use sentiscope::analysis::{
    partition, AnalysisError, BackendError, BatchOrchestrator, InputError, SentimentBackend,
    SentimentService,
};
use sentiscope::config::AnalysisConfig;
use sentiscope::llm::LlmError;
use sentiscope::models::Sentiment;

fn label_for(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if lower.contains("great") || lower.contains("love") {
        "positive"
    } else if lower.contains("terrible") || lower.contains("hate") {
        "negative"
    } else {
        "neutral"
    }
}

/// Keyword backend that reverses every batch response.
#[derive(Default)]
struct ReversingBackend {
    /// Chunks whose first text is listed here fail.
    failing: HashSet<String>,
    /// Chunks whose first text is listed here come back empty.
    empty: HashSet<String>,
    calls: AtomicUsize,
    chunk_sizes: Mutex<Vec<usize>>,
}

impl ReversingBackend {
    fn failing_on(first_texts: &[&str]) -> Self {
        Self {
            failing: first_texts.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn chunk_sizes(&self) -> Vec<usize> {
        let mut sizes = self.chunk_sizes.lock().unwrap().clone();
        sizes.sort_unstable();
        sizes
    }
}

#[async_trait]
impl SentimentBackend for ReversingBackend {
    fn name(&self) -> &str {
        "reversing"
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ClassifyResponse {
            sentiment: label_for(&request.text).to_string(),
            confidence: 0.9,
        })
    }

    async fn extract_drivers(
        &self,
        request: &DriversRequest,
    ) -> Result<DriversResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DriversResponse {
            drivers: request
                .text
                .split_whitespace()
                .take(2)
                .map(str::to_string)
                .collect(),
        })
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<ExplainResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExplainResponse {
            explanation: format!("Driven by {}", request.keywords.join(", ")),
        })
    }

    async fn analyze_one(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AnalyzeResponse {
            sentiment: label_for(&request.text).to_string(),
            confidence: 0.9,
            drivers: vec![],
            explanation: "single".to_string(),
        })
    }

    async fn analyze_batch(&self, request: &BatchRequest) -> Result<BatchResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chunk_sizes.lock().unwrap().push(request.texts.len());

        let first = request.texts.first().cloned().unwrap_or_default();
        if self.failing.contains(&first) {
            return Err(BackendError::Llm(LlmError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            }));
        }
        if self.empty.contains(&first) {
            return Ok(BatchResponse { results: vec![] });
        }

        let results = request
            .texts
            .iter()
            .enumerate()
            .rev()
            .map(|(i, text)| BatchResultItem {
                sentiment: label_for(text).to_string(),
                confidence: 0.8,
                drivers: vec![text.clone()],
                explanation: format!("item {}", i),
                original_index: i as f64,
            })
            .collect();
        Ok(BatchResponse { results })
    }
}

/// Backend that replays one fixed batch response.
struct FixedBackend {
    response: BatchResponse,
}

#[async_trait]
impl SentimentBackend for FixedBackend {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn classify(&self, _: &ClassifyRequest) -> Result<ClassifyResponse, BackendError> {
        Err(BackendError::Malformed("not scripted".to_string()))
    }

    async fn extract_drivers(&self, _: &DriversRequest) -> Result<DriversResponse, BackendError> {
        Err(BackendError::Malformed("not scripted".to_string()))
    }

    async fn explain(&self, _: &ExplainRequest) -> Result<ExplainResponse, BackendError> {
        Err(BackendError::Malformed("not scripted".to_string()))
    }

    async fn analyze_one(&self, _: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError> {
        Err(BackendError::Malformed("not scripted".to_string()))
    }

    async fn analyze_batch(&self, _: &BatchRequest) -> Result<BatchResponse, BackendError> {
        Ok(self.response.clone())
    }
}

fn texts(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match i % 3 {
            0 => format!("great thing {}", i),
            1 => format!("terrible thing {}", i),
            _ => format!("plain thing {}", i),
        })
        .collect()
}

fn service(backend: Arc<ReversingBackend>, chunk_size: usize, concurrency: usize) -> SentimentService {
    let config = AnalysisConfig {
        chunk_size,
        max_concurrent_chunks: concurrency,
        ..Default::default()
    };
    SentimentService::new(backend, &config)
}

#[tokio::test]
async fn test_results_follow_input_order_across_chunks() {
    let input = texts(23);
    let backend = Arc::new(ReversingBackend::default());
    let service = service(backend.clone(), 5, 3);

    let run = service.analyze_texts(&input, None).await.unwrap();

    assert_eq!(run.results.len(), input.len());
    for (i, result) in run.results.iter().enumerate() {
        assert_eq!(result.text, input[i]);
        assert_eq!(result.id, format!("{}-{}", run.id.simple(), i));
        assert_eq!(result.drivers, vec![input[i].clone()]);
    }
    assert_eq!(backend.chunk_sizes(), vec![3, 5, 5, 5, 5]);
}

#[tokio::test]
async fn test_one_failed_chunk_drops_only_its_texts() {
    let input = texts(12);
    // Chunks of 4 start at 0, 4 and 8; fail the middle one
    let backend = Arc::new(ReversingBackend::failing_on(&[input[4].as_str()]));
    let service = service(backend, 4, 2);

    let run = service.analyze_texts(&input, None).await.unwrap();

    let got: Vec<&str> = run.results.iter().map(|r| r.text.as_str()).collect();
    let expected: Vec<&str> = input[..4]
        .iter()
        .chain(&input[8..])
        .map(String::as_str)
        .collect();
    assert_eq!(got, expected);

    // Ids keep the caller's original positions
    let ids: Vec<String> = run
        .results
        .iter()
        .map(|r| r.id.rsplit('-').next().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["0", "1", "2", "3", "8", "9", "10", "11"]);
}

#[tokio::test]
async fn test_empty_chunk_response_counts_as_failure() {
    let input = texts(6);
    let backend = Arc::new(ReversingBackend {
        empty: [input[3].clone()].into_iter().collect(),
        ..Default::default()
    });
    let orchestrator = BatchOrchestrator::new(backend, 3, 2);

    let outcome = orchestrator.run(&input, None).await.unwrap();

    assert_eq!(outcome.analyzed(), 3);
    assert!(outcome.is_partial());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].offset, 3);
    assert!(matches!(
        outcome.failures[0].cause,
        BackendError::EmptyBatchResponse
    ));
}

#[tokio::test]
async fn test_all_chunks_failing_is_total_failure() {
    let input = texts(6);
    let backend = Arc::new(ReversingBackend::failing_on(&[
        input[0].as_str(),
        input[3].as_str(),
    ]));
    let service = service(backend, 3, 4);

    let err = service.analyze_multiple_texts(&input).await.unwrap_err();

    match err {
        AnalysisError::AllChunksFailed { chunks, failures } => {
            assert_eq!(chunks, 2);
            let offsets: Vec<usize> = failures.iter().map(|f| f.offset).collect();
            assert_eq!(offsets, vec![0, 3]);
        }
        other => panic!("expected total failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_single_text_never_reaches_backend() {
    let backend = Arc::new(ReversingBackend::default());
    let service = service(backend.clone(), 100, 4);

    for text in ["", "   ", "\n\t"] {
        let err = service.analyze_single_text(text).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Input(InputError::EmptyText)));
    }
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let input = texts(17);
    let backend = Arc::new(ReversingBackend::default());
    let service = service(backend, 4, 4);

    let first = service.analyze_texts(&input, None).await.unwrap();
    let second = service.analyze_texts(&input, None).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.results.len(), second.results.len());
    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.text, b.text);
        assert_eq!(a.sentiment, b.sentiment);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.drivers, b.drivers);
        assert_eq!(a.explanation, b.explanation);
    }
}

#[test]
fn test_partition_boundaries() {
    let exact = texts(100);
    let chunks = partition(&exact, 100);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].len(), 100);

    let over = texts(101);
    let chunks = partition(&over, 100);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].offset, 100);
    assert_eq!(chunks[1].len(), 1);
}

#[tokio::test]
async fn test_out_of_order_chunk_is_reassembled() {
    let item = |index: f64, sentiment: &str| BatchResultItem {
        sentiment: sentiment.to_string(),
        confidence: 0.9,
        drivers: vec![],
        explanation: String::new(),
        original_index: index,
    };
    let backend = Arc::new(FixedBackend {
        response: BatchResponse {
            results: vec![
                item(2.0, "neutral"),
                item(0.0, "positive"),
                item(1.0, "negative"),
            ],
        },
    });
    let orchestrator = BatchOrchestrator::new(backend, 100, 1);
    let input: Vec<String> = ["great product", "terrible service", "it was fine"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let results = orchestrator.analyze_batch(&input).await.unwrap();

    let sentiments: Vec<Sentiment> = results.iter().map(|r| r.sentiment).collect();
    assert_eq!(
        sentiments,
        vec![Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral]
    );
}

#[tokio::test]
async fn test_bad_and_duplicate_indices_drop_single_items() {
    let item = |index: f64, sentiment: &str| BatchResultItem {
        sentiment: sentiment.to_string(),
        confidence: 0.5,
        drivers: vec![],
        explanation: String::new(),
        original_index: index,
    };
    let backend = Arc::new(FixedBackend {
        response: BatchResponse {
            results: vec![
                item(1.0, "negative"),
                item(7.0, "positive"),
                item(1.0, "positive"),
                item(0.0, "positive"),
            ],
        },
    });
    let orchestrator = BatchOrchestrator::new(backend, 100, 1);
    let input: Vec<String> = vec!["a".into(), "b".into(), "c".into()];

    let outcome = orchestrator.run(&input, None).await.unwrap();

    let placed: Vec<(usize, Sentiment)> = outcome
        .items
        .iter()
        .map(|i| (i.index, i.analysis.sentiment))
        .collect();
    assert_eq!(
        placed,
        vec![(0, Sentiment::Positive), (1, Sentiment::Negative)]
    );
    assert_eq!(outcome.rejected_items, 2);
}
