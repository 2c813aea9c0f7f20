//! Aggregate sentiment counts over a result set.

use serde::Serialize;

use super::{AnalysisResult, Sentiment};

/// Per-sentiment counts and mean confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total: usize,
    /// Mean confidence, 0.0 for an empty set.
    pub mean_confidence: f64,
}

impl SentimentDistribution {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut dist = Self::default();
        let mut confidence_sum = 0.0;

        for result in results {
            match result.sentiment {
                Sentiment::Positive => dist.positive += 1,
                Sentiment::Negative => dist.negative += 1,
                Sentiment::Neutral => dist.neutral += 1,
            }
            confidence_sum += result.confidence;
        }

        dist.total = results.len();
        if dist.total > 0 {
            dist.mean_confidence = confidence_sum / dist.total as f64;
        }
        dist
    }

    pub fn count(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    /// Share of the total for a sentiment, 0.0 for an empty set.
    pub fn share(&self, sentiment: Sentiment) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(sentiment) as f64 / self.total as f64
        }
    }
}
