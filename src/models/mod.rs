//! Data models for sentiscope.

mod distribution;
mod sentiment;

pub use distribution::SentimentDistribution;
pub use sentiment::{AnalysisResult, AnalysisRun, Sentiment, SentimentAnalysis};
