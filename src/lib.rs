//! Sentiscope - sentiment analysis over generative-AI backends.
//!
//! Classifies texts as positive, negative or neutral with a confidence score,
//! the phrases driving the sentiment, and a short explanation. Single texts run
//! through a staged or single-shot pipeline; larger sets are chunked and sent
//! to the backend concurrently, then reassembled in input order.

#![allow(clippy::should_implement_trait)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod export;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod server;
