//! HTTP request handlers for the web server.

mod analyze;
mod export;
mod status;

pub use analyze::{analyze_batch, analyze_single, analyze_texts};
pub use export::export_results;
pub use status::{api_status, health};
