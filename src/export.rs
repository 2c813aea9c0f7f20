//! Result export encodings.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::models::{AnalysisResult, Sentiment, SentimentDistribution};

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Jsonl,
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            "csv" => Some(Self::Csv),
            "txt" | "text" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Jsonl => "application/x-ndjson",
            Self::Csv => "text/csv",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }

    /// Default download filename.
    pub fn filename(&self) -> String {
        format!("sentiment-analysis.{}", self.extension())
    }

    /// Encode `results` in this format.
    pub fn encode(&self, results: &[AnalysisResult]) -> Result<String, serde_json::Error> {
        match self {
            Self::Json => serde_json::to_string_pretty(results),
            Self::Jsonl => {
                let mut out = String::new();
                for result in results {
                    out.push_str(&serde_json::to_string(result)?);
                    out.push('\n');
                }
                Ok(out)
            }
            Self::Csv => Ok(to_csv(results)),
            Self::Txt => Ok(to_report(results)),
        }
    }
}

const CSV_HEADER: &str = "id,text,sentiment,confidence,drivers,explanation";

fn to_csv(results: &[AnalysisResult]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for r in results {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            r.id,
            quote_csv(&r.text),
            r.sentiment,
            r.confidence,
            quote_csv(&r.drivers.join("; ")),
            quote_csv(&r.explanation)
        );
    }
    out
}

/// Quote a string field for CSV output.
fn quote_csv(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn to_report(results: &[AnalysisResult]) -> String {
    let dist = SentimentDistribution::from_results(results);
    let mut out = String::new();

    let _ = writeln!(out, "SENTIMENT ANALYSIS REPORT");
    let _ = writeln!(out, "=========================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Texts analyzed:  {}", dist.total);
    for sentiment in Sentiment::ALL {
        let _ = writeln!(
            out,
            "{:<16} {} ({:.0}%)",
            format!("{}:", sentiment.label()),
            dist.count(sentiment),
            dist.share(sentiment) * 100.0
        );
    }
    let _ = writeln!(
        out,
        "Mean confidence: {:.0}%",
        dist.mean_confidence * 100.0
    );

    for (i, r) in results.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Result {} ---", i + 1);
        let _ = writeln!(out, "Text: {}", r.text);
        let _ = writeln!(
            out,
            "Sentiment: {} ({} confidence)",
            r.sentiment.label(),
            r.confidence_percent()
        );
        if r.drivers.is_empty() {
            let _ = writeln!(out, "Drivers: (none)");
        } else {
            let _ = writeln!(out, "Drivers: {}", r.drivers.join(", "));
        }
        let _ = writeln!(out, "Explanation: {}", r.explanation);
    }
    out
}
