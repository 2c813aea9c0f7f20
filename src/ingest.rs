//! Text ingestion from files.
//!
//! - `.txt`: the whole file is one text, or one text per non-blank line
//! - `.csv`: first column of every row after the header
//! - `.json`: an array of strings, or an array of objects with a `text` field

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors from reading input files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON input must be an array of strings or objects with a \"text\" field")]
    JsonShape,

    #[error("No texts found in {0}")]
    Empty(String),
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Text,
    Csv,
    Json,
}

impl InputFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" | "text" | "" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(IngestError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Read texts from a file, detecting the format from its extension.
///
/// `split_lines` only affects plain text files.
pub async fn read_texts(path: &Path, split_lines: bool) -> Result<Vec<String>, IngestError> {
    let format = InputFormat::from_path(path)?;
    let contents = tokio::fs::read_to_string(path).await?;
    let texts = parse_texts(&contents, format, split_lines)?;

    if texts.is_empty() {
        return Err(IngestError::Empty(path.display().to_string()));
    }
    Ok(texts)
}

/// Parse texts from file contents. Blank entries are dropped.
pub fn parse_texts(
    contents: &str,
    format: InputFormat,
    split_lines: bool,
) -> Result<Vec<String>, IngestError> {
    let texts: Vec<String> = match format {
        InputFormat::Text if split_lines => contents.lines().map(str::to_string).collect(),
        InputFormat::Text => vec![contents.trim().to_string()],
        InputFormat::Csv => parse_csv_first_column(contents),
        InputFormat::Json => parse_json(contents)?,
    };

    Ok(texts
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Text(String),
    Object { text: String },
}

fn parse_json(contents: &str) -> Result<Vec<String>, IngestError> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    if !value.is_array() {
        return Err(IngestError::JsonShape);
    }
    let entries: Vec<JsonEntry> =
        serde_json::from_value(value).map_err(|_| IngestError::JsonShape)?;

    Ok(entries
        .into_iter()
        .map(|e| match e {
            JsonEntry::Text(t) | JsonEntry::Object { text: t } => t,
        })
        .collect())
}

/// First column of each CSV record, skipping the header row.
fn parse_csv_first_column(contents: &str) -> Vec<String> {
    split_csv_records(contents)
        .into_iter()
        .skip(1)
        .filter_map(|record| record.into_iter().next())
        .collect()
}

/// Split CSV into records of fields. Handles quoted fields containing
/// commas, doubled quotes and newlines.
fn split_csv_records(contents: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}
