//! Sentiment analysis command.

use std::path::Path;
use std::sync::Arc;

use console::style;
use indicatif::ProgressBar;
use tokio::sync::mpsc;

use crate::analysis::{BatchEvent, SentimentService};
use crate::export::ExportFormat;
use crate::ingest;
use crate::models::{AnalysisResult, Sentiment, SentimentDistribution};

use super::helpers::{batch_bar, spinner, styled_sentiment, truncate};

/// How `analyze` prints its results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing with a distribution summary
    #[default]
    Table,
    Json,
    Jsonl,
    Csv,
    Txt,
}

impl OutputFormat {
    /// Export encoding for this format. Tables fall back to the text report
    /// when written to a file.
    fn export_format(self) -> Option<ExportFormat> {
        match self {
            Self::Table => None,
            Self::Json => Some(ExportFormat::Json),
            Self::Jsonl => Some(ExportFormat::Jsonl),
            Self::Csv => Some(ExportFormat::Csv),
            Self::Txt => Some(ExportFormat::Txt),
        }
    }
}

/// Analyze texts given on the command line and/or read from a file.
pub async fn cmd_analyze(
    service: &SentimentService,
    mut texts: Vec<String>,
    file: Option<&Path>,
    lines: bool,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = file {
        let from_file = ingest::read_texts(path, lines).await?;
        tracing::info!("Read {} texts from {}", from_file.len(), path.display());
        texts.extend(from_file);
    }

    if texts.is_empty() {
        anyhow::bail!("Nothing to analyze: pass texts as arguments or use --file");
    }

    let submitted = texts.iter().filter(|t| !t.trim().is_empty()).count();

    let result = if submitted > 1 {
        run_with_progress(service, &texts).await
    } else {
        let busy = spinner("Analyzing sentiment...");
        let result = service.analyze_texts(&texts, None).await;
        busy.finish_and_clear();
        result
    };

    let run = match result {
        Ok(run) => run,
        Err(e) => {
            eprintln!(
                "{} {}: {}",
                style("✗").red(),
                e.category(),
                e.user_message()
            );
            return Err(anyhow::anyhow!(e));
        }
    };

    match output {
        Some(path) => {
            let encoding = format.export_format().unwrap_or(ExportFormat::Txt);
            tokio::fs::write(path, encoding.encode(&run.results)?).await?;
            println!(
                "{} Wrote {} results to {}",
                style("✓").green(),
                run.len(),
                path.display()
            );
        }
        None => match format.export_format() {
            Some(encoding) => println!("{}", encoding.encode(&run.results)?),
            None => print_table(&run.results),
        },
    }

    if run.len() < submitted {
        eprintln!(
            "{} {} of {} texts could not be analyzed",
            style("!").yellow(),
            submitted - run.len(),
            submitted
        );
    }

    Ok(())
}

/// Run a batch, rendering chunk events on a progress bar.
async fn run_with_progress(
    service: &SentimentService,
    texts: &[String],
) -> Result<crate::models::AnalysisRun, crate::analysis::AnalysisError> {
    let (event_tx, mut event_rx) = mpsc::channel::<BatchEvent>(100);

    // The spinner is replaced by a bar once the chunk count is known
    let busy = spinner("Analyzing sentiment...");
    let pb = Arc::new(tokio::sync::Mutex::new(None::<ProgressBar>));
    let pb_clone = pb.clone();

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                BatchEvent::Started {
                    total_texts,
                    chunks,
                } => {
                    busy.finish_and_clear();
                    let progress = batch_bar(total_texts);
                    progress.set_message(format!("{} chunks", chunks));
                    *pb_clone.lock().await = Some(progress);
                }
                BatchEvent::ChunkCompleted {
                    offset,
                    texts,
                    rejected,
                    ..
                } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        if rejected > 0 {
                            progress.println(format!(
                                "{} Chunk at {}: {} items dropped",
                                style("!").yellow(),
                                offset,
                                rejected
                            ));
                        }
                        progress.inc(texts as u64);
                    }
                }
                BatchEvent::ChunkFailed {
                    offset,
                    len,
                    texts,
                    error,
                } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.println(format!(
                            "{} Texts {}-{}: {}",
                            style("✗").red(),
                            offset + 1,
                            offset + len,
                            error
                        ));
                        progress.inc(texts as u64);
                    }
                }
                BatchEvent::Complete {
                    analyzed,
                    failed_chunks,
                } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.finish_and_clear();
                    }
                    *pb_clone.lock().await = None;

                    if failed_chunks > 0 {
                        eprintln!(
                            "{} Analyzed {} texts, {} chunks failed",
                            style("!").yellow(),
                            analyzed,
                            failed_chunks
                        );
                    }
                }
            }
        }
        busy.finish_and_clear();
    });

    let result = service.analyze_texts(texts, Some(&event_tx)).await;

    // Close the channel so the handler drains and exits
    drop(event_tx);
    let _ = event_handler.await;

    if let Some(progress) = pb.lock().await.take() {
        progress.finish_and_clear();
    }

    result
}

fn print_table(results: &[AnalysisResult]) {
    println!("\n{}", style("Sentiment Analysis").bold());
    println!("{}", "-".repeat(60));

    for result in results {
        println!(
            "{:<10} {:>5}  {}",
            styled_sentiment(result.sentiment),
            result.confidence_percent(),
            truncate(&result.text, 60)
        );
        if !result.drivers.is_empty() {
            println!(
                "{:<17} {}",
                "",
                style(format!("drivers: {}", result.drivers.join(", "))).dim()
            );
        }
        println!("{:<17} {}", "", style(&result.explanation).dim());
    }

    let dist = SentimentDistribution::from_results(results);
    println!("{}", "-".repeat(60));
    for sentiment in Sentiment::ALL {
        println!(
            "{:<10} {:>4} ({:.0}%)",
            styled_sentiment(sentiment),
            dist.count(sentiment),
            dist.share(sentiment) * 100.0
        );
    }
    println!(
        "{:<10} {:>4}  mean confidence {:.0}%",
        "Total",
        dist.total,
        dist.mean_confidence * 100.0
    );
}
