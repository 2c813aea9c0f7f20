//! Shared helper functions for CLI commands.

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};

use crate::models::Sentiment;

/// Truncate to at most `max` characters, collapsing whitespace so one text
/// stays on one line.
pub fn truncate(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Sentiment label colored for terminal output.
pub fn styled_sentiment(sentiment: Sentiment) -> StyledObject<&'static str> {
    let label = sentiment.label();
    match sentiment {
        Sentiment::Positive => style(label).green(),
        Sentiment::Negative => style(label).red(),
        Sentiment::Neutral => style(label).yellow(),
    }
}

/// Indeterminate spinner shown while the backend is busy.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Chunk progress bar over `total` texts.
pub fn batch_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    progress
}
