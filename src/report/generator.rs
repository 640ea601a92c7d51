//! Markdown and JSON report generation.
//!
//! This module renders the tracked handles, the aligned sentiment series
//! and the recent tweet window into a report.

use crate::models::{Report, ReportMetadata, SentimentSeries, TrackedHandle, TweetTable};
use anyhow::Result;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# AI Safety Sentiment Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_handles_section(&report.handles));
    output.push_str(&generate_series_section(&report.series));
    output.push_str(&generate_tweets_section(&report.tweets));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!(
        "- **Window:** {} to {}\n",
        metadata.window_start, metadata.window_end
    ));
    if !metadata.failed_handles.is_empty() {
        let failed: Vec<String> = metadata
            .failed_handles
            .iter()
            .map(|h| format!("@{}", h))
            .collect();
        section.push_str(&format!("- **Failed Handles:** {}\n", failed.join(", ")));
    }
    section.push('\n');

    section
}

/// Generate the tracked handles section.
fn generate_handles_section(handles: &[TrackedHandle]) -> String {
    let mut section = String::new();

    section.push_str("## Tracked Handles\n\n");
    if handles.is_empty() {
        section.push_str("No handles are being tracked.\n\n");
        return section;
    }

    for tracked in handles {
        section.push_str(&format!(
            "- {} ([@{}]({}))\n",
            escape_link_text(&tracked.display_name),
            tracked.handle,
            tracked.profile_url()
        ));
    }
    section.push('\n');

    section
}

/// Generate the sentiment table, one row per date.
fn generate_series_section(series: &SentimentSeries) -> String {
    let mut section = String::new();

    section.push_str("## Sentiment\n\n");
    if series.is_empty() {
        section.push_str("No sentiment data yet.\n\n");
        return section;
    }

    section.push_str("*0 = no AI risk concern, 100 = high safety concern*\n\n");

    let names: Vec<&str> = series.columns.iter().map(|c| c.name.as_str()).collect();
    section.push_str(&format!("| Date | {} |\n", names.join(" | ")));
    section.push_str(&format!("|:---|{}\n", ":---:|".repeat(names.len())));

    for (row, date) in series.dates.iter().enumerate() {
        let cells: Vec<String> = series
            .columns
            .iter()
            .map(|column| {
                let value = column.values.get(row).copied().flatten();
                format_score(value, column.name == SentimentSeries::OVERALL)
            })
            .collect();
        section.push_str(&format!("| {} | {} |\n", date, cells.join(" | ")));
    }
    section.push('\n');

    section
}

fn format_score(value: Option<f64>, averaged: bool) -> String {
    match value {
        Some(v) if averaged => format!("{:.1}", v),
        Some(v) => format!("{:.0}", v),
        None => "-".to_string(),
    }
}

/// Generate the recent tweets table.
fn generate_tweets_section(tweets: &TweetTable) -> String {
    let mut section = String::new();

    section.push_str("## Recent Tweets\n\n");
    if tweets.is_empty() {
        section.push_str("No tweets in the last 7 days.\n\n");
        return section;
    }

    section.push_str("| Date | Author | Views | Followers | Text |\n");
    section.push_str("|:---|:---|---:|---:|:---|\n");
    for row in tweets.iter() {
        section.push_str(&format!(
            "| {} | @{} | {} | {} | {} |\n",
            row.created_at.format("%Y-%m-%d %H:%M"),
            row.author,
            row.views,
            row.followers,
            escape_cell(&row.text)
        ));
    }
    section.push('\n');

    section
}

/// Escape text for a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Escape text shown in a Markdown list item next to a link.
fn escape_link_text(text: &str) -> String {
    escape_cell(text)
        .replace('[', "\\[")
        .replace(']', "\\]")
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by Safety Pulse*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to `path`, or stdout when `path` is `-`.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    use anyhow::Context;
    use std::io::Write;

    if path == Path::new("-") {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
