//! Data models for the sentiment tracker.
//!
//! This module contains the core data structures shared by the pipeline:
//! raw tweets, the normalized tweet table, per-author sentiment maps and
//! the aligned daily series.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Author metadata attached to a fetched tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetAuthor {
    /// Account handle without the leading `@`.
    pub username: String,
    /// Display name shown next to the handle.
    #[serde(default)]
    pub name: String,
    /// Follower count at fetch time.
    #[serde(default)]
    pub followers_count: u64,
}

/// A tweet as returned by the scraping collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    /// Unique tweet identifier.
    pub id: String,
    /// Raw tweet text.
    pub text: String,
    /// Author of the tweet.
    pub author: TweetAuthor,
    /// Creation timestamp (timezone-naive).
    pub created_at: NaiveDateTime,
    /// View count at fetch time.
    #[serde(default)]
    pub views: u64,
}

/// One cleaned row of the recent tweet window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetRow {
    pub id: String,
    pub text: String,
    pub author: String,
    pub views: u64,
    pub followers: u64,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Normalized tweets, newest first, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetTable {
    rows: Vec<TweetRow>,
}

impl TweetTable {
    /// Column names of every table, independent of its row count.
    pub const COLUMNS: [&'static str; 6] =
        ["text", "author", "views", "followers", "date", "created_at"];

    pub fn new(rows: Vec<TweetRow>) -> Self {
        Self { rows }
    }

    #[allow(dead_code)] // Utility for callers inspecting the table
    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TweetRow> {
        self.rows.iter()
    }

    #[allow(dead_code)] // Utility for callers inspecting the table
    pub fn rows(&self) -> &[TweetRow] {
        &self.rows
    }

    /// Rows written by `handle`, compared ASCII case-insensitively.
    pub fn rows_for_author<'a>(&'a self, handle: &'a str) -> impl Iterator<Item = &'a TweetRow> {
        self.rows
            .iter()
            .filter(move |row| row.author.eq_ignore_ascii_case(handle))
    }
}

/// Sentiment scores (0-100) for one author, keyed by date.
pub type SentimentMap = BTreeMap<NaiveDate, u8>;

/// Sentiment maps of all tracked authors in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSentiment {
    entries: Vec<(String, SentimentMap)>,
}

impl AuthorSentiment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the map for `handle`.
    ///
    /// A new handle is appended; an existing one keeps its position.
    pub fn insert(&mut self, handle: impl Into<String>, scores: SentimentMap) {
        let handle = handle.into();
        match self.entries.iter_mut().find(|(h, _)| *h == handle) {
            Some((_, existing)) => *existing = scores,
            None => self.entries.push((handle, scores)),
        }
    }

    #[allow(dead_code)] // Lookup utility
    pub fn get(&self, handle: &str) -> Option<&SentimentMap> {
        self.entries
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, scores)| scores)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SentimentMap)> {
        self.entries.iter().map(|(h, s)| (h.as_str(), s))
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedHandle {
    pub handle: String,
    pub display_name: String,
}

impl TrackedHandle {
    /// Profile link for the account.
    pub fn profile_url(&self) -> String {
        format!("https://twitter.com/{}", self.handle)
    }
}

/// A named column of the aligned series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesColumn {
    pub name: String,
    /// One value per date of the series; `None` means no score that day.
    pub values: Vec<Option<f64>>,
}

/// Daily sentiment over a fixed trailing calendar window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSeries {
    /// Row index, oldest first.
    pub dates: Vec<NaiveDate>,
    /// Author columns in registration order, followed by `Overall`.
    pub columns: Vec<SeriesColumn>,
}

impl SentimentSeries {
    /// Name of the synthetic cross-author average column.
    pub const OVERALL: &'static str = "Overall";

    /// True when no author column exists.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[allow(dead_code)]
    pub fn column(&self, name: &str) -> Option<&SeriesColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value of column `name` at `date`, flattened.
    #[allow(dead_code)] // Lookup utility
    pub fn value(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let row = self.dates.iter().position(|d| *d == date)?;
        self.column(name)?.values.get(row).copied().flatten()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    /// First date of the sentiment series.
    pub window_start: NaiveDate,
    /// Last date of the sentiment series.
    pub window_end: NaiveDate,
    /// Handles that failed to score.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_handles: Vec<String>,
}

/// The complete sentiment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Tracked accounts in registration order.
    pub handles: Vec<TrackedHandle>,
    /// Aligned daily sentiment.
    pub series: SentimentSeries,
    /// Recent tweet window, newest first.
    pub tweets: TweetTable,
}
