//! Session state for one run.
//!
//! A `Session` owns everything accumulated while handles are added: the
//! tweet log, the handle registry and the per-author sentiment. It is
//! created empty and dropped when the run ends.

use crate::analysis::align_series;
use crate::models::{AuthorSentiment, SentimentSeries, TrackedHandle, Tweet, TweetTable};
use crate::pipeline::normalize_tweets;
use crate::sentiment::{ChatBackend, SentimentClient};
use crate::source::TweetSource;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

/// Result of adding a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Registered and scored.
    Added {
        handle: String,
        tweets: usize,
        scored_dates: usize,
    },
    /// Already tracked; nothing changed.
    Duplicate(String),
    /// The source returned no tweets; nothing changed.
    NoTweets(String),
    /// The input was empty after stripping `@`.
    InvalidHandle,
}

/// Strip surrounding whitespace and one leading `@`.
pub fn normalize_handle(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

/// Accumulated state across handle additions.
#[derive(Debug, Default)]
pub struct Session {
    tweets: Vec<Tweet>,
    handles: Vec<TrackedHandle>,
    sentiment: AuthorSentiment,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn tweets(&self) -> &[Tweet] {
        &self.tweets
    }

    pub fn handles(&self) -> &[TrackedHandle] {
        &self.handles
    }

    #[allow(dead_code)]
    pub fn sentiment(&self) -> &AuthorSentiment {
        &self.sentiment
    }

    pub fn is_tracked(&self, handle: &str) -> bool {
        self.handles
            .iter()
            .any(|h| h.handle.eq_ignore_ascii_case(handle))
    }

    /// Fetch, score and register `raw_handle`.
    ///
    /// The session is only updated once scoring succeeds, so a failed
    /// handle leaves no trace and can be retried.
    pub async fn add_author<S, B>(
        &mut self,
        raw_handle: &str,
        source: &S,
        client: &SentimentClient<B>,
        now: NaiveDateTime,
    ) -> Result<AddOutcome>
    where
        S: TweetSource + ?Sized,
        B: ChatBackend,
    {
        let Some(handle) = normalize_handle(raw_handle) else {
            return Ok(AddOutcome::InvalidHandle);
        };

        if self.is_tracked(&handle) {
            debug!("@{} is already tracked", handle);
            return Ok(AddOutcome::Duplicate(handle));
        }

        let fetched = source
            .fetch_tweets(&handle)
            .await
            .with_context(|| format!("Failed to fetch tweets for @{}", handle))?;

        if fetched.is_empty() {
            info!("No tweets found for @{}", handle);
            return Ok(AddOutcome::NoTweets(handle));
        }

        let mut log = self.tweets.clone();
        log.extend(fetched.iter().cloned());

        let scores = client
            .score(&handle, &log, now)
            .await
            .with_context(|| format!("Failed to score sentiment for @{}", handle))?;

        let display_name = fetched
            .first()
            .map(|t| t.author.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| handle.clone());

        let outcome = AddOutcome::Added {
            handle: handle.clone(),
            tweets: fetched.len(),
            scored_dates: scores.len(),
        };

        self.tweets = log;
        self.handles.push(TrackedHandle {
            handle: handle.clone(),
            display_name,
        });
        self.sentiment.insert(handle, scores);

        Ok(outcome)
    }

    /// The recent tweet window over the whole log.
    pub fn recent_tweets(&self, now: NaiveDateTime) -> TweetTable {
        normalize_tweets(&self.tweets, now)
    }

    /// The aligned sentiment series ending at `today`.
    pub fn series(&self, today: NaiveDate) -> SentimentSeries {
        align_series(&self.sentiment, today)
    }
}
