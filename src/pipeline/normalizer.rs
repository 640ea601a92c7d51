//! Tweet normalization.
//!
//! Cleans raw tweet text, drops empty and duplicate tweets, and keeps
//! only the trailing window of recent days, newest first.

use crate::models::{Tweet, TweetRow, TweetTable};
use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Number of calendar days kept in the rolling window.
pub const WINDOW_DAYS: i64 = 7;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:http|www)\S*").expect("valid link pattern"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Strip links and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let without_links = LINK_RE.replace_all(text, "");
    WHITESPACE_RE
        .replace_all(&without_links, " ")
        .trim()
        .to_string()
}

/// Build the recent tweet table from the accumulated tweet log.
///
/// Keeps tweets whose date is strictly after `now - 7 days`, so a tweet
/// from exactly seven days ago is excluded. When the log repeats a tweet
/// id, the first occurrence wins.
pub fn normalize_tweets(tweets: &[Tweet], now: NaiveDateTime) -> TweetTable {
    if tweets.is_empty() {
        return TweetTable::default();
    }

    let cutoff = now.date() - Duration::days(WINDOW_DAYS);
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(tweets.len());

    for tweet in tweets {
        let text = clean_text(&tweet.text);
        if text.is_empty() {
            continue;
        }
        if !seen.insert(tweet.id.as_str()) {
            continue;
        }

        let date = tweet.created_at.date();
        if date <= cutoff {
            continue;
        }

        rows.push(TweetRow {
            id: tweet.id.clone(),
            text,
            author: tweet.author.username.clone(),
            views: tweet.views,
            followers: tweet.author.followers_count,
            date,
            created_at: tweet.created_at,
        });
    }

    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    debug!(
        "Normalized {} of {} tweets (cutoff {})",
        rows.len(),
        tweets.len(),
        cutoff
    );

    TweetTable::new(rows)
}
