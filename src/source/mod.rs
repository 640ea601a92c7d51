//! Tweet sources.
//!
//! A source is the scraping collaborator: given a handle it returns that
//! account's recent tweets.

pub mod json_file;

pub use json_file::JsonFileSource;

use crate::models::Tweet;
use anyhow::Result;
use async_trait::async_trait;

/// Provider of recent tweets for an account.
#[async_trait]
pub trait TweetSource: Send + Sync {
    /// Fetch the recent tweets of `handle`.
    ///
    /// An unknown handle or an account without tweets yields an empty list.
    async fn fetch_tweets(&self, handle: &str) -> Result<Vec<Tweet>>;
}
