//! Tweet source backed by a JSON export.
//!
//! The export is a JSON array of tweet records as produced by an external
//! scraper. The file is read on every fetch so a scraper can refresh it
//! between runs.

use super::TweetSource;
use crate::models::Tweet;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads tweets from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record of the export.
    pub async fn load_all(&self) -> Result<Vec<Tweet>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read tweet file: {}", self.path.display()))?;

        let tweets: Vec<Tweet> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tweet file: {}", self.path.display()))?;

        debug!("Loaded {} tweets from {}", tweets.len(), self.path.display());
        Ok(tweets)
    }
}

#[async_trait]
impl TweetSource for JsonFileSource {
    async fn fetch_tweets(&self, handle: &str) -> Result<Vec<Tweet>> {
        let tweets: Vec<Tweet> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|t| t.author.username.eq_ignore_ascii_case(handle))
            .collect();

        info!("Fetched {} tweets for @{}", tweets.len(), handle);
        Ok(tweets)
    }
}
