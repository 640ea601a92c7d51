//! Per-author prompt batching.
//!
//! Renders one author's recent tweets as a date-grouped text block so a
//! single LLM request can score every day at once.

use crate::models::{TweetRow, TweetTable};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::debug;

/// Maximum number of tweets sent for one author.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Random source for tweet sampling, reproducible when `seed` is set.
pub fn sampling_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Render the tweets of `handle` grouped by date.
///
/// Output looks like:
///
/// ```text
/// 2024-01-01:
/// first tweet of the day
/// second tweet of the day
/// 2024-01-02:
/// another tweet
/// ```
///
/// When more than `sample_size` rows match, exactly `sample_size` of them
/// are drawn at random without replacement. Returns an empty string when
/// the author has no rows.
pub fn render_author_block<R: Rng + ?Sized>(
    table: &TweetTable,
    handle: &str,
    sample_size: usize,
    rng: &mut R,
) -> String {
    let rows: Vec<&TweetRow> = table.rows_for_author(handle).collect();
    if rows.is_empty() {
        return String::new();
    }

    let selected: Vec<&TweetRow> = if rows.len() > sample_size {
        debug!(
            "Sampling {} of {} tweets for @{}",
            sample_size,
            rows.len(),
            handle
        );
        let mut picked = index::sample(rng, rows.len(), sample_size).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| rows[i]).collect()
    } else {
        rows
    };

    let mut by_date: BTreeMap<_, Vec<&str>> = BTreeMap::new();
    for row in &selected {
        by_date.entry(row.date).or_default().push(row.text.as_str());
    }

    let mut lines = Vec::with_capacity(selected.len() + by_date.len());
    for (date, texts) in &by_date {
        lines.push(format!("{}:", date.format("%Y-%m-%d")));
        lines.extend(texts.iter().map(|t| t.to_string()));
    }

    lines.join("\n")
}
