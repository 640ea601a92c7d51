//! Validation of the model's JSON reply.

use super::SentimentError;
use crate::models::SentimentMap;
use chrono::NaiveDate;
use serde_json::Value;

/// Highest score the model may return.
pub const MAX_SCORE: u8 = 100;

/// Parse a reply of the form `{"2024-01-01": 80, ...}`.
///
/// The whole reply is rejected on the first invalid key or value; a
/// partially valid mapping is never returned.
pub fn parse_sentiment_reply(reply: &str) -> Result<SentimentMap, SentimentError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(SentimentError::EmptyReply);
    }

    let value: Value = serde_json::from_str(trimmed)?;
    let object = value.as_object().ok_or(SentimentError::NotAnObject)?;

    let mut scores = SentimentMap::new();
    for (key, raw) in object {
        let date = NaiveDate::parse_from_str(key, "%Y-%m-%d")
            .map_err(|_| SentimentError::InvalidDate(key.clone()))?;

        let score = raw
            .as_u64()
            .filter(|s| *s <= MAX_SCORE as u64)
            .ok_or_else(|| SentimentError::InvalidScore {
                date: key.clone(),
                value: raw.to_string(),
            })?;

        scores.insert(date, score as u8);
    }

    Ok(scores)
}
