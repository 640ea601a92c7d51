//! LLM-backed sentiment scoring.
//!
//! This module renders the scoring prompt, talks to an OpenAI-compatible
//! chat completion endpoint, and validates the model's JSON reply.

pub mod client;
pub mod prompt;
pub mod reply;

pub use client::{ChatBackend, ClientConfig, OpenAiBackend, SentimentClient};

/// Errors raised while scoring one author.
#[derive(Debug, thiserror::Error)]
pub enum SentimentError {
    #[error("request to the completion API failed: {0}")]
    Request(String),

    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned an empty reply")]
    EmptyReply,

    #[error("model reply is not valid JSON: {0}")]
    MalformedReply(#[from] serde_json::Error),

    #[error("model reply is not a JSON object")]
    NotAnObject,

    #[error("model reply has a non-date key: {0:?}")]
    InvalidDate(String),

    #[error("model reply has an invalid score for {date}: {value}")]
    InvalidScore { date: String, value: String },
}
