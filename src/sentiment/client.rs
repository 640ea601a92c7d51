//! Chat completion client for sentiment scoring.
//!
//! `SentimentClient` owns the scoring workflow for one author and talks to
//! the model through a `ChatBackend`, normally `OpenAiBackend`.

use super::prompt::SentimentPrompt;
use super::reply::parse_sentiment_reply;
use super::SentimentError;
use crate::models::{SentimentMap, Tweet};
use crate::pipeline::{normalize_tweets, render_author_block, sampling_rng, DEFAULT_SAMPLE_SIZE};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for the completion client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Tweets per author sent to the model.
    pub sample_size: usize,
    /// Seed for the tweet sample; `None` draws from entropy.
    pub sample_seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model_name: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            timeout_seconds: 300,
            sample_size: DEFAULT_SAMPLE_SIZE,
            sample_seed: None,
        }
    }
}

/// A single-turn chat completion endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `prompt` as one user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, SentimentError>;
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI chat completions request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// OpenAI chat completions response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Backend for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiBackend {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    model_name: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl OpenAiBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, SentimentError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SentimentError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model_name: config.model_name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> Result<String, SentimentError> {
        let url = format!("{}/chat/completions", self.api_url);

        let request = ChatCompletionRequest {
            model: &self.model_name,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        debug!("Sending completion request to {} ({} chars)", url, prompt.len());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SentimentError::Request(format!(
                        "request timed out after {}s",
                        self.timeout_seconds
                    ))
                } else if e.is_connect() {
                    SentimentError::Request(format!("cannot connect to {}", self.api_url))
                } else {
                    SentimentError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Request(format!("failed to decode response: {}", e)))?;

        reply_text(completion)
    }
}

/// Error for a non-2xx completion response.
fn api_error(status: reqwest::StatusCode, body: String) -> SentimentError {
    SentimentError::Api {
        status: status.as_u16(),
        body,
    }
}

/// Text of the first choice; a missing choice or `null` content is an empty reply.
fn reply_text(completion: ChatCompletionResponse) -> Result<String, SentimentError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(SentimentError::EmptyReply)
}

/// Scores one author's recent tweets.
pub struct SentimentClient<B> {
    backend: B,
    sample_size: usize,
    sample_seed: Option<u64>,
}

impl<B: ChatBackend> SentimentClient<B> {
    pub fn new(backend: B, config: &ClientConfig) -> Self {
        Self {
            backend,
            sample_size: config.sample_size,
            sample_seed: config.sample_seed,
        }
    }

    #[allow(dead_code)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Score `handle` from the full tweet log.
    ///
    /// The log is normalized and batched here, so callers pass every
    /// tweet collected so far. Makes one request per call; an author with
    /// no recent tweets yields an empty map without calling the model.
    pub async fn score(
        &self,
        handle: &str,
        tweets: &[Tweet],
        now: NaiveDateTime,
    ) -> Result<SentimentMap, SentimentError> {
        let block = self.prompt_block(handle, tweets, now);
        if block.is_empty() {
            warn!("No recent tweets for @{}, skipping sentiment request", handle);
            return Ok(SentimentMap::new());
        }

        let prompt = SentimentPrompt::new(handle, &block).render();
        info!("Requesting sentiment for @{}", handle);
        let reply = self.backend.complete(&prompt).await?;
        debug!("Raw reply for @{}: {}", handle, reply);

        let scores = parse_sentiment_reply(&reply)?;
        info!("Scored {} dates for @{}", scores.len(), handle);
        Ok(scores)
    }

    /// The date-grouped tweet block that `score` would send for `handle`.
    pub fn prompt_block(&self, handle: &str, tweets: &[Tweet], now: NaiveDateTime) -> String {
        let table = normalize_tweets(tweets, now);
        let mut rng = sampling_rng(self.sample_seed);
        render_author_block(&table, handle, self.sample_size, &mut rng)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::normalizer::tests::{at, tweet};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Backend that returns a canned reply and records prompts.
    pub(crate) struct StubBackend {
        reply: Result<String, u16>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl StubBackend {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatBackend for StubBackend {
        async fn complete(&self, prompt: &str) -> Result<String, SentimentError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(status) => Err(SentimentError::Api {
                    status: *status,
                    body: "unauthorized".to_string(),
                }),
            }
        }
    }

    fn sample_log() -> Vec<Tweet> {
        vec![
            tweet("1", "alice", "Pause giant AI experiments.", at("2024-01-06", "10:00:00")),
            tweet("2", "bob", "Scaling is fine.", at("2024-01-06", "11:00:00")),
            tweet("3", "alice", "Old news", at("2023-12-01", "11:00:00")),
        ]
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.model_name, "gpt-3.5-turbo");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.sample_size, 100);
        assert!(config.sample_seed.is_none());
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: 0.0,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"2024-01-06\": 90}"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("{\"2024-01-06\": 90}")
        );
    }

    #[test]
    fn test_reply_text_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"{}"}},{"message":{"content":"second"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(reply_text(response).unwrap(), "{}");
    }

    #[test]
    fn test_reply_text_without_choices_is_empty_reply() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(reply_text(response), Err(SentimentError::EmptyReply)));
    }

    #[test]
    fn test_reply_text_with_null_content_is_empty_reply() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(reply_text(response), Err(SentimentError::EmptyReply)));
    }

    #[test]
    fn test_api_error_keeps_status_and_body() {
        let err = api_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".to_string());
        assert!(matches!(
            err,
            SentimentError::Api { status: 429, ref body } if body == "slow down"
        ));
    }

    /// Serve one canned HTTP response on a loopback port and return its base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                    let length = headers
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    fn backend_for(api_url: String) -> OpenAiBackend {
        OpenAiBackend::new(&ClientConfig {
            api_url,
            api_key: "test-key".to_string(),
            timeout_seconds: 5,
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_openai_backend_maps_error_status() {
        let url = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;
        let result = backend_for(url).complete("hello").await;

        match result {
            Err(SentimentError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_openai_backend_returns_content() {
        let url = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"2024-01-06\": 70}"}}]}"#,
        )
        .await;
        let reply = backend_for(url).complete("hello").await.unwrap();
        assert_eq!(reply, r#"{"2024-01-06": 70}"#);
    }

    #[tokio::test]
    async fn test_openai_backend_null_content_is_empty_reply() {
        let url = serve_once("200 OK", r#"{"choices":[{"message":{"content":null}}]}"#).await;
        let result = backend_for(url).complete("hello").await;
        assert!(matches!(result, Err(SentimentError::EmptyReply)));
    }

    #[tokio::test]
    async fn test_score_parses_reply() {
        let backend = StubBackend::replying(r#"{"2024-01-06": 90}"#);
        let client = SentimentClient::new(backend, &ClientConfig::default());

        let scores = client
            .score("alice", &sample_log(), at("2024-01-07", "12:00:00"))
            .await
            .unwrap();

        assert_eq!(
            scores.get(&NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()),
            Some(&90)
        );

        let prompts = client.backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("@alice"));
        assert!(prompts[0].contains("2024-01-06:\nPause giant AI experiments."));
        assert!(!prompts[0].contains("Scaling is fine."));
        assert!(!prompts[0].contains("Old news"));
    }

    #[tokio::test]
    async fn test_score_fails_on_malformed_reply() {
        let backend = StubBackend::replying("I think they are worried.");
        let client = SentimentClient::new(backend, &ClientConfig::default());

        let result = client
            .score("alice", &sample_log(), at("2024-01-07", "12:00:00"))
            .await;

        assert!(matches!(result, Err(SentimentError::MalformedReply(_))));
    }

    #[tokio::test]
    async fn test_score_propagates_api_error() {
        let client = SentimentClient::new(StubBackend::failing(401), &ClientConfig::default());

        let result = client
            .score("alice", &sample_log(), at("2024-01-07", "12:00:00"))
            .await;

        assert!(matches!(result, Err(SentimentError::Api { status: 401, .. })));
    }

    #[test]
    fn test_score_skips_request_without_recent_tweets() {
        let client = SentimentClient::new(
            StubBackend::replying(r#"{"2024-01-06": 90}"#),
            &ClientConfig::default(),
        );

        let scores = tokio_test::block_on(client.score(
            "carol",
            &sample_log(),
            at("2024-01-07", "12:00:00"),
        ))
        .unwrap();

        assert!(scores.is_empty());
        assert_eq!(client.backend.calls(), 0);
    }

    #[test]
    fn test_seeded_prompt_block_is_reproducible() {
        let log: Vec<Tweet> = (0..30)
            .map(|i| tweet(&i.to_string(), "alice", &format!("t{i}"), at("2024-01-06", "10:00:00")))
            .collect();
        let config = ClientConfig {
            sample_size: 5,
            sample_seed: Some(11),
            ..ClientConfig::default()
        };
        let client = SentimentClient::new(StubBackend::replying("{}"), &config);
        let now = at("2024-01-07", "00:00:00");

        let first = client.prompt_block("alice", &log, now);
        let second = client.prompt_block("alice", &log, now);
        assert_eq!(first, second);
        assert_eq!(first.lines().count(), 6);
    }
}
