//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Safety Pulse - AI-safety sentiment of Twitter/X accounts
///
/// Registers accounts, loads their recent tweets, scores each day's
/// AI-risk sentiment with an LLM, and writes a Markdown/JSON report with a
/// trailing 7-day series per account.
///
/// Examples:
///   safety-pulse --tweets tweets.json --handle @alice --handle bob
///   safety-pulse --tweets tweets.json -H alice,bob --format json -o -
///   safety-pulse --tweets tweets.json -H alice --dry-run
///   safety-pulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Handle to track (repeatable or comma-separated, leading @ optional)
    ///
    /// Handles are registered in the order given.
    #[arg(short = 'H', long = "handle", value_name = "HANDLE", value_delimiter = ',')]
    pub handles: Vec<String>,

    /// JSON export of scraped tweets
    #[arg(short, long, value_name = "FILE")]
    pub tweets: Option<PathBuf>,

    /// API key for the completion endpoint (kept in memory only)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat model used for scoring
    #[arg(short, long, env = "SAFETY_PULSE_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum tweets per account sent to the model
    #[arg(long, value_name = "COUNT")]
    pub sample_size: Option<usize>,

    /// Seed for tweet sampling (reproducible prompts)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file path for the report (`-` for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .safetypulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: print the prompt block for each handle without calling the LLM
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .safetypulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.handles.iter().all(|h| h.trim().trim_start_matches('@').is_empty()) {
            return Err("At least one --handle is required".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.sample_size == Some(0) {
            return Err("Sample size must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
