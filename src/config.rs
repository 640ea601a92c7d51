//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.safetypulse.toml` files. The API key is never read from or written
//! to the configuration file.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".safetypulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Tweet pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Tweet source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// LLM completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Temperature for generation.
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_url: default_api_url(),
            temperature: 0.0,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    300
}

/// Tweet pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum tweets per author sent to the model.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Seed for tweet sampling. Unset means a fresh sample every run.
    #[serde(default)]
    pub sample_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            sample_seed: None,
        }
    }
}

fn default_sample_size() -> usize {
    crate::pipeline::DEFAULT_SAMPLE_SIZE
}

/// Tweet source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON export with the scraped tweets.
    #[serde(default = "default_tweets_file")]
    pub tweets_file: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            tweets_file: default_tweets_file(),
        }
    }
}

fn default_tweets_file() -> String {
    "tweets.json".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output path; `-` writes to stdout.
    #[serde(default = "default_output")]
    pub output: String,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output() -> String {
    "safety_pulse_report.md".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from `dir`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE);

        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.llm.model = model.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.llm.api_url = api_url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.llm.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_seconds = timeout;
        }

        if let Some(sample_size) = args.sample_size {
            self.pipeline.sample_size = sample_size;
        }
        if args.seed.is_some() {
            self.pipeline.sample_seed = args.seed;
        }

        if let Some(ref tweets) = args.tweets {
            self.source.tweets_file = tweets.display().to_string();
        }

        if let Some(ref output) = args.output {
            self.report.output = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
    }

    /// Check merged settings before they reach the pipeline.
    pub fn validate(&self) -> Result<()> {
        if !self.llm.api_url.starts_with("http://") && !self.llm.api_url.starts_with("https://") {
            anyhow::bail!("llm.api_url must start with 'http://' or 'https://'");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            );
        }
        if self.llm.timeout_seconds == 0 {
            anyhow::bail!("llm.timeout_seconds must be at least 1");
        }
        if self.pipeline.sample_size == 0 {
            anyhow::bail!("pipeline.sample_size must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.pipeline.sample_size, 100);
        assert!(config.pipeline.sample_seed.is_none());
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[llm]
model = "gpt-4o-mini"
temperature = 0.2

[pipeline]
sample_size = 50
sample_seed = 7

[source]
tweets_file = "data/export.json"

[report]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.timeout_seconds, 300);
        assert_eq!(config.pipeline.sample_size, 50);
        assert_eq!(config.pipeline.sample_seed, Some(7));
        assert_eq!(config.source.tweets_file, "data/export.json");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.output, "safety_pulse_report.md");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[llm]"));
        assert!(toml_str.contains("[pipeline]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[report]"));
        assert!(!toml_str.contains("api_key"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.llm.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "[llm]\nmodel = \"local-model\"\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.llm.model, "local-model");

        std::fs::write(dir.path().join(CONFIG_FILE), "[llm\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sample_size() {
        let config: Config = toml::from_str("[pipeline]\nsample_size = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sample_size"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config: Config = toml::from_str("[llm]\ntimeout_seconds = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let config: Config = toml::from_str("[llm]\ntemperature = 3.0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_validate_rejects_bad_api_url() {
        let config: Config = toml::from_str("[llm]\napi_url = \"ftp://example.com\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_override_fixes_file_value() {
        let mut config: Config = toml::from_str("[pipeline]\nsample_size = 0\n").unwrap();
        let mut args = make_args();
        args.sample_size = Some(10);

        config.merge_with_args(&args);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.model = Some("gpt-4o".to_string());
        args.seed = Some(42);
        args.sample_size = Some(20);
        args.format = Some(OutputFormat::Json);

        config.merge_with_args(&args);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.pipeline.sample_seed, Some(42));
        assert_eq!(config.pipeline.sample_size, 20);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.llm.api_url, "https://api.openai.com/v1");
    }
}
