//! Safety Pulse - AI-safety sentiment tracker for Twitter/X accounts
//!
//! A CLI tool that loads recent tweets for a set of accounts, asks an
//! LLM to score each day's AI-risk sentiment, and writes a report with an
//! aligned trailing 7-day series per account.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error, or at least one handle failed to score

mod analysis;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod sentiment;
mod session;
mod source;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Utc};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Report, ReportMetadata};
use sentiment::{ClientConfig, OpenAiBackend, SentimentClient};
use session::{normalize_handle, AddOutcome, Session};
use source::{JsonFileSource, TweetSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Safety Pulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Handles: {:?}", args.handles);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .safetypulse.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Set the API key with OPENAI_API_KEY or --api-key; it is never stored.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the tracking workflow. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let source = JsonFileSource::new(&config.source.tweets_file);
    info!("Tweet source: {}", source.path().display());

    let now = Local::now().naive_local();

    if args.dry_run {
        return handle_dry_run(&args.handles, &source, &config, now).await;
    }

    let api_key = args
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .context("No API key: set OPENAI_API_KEY or pass --api-key")?;

    let client_config = ClientConfig {
        api_url: config.llm.api_url.clone(),
        api_key,
        model_name: config.llm.model.clone(),
        temperature: config.llm.temperature,
        timeout_seconds: config.llm.timeout_seconds,
        sample_size: config.pipeline.sample_size,
        sample_seed: config.pipeline.sample_seed,
    };
    let backend = OpenAiBackend::new(&client_config)?;
    let client = SentimentClient::new(backend, &client_config);

    if !args.quiet {
        println!("🤖 Model: {} ({})", config.llm.model, config.llm.api_url);
    }

    let mut session = Session::new();
    let mut failed = Vec::new();

    for raw in &args.handles {
        if is_failed(&failed, raw) {
            info!("Skipping {}: already failed in this run", raw.trim());
            continue;
        }

        let spinner = start_spinner(raw, args.quiet);
        let result = session.add_author(raw, &source, &client, now).await;
        spinner.finish_and_clear();

        match result {
            Ok(AddOutcome::Added {
                handle,
                tweets,
                scored_dates,
            }) => {
                if !args.quiet {
                    println!(
                        "✅ @{}: {} tweets, {} dates scored",
                        handle, tweets, scored_dates
                    );
                }
            }
            Ok(AddOutcome::Duplicate(handle)) => {
                info!("Skipping @{}: already tracked", handle);
            }
            Ok(AddOutcome::NoTweets(handle)) => {
                warn!("Skipping @{}: no tweets found", handle);
            }
            Ok(AddOutcome::InvalidHandle) => {
                warn!("Skipping empty handle {:?}", raw);
            }
            Err(e) => {
                error!("{:#}", e);
                if let Some(handle) = normalize_handle(raw) {
                    failed.push(handle);
                }
            }
        }
    }

    let report = build_report(&session, &config.llm.model, failed.clone(), now);
    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = resolve_output_path(&args, &config);
    report::write_report(&output, &output_path)?;

    if !args.quiet {
        println!("\n📊 Summary:");
        println!("   Handles tracked: {}", session.handles().len());
        println!("   Tweets in window: {}", report.tweets.len());
        if !failed.is_empty() {
            println!("   Failed: {}", failed.join(", "));
        }
        if output_path != Path::new("-") {
            println!("\n✅ Report saved to: {}", output_path.display());
        }
    }

    Ok(if failed.is_empty() { 0 } else { 1 })
}

/// True when `raw` names a handle that already failed to score.
fn is_failed(failed: &[String], raw: &str) -> bool {
    normalize_handle(raw)
        .is_some_and(|handle| failed.iter().any(|f| f.eq_ignore_ascii_case(&handle)))
}

/// Assemble the report from the session state.
fn build_report(
    session: &Session,
    model: &str,
    failed_handles: Vec<String>,
    now: NaiveDateTime,
) -> Report {
    let series = session.series(now.date());
    let window_start = series.dates.first().copied().unwrap_or(now.date());
    let window_end = series.dates.last().copied().unwrap_or(now.date());

    Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            model_used: model.to_string(),
            window_start,
            window_end,
            failed_handles,
        },
        handles: session.handles().to_vec(),
        series,
        tweets: session.recent_tweets(now),
    }
}

/// Handle --dry-run: print the prompt block for each handle, no LLM call.
async fn handle_dry_run(
    handles: &[String],
    source: &JsonFileSource,
    config: &Config,
    now: NaiveDateTime,
) -> Result<i32> {
    println!("\n🔍 Dry run: building prompt blocks (no LLM call)...");

    let mut log = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for raw in handles {
        let Some(handle) = normalize_handle(raw) else {
            continue;
        };
        if seen.iter().any(|h| h.eq_ignore_ascii_case(&handle)) {
            continue;
        }
        log.extend(source.fetch_tweets(&handle).await?);
        seen.push(handle);
    }

    let table = pipeline::normalize_tweets(&log, now);
    let mut rng = pipeline::sampling_rng(config.pipeline.sample_seed);

    for handle in &seen {
        let block =
            pipeline::render_author_block(&table, handle, config.pipeline.sample_size, &mut rng);
        println!("\n=== @{} ===", handle);
        if block.is_empty() {
            println!("(no tweets in the last {} days)", pipeline::WINDOW_DAYS);
        } else {
            println!("{}", block);
        }
    }

    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(0)
}

/// Show a spinner while a handle is fetched and scored.
fn start_spinner(handle: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Scoring {}...", handle));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Report path, switching the default extension to match JSON output.
fn resolve_output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.report.output);
    if args.output.is_none()
        && config.report.format == OutputFormat::Json
        && path.extension().is_some_and(|ext| ext == "md")
    {
        return path.with_extension("json");
    }
    path
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_from_dir(Path::new(".")) {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
