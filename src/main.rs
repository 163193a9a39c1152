//! Greenlight - Simulated AI-assisted CI/CD pipeline runner
//!
//! CLI entry point for the pipeline simulator.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;

use greenlight::gemini::client::GeminiClient;
use greenlight::pipeline::catalog::{is_known_project_type, PROJECT_TYPES, SAMPLE_COMMITS};
use greenlight::pipeline::config::PipelineConfig;
use greenlight::pipeline::runner::{PipelineRunner, RunRequest};
use greenlight::{render_metrics, render_timeline, JsonlLogger, PipelineDisplay, RunHistory, RunRecord};

/// Simulated AI-assisted CI/CD pipeline runner
///
/// Walks a mock pipeline (setup, scans, test generation, build, deploy,
/// release notes) for a commit message, with stage content generated by
/// Gemini and random failures at the build and production checkpoints.
#[derive(Parser, Debug)]
#[command(name = "greenlight", version, about)]
struct Cli {
    /// Commit message to run the pipeline for (a random sample when omitted)
    #[arg(long)]
    commit: Option<String>,

    /// Project type
    #[arg(long, default_value = "React Frontend")]
    project_type: String,

    /// Optional context forwarded to failure analysis if the build fails
    #[arg(long)]
    failure_context: Option<String>,

    /// Number of successive pipeline runs
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Path to the greenlight.toml configuration file
    #[arg(long, default_value = "greenlight.toml")]
    config: PathBuf,

    /// Directory for log files (.greenlight by default)
    #[arg(long, default_value = ".greenlight")]
    log_dir: PathBuf,

    /// Print only the first line of each stage's content
    #[arg(long)]
    plain: bool,
}

/// Resolve the commit message: use the given one (trimmed, non-empty) or
/// pick a random sample.
fn resolve_commit(commit: Option<String>) -> Result<String> {
    match commit {
        Some(message) => {
            let message = message.trim().to_string();
            if message.is_empty() {
                bail!("Commit message cannot be empty");
            }
            Ok(message)
        }
        None => Ok(sample_commit().to_string()),
    }
}

/// Pick a random commit message from the sample pool.
fn sample_commit() -> &'static str {
    SAMPLE_COMMITS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(SAMPLE_COMMITS[0])
}

/// Format the accepted project types for error messages.
fn available_project_types() -> String {
    PROJECT_TYPES.join(", ")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration (defaults when the file is absent)
    let config = PipelineConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from '{}'", cli.config.display()))?;

    if !is_known_project_type(&cli.project_type) {
        bail!(
            "Unknown project type '{}'. Available types: {}",
            cli.project_type,
            available_project_types()
        );
    }
    if cli.runs == 0 {
        bail!("--runs must be at least 1");
    }

    let commit_message = resolve_commit(cli.commit)?;

    let provider = GeminiClient::from_env(&config.gemini.model);
    if !provider.has_api_key() {
        eprintln!(
            "Note: {} is not set; stages will contain a configuration error message.",
            greenlight::gemini::client::API_KEY_ENV
        );
    }

    let logger = JsonlLogger::new(&cli.log_dir).context("Failed to initialize JSONL logger")?;

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let runner = PipelineRunner::new(config, Arc::new(provider), event_tx);

    // Render events as they arrive; ends when the runner is dropped
    let show_content = !cli.plain;
    let display_task = tokio::spawn(async move {
        let mut display = PipelineDisplay::new(show_content);
        while let Some(event) = event_rx.recv().await {
            display.render_event(&event);
        }
    });

    let mut request = RunRequest::new(&commit_message, &cli.project_type);
    if let Some(context) = &cli.failure_context {
        request = request.with_failure_context(context);
    }

    let mut history = RunHistory::new();
    for run_index in 1..=cli.runs {
        let run = runner
            .run(&request)
            .await
            .with_context(|| format!("Pipeline run {run_index} did not finalize"))?;

        logger
            .append(&RunRecord::from_run(
                &run,
                run_index,
                &commit_message,
                &cli.project_type,
            ))
            .context("Failed to write to JSONL log")?;

        history.append(run);
    }

    drop(runner);
    display_task.await.context("Display task panicked")?;

    if let Some(metrics) = history.metrics() {
        render_metrics(&metrics);
    }
    if let Some(last) = history.runs().last() {
        render_timeline(last);
    }

    Ok(())
}
