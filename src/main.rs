//! # News ETL
//!
//! Scrapes the front pages of news sites, normalizes every paragraph into a
//! bag of lemmas, writes one artifact per site and uploads the artifacts to a
//! Google Drive folder.
//!
//! ## Usage
//!
//! ```sh
//! news_etl run                    # both chains once
//! news_etl step transform_dawn    # one named task
//! news_etl schedule               # daily
//! news_etl graph                  # print the task graph
//! echo "Some text" | news_etl normalize
//! ```
//!
//! ## Architecture
//!
//! Each source gets its own two-step chain:
//! 1. **Transform**: fetch the page, extract `<a>`/`<h2>`/`<p>`, normalize the
//!    paragraphs and write `<source>_data.txt`
//! 2. **Upload**: send that file to the configured Drive folder
//!
//! Chains are independent and run concurrently. A failed step is retried once.

use clap::Parser;
use std::error::Error;
use std::io::Read;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod graph;
mod jobs;
mod models;
mod normalize;
mod retry;
mod scrapers;
mod storage;
#[cfg(test)]
mod testing;
mod utils;

use cli::{Cli, Command};
use config::Config;
use graph::{Pipeline, TaskGraph, TaskState};
use retry::RetryPolicy;
use scrapers::HttpFetcher;
use storage::{CachedCredential, ConfiguredCredential, DriveClient};
use utils::ensure_writable_dir;

type LivePipeline = Pipeline<HttpFetcher, CachedCredential<ConfiguredCredential>, DriveClient>;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.command, ?args.config, "Parsed CLI arguments");

    if let Command::Normalize { text } = &args.command {
        return normalize_command(text.as_deref());
    }

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_overrides(&args);
    config.validate()?;
    let graph = TaskGraph::new(&config.sources);

    if args.command == Command::Graph {
        print!("{graph}");
        return Ok(ExitCode::SUCCESS);
    }

    normalize::preload();
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let pipeline = build_pipeline(&config, &args)?;

    let code = match &args.command {
        Command::Run => {
            let report = pipeline.run_graph(&graph).await;
            println!("{report}");
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Step { task } => {
            let status = pipeline.run_step(&graph, task).await?;
            match (&status.state, &status.failure) {
                (TaskState::Succeeded, _) => {
                    println!("{} succeeded after {} attempt(s)", status.id, status.attempts);
                    ExitCode::SUCCESS
                }
                (_, Some(failure)) => {
                    println!(
                        "{} failed (source {}): {}: {}",
                        status.id, status.id.source, failure.kind, failure.message
                    );
                    ExitCode::FAILURE
                }
                _ => ExitCode::FAILURE,
            }
        }
        Command::Schedule => {
            info!(
                interval_secs = config.schedule_interval_secs,
                "Starting scheduler"
            );
            pipeline
                .run_on_schedule(&graph, config.schedule_interval(), None)
                .await;
            ExitCode::SUCCESS
        }
        Command::Graph | Command::Normalize { .. } => ExitCode::SUCCESS,
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(code)
}

#[instrument(level = "info", skip_all)]
fn build_pipeline(config: &Config, args: &Cli) -> Result<LivePipeline, Box<dyn Error>> {
    let credentials = CachedCredential::new(ConfiguredCredential::from_options(
        args.access_token.clone(),
        config.token_path.clone(),
    ));
    let pipeline = Pipeline {
        fetcher: HttpFetcher::new(config.http_timeout())?,
        credentials,
        store: DriveClient::new(&config.drive_upload_url, config.upload_timeout())?,
        output_dir: config.output_dir.clone(),
        folder_id: config.folder_id.clone(),
        retry: RetryPolicy::new(config.retries, config.retry_delay()),
    };
    info!(
        output_dir = %pipeline.output_dir.display(),
        folder_id = %pipeline.folder_id,
        retries = config.retries,
        "Pipeline ready"
    );
    Ok(pipeline)
}

fn normalize_command(text: Option<&str>) -> Result<ExitCode, Box<dyn Error>> {
    let output = match text {
        Some(text) => normalize::normalize(text),
        None => {
            let mut raw = Vec::new();
            std::io::stdin().read_to_end(&mut raw)?;
            normalize::normalize_bytes(&raw)?
        }
    };
    println!("{output}");
    Ok(ExitCode::SUCCESS)
}
