//! Command-line interface definitions.
//!
//! Global options override the config file; credentials can also come from
//! the environment.

use clap::{Parser, Subcommand};

/// Command-line arguments for the news ETL pipeline.
///
/// # Examples
///
/// ```sh
/// # Run both chains once with built-in defaults
/// news_etl run
///
/// # Re-run a single step
/// news_etl --output-dir ./data step upload_bbc
///
/// # Run daily
/// DRIVE_ACCESS_TOKEN=... news_etl --config etl.yaml schedule
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory the artifacts are written to
    #[arg(short, long, global = true)]
    pub output_dir: Option<String>,

    /// Remote folder id to upload into
    #[arg(long, env = "DRIVE_FOLDER_ID", global = true)]
    pub folder_id: Option<String>,

    /// Cached OAuth token file (JSON with an `access_token` field)
    #[arg(long, env = "DRIVE_TOKEN_PATH", global = true)]
    pub token_path: Option<String>,

    /// Access token for the remote store
    #[arg(long, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run every chain of the task graph once
    Run,
    /// Run a single named task, e.g. `transform_dawn` or `upload_bbc`
    Step {
        /// Task id
        task: String,
    },
    /// Run the task graph on a fixed interval (daily by default)
    Schedule,
    /// Print the task graph
    Graph,
    /// Normalize text from the argument or stdin and print it
    Normalize {
        /// Text to normalize; read from stdin when omitted
        text: Option<String>,
    },
}
