//! Pipeline configuration.
//!
//! Loaded from an optional YAML file. Every field has a default, so the
//! pipeline runs against the two built-in sources without any file:
//!
//! ```yaml
//! output_dir: ./data
//! folder_id: 1F3JbxtgLc0yTsye--78NdCl3cKgR8meE
//! retries: 1
//! retry_delay_secs: 5
//! sources:
//!   - name: dawn
//!     url: https://www.dawn.com/
//!     artifact: dawn_data.txt
//!   - name: bbc
//!     url: https://www.bbc.com/
//!     artifact: bbc_data.txt
//! ```
//!
//! A source's `artifact` may be left out; it defaults to `<name>_data.txt`.

use crate::cli::Cli;
use crate::error::PipelineError;
use crate::models::Source;
use crate::storage::drive::DEFAULT_UPLOAD_URL;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_FOLDER_ID: &str = "1F3JbxtgLc0yTsye--78NdCl3cKgR8meE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory the artifacts are written to.
    pub output_dir: PathBuf,
    /// Remote folder every artifact is uploaded under.
    pub folder_id: String,
    pub sources: Vec<Source>,
    /// Extra attempts per failed step.
    pub retries: usize,
    pub retry_delay_secs: u64,
    pub http_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub schedule_interval_secs: u64,
    pub drive_upload_url: String,
    /// Cached OAuth token (JSON with `access_token`).
    pub token_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            folder_id: DEFAULT_FOLDER_ID.to_string(),
            sources: default_sources(),
            retries: 1,
            retry_delay_secs: 5,
            http_timeout_secs: 30,
            upload_timeout_secs: 60,
            schedule_interval_secs: 24 * 60 * 60,
            drive_upload_url: DEFAULT_UPLOAD_URL.to_string(),
            token_path: None,
        }
    }
}

pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new("dawn", "https://www.dawn.com/"),
        Source::new("bbc", "https://www.bbc.com/"),
    ]
}

impl Config {
    /// Load `path` if given, otherwise the defaults. The result is validated.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, PipelineError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| PipelineError::Config(format!("cannot read {path}: {e}")))?;
                let config = Self::from_yaml(&raw)?;
                info!(config_path = path, sources = config.sources.len(), "Loaded configuration");
                config
            }
            None => {
                info!("No config file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, PipelineError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.output_dir {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(folder) = &cli.folder_id {
            self.folder_id = folder.clone();
        }
        if let Some(path) = &cli.token_path {
            self.token_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let fail = |msg: String| Err(PipelineError::Config(msg));

        if self.folder_id.trim().is_empty() {
            return fail("folder_id must not be empty".to_string());
        }
        if self.sources.is_empty() {
            return fail("at least one source is required".to_string());
        }
        let mut names = HashSet::new();
        let mut artifacts = HashSet::new();
        for source in &self.sources {
            if source.name.is_empty() || !source.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return fail(format!("source name {:?} must be non-empty ASCII letters, digits or '-'", source.name));
            }
            if !names.insert(source.name.as_str()) {
                return fail(format!("duplicate source name {:?}", source.name));
            }
            if let Err(e) = url::Url::parse(&source.url) {
                return fail(format!("source {} has invalid url {:?}: {e}", source.name, source.url));
            }
            if source.artifact.is_empty()
                || source.artifact.contains(['/', '\\'])
                || source.artifact == "."
                || source.artifact == ".."
            {
                return fail(format!("source {} has invalid artifact name {:?}", source.name, source.artifact));
            }
            if !artifacts.insert(source.artifact.as_str()) {
                return fail(format!("artifact {:?} is shared by two sources", source.artifact));
            }
        }
        if self.schedule_interval_secs == 0 {
            return fail("schedule_interval_secs must be positive".to_string());
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }
}
