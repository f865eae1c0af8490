//! Error taxonomy for the pipeline.
//!
//! Each stage has its own error type so a failure report can say which kind
//! of thing went wrong. [`PipelineError`] wraps them for the task graph and
//! the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Failure turning page bytes into text for the text pipeline.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("text is not valid UTF-8 (first bad byte at offset {offset})")]
    InvalidUtf8 { offset: usize },

    #[error("unsupported charset {charset:?}")]
    UnsupportedCharset { charset: String },
}

/// Failure writing an artifact to local storage.
#[derive(Debug, Error)]
#[error("failed to write artifact {path}: {source}")]
pub struct ArtifactWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure obtaining a credential for the remote store.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential configured (set DRIVE_ACCESS_TOKEN or --token-path)")]
    Missing,

    #[error("failed to read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("remote store rejected the credential (HTTP {status})")]
    Rejected { status: u16 },
}

/// Failure uploading an artifact.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("upload request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("storage returned HTTP {status}: {body}")]
    Storage { status: u16, body: String },
}

impl UploadError {
    /// True for local I/O failures that happen before any network traffic.
    pub fn is_io(&self) -> bool {
        matches!(self, UploadError::ArtifactRead { .. })
    }
}

/// Any failure a task in the graph can report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    ArtifactWrite(#[from] ArtifactWriteError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upload(UploadError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<UploadError> for PipelineError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Auth(a) => PipelineError::Auth(a),
            other => PipelineError::Upload(other),
        }
    }
}

impl PipelineError {
    /// Short stable name of the error kind, used in failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Normalize(_) => "normalize",
            PipelineError::ArtifactWrite(_) => "artifact_write",
            PipelineError::Auth(_) => "auth",
            PipelineError::Upload(e) if e.is_io() => "artifact_read",
            PipelineError::Upload(_) => "upload",
            PipelineError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let fetch = PipelineError::from(FetchError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        });
        assert_eq!(fetch.kind(), "fetch");
        assert_eq!(fetch.to_string(), "https://example.com returned HTTP 503");

        let cfg = PipelineError::Config("bad".to_string());
        assert_eq!(cfg.kind(), "config");
    }

    #[test]
    fn test_malformed_text_is_normalize_kind() {
        let err = PipelineError::from(NormalizeError::InvalidUtf8 { offset: 3 });
        assert_eq!(err.kind(), "normalize");
        assert_eq!(err.to_string(), "text is not valid UTF-8 (first bad byte at offset 3)");
    }

    #[test]
    fn test_upload_auth_is_reported_as_auth() {
        let err = PipelineError::from(UploadError::Auth(AuthError::Missing));
        assert_eq!(err.kind(), "auth");
    }

    #[test]
    fn test_artifact_read_is_io_kind() {
        let err = UploadError::ArtifactRead {
            path: PathBuf::from("missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.is_io());
        assert_eq!(PipelineError::from(err).kind(), "artifact_read");
    }
}
