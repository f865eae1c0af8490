//! Utility functions for logging and local file handling.
//!
//! - String truncation for log previews
//! - Output directory validation
//! - Artifact path helpers and the all-or-nothing artifact write

use crate::error::ArtifactWriteError;
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Location of an artifact inside the output directory.
pub fn artifact_path(output_dir: &Path, artifact: &str) -> PathBuf {
    output_dir.join(artifact)
}

/// Sibling temp path used while an artifact is being written.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `lines` to `path`, one per line, replacing any previous file.
///
/// The content goes to a temp file first and is renamed into place, so the
/// artifact is either the complete new content or the untouched old one.
#[instrument(level = "info", skip_all, fields(path = %path.display(), lines = lines.len()))]
pub async fn write_lines_atomic(path: &Path, lines: &[String]) -> Result<(), ArtifactWriteError> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }

    let tmp = temp_path_for(path);
    let wrap = |source| ArtifactWriteError {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, content.as_bytes()).await.map_err(wrap)?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(wrap(e));
    }
    info!(bytes = content.len(), "Wrote artifact");
    Ok(())
}
