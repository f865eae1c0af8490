//! Google Drive v3 client for creating files.
//!
//! Uses a single multipart upload request: a `multipart/related` body whose
//! first part is the JSON metadata (`name`, `parents`) and whose second part
//! is the raw file content.
//!
//! ```text
//! POST https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart
//! Authorization: Bearer <token>
//! Content-Type: multipart/related; boundary=<boundary>
//! ```
//!
//! Once Drive answers 2xx the file exists, so an unreadable response body is
//! logged and a [`RemoteFile`] with an empty `id` returned instead of an
//! error a retry would turn into a second copy.

use super::{RemoteStore, Token};
use crate::error::{AuthError, UploadError};
use crate::models::RemoteFile;
use crate::utils::truncate_for_log;
use rand::{rng, Rng};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

pub const DEFAULT_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart";

/// [`RemoteStore`] backed by the Drive REST API.
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    upload_url: String,
}

impl DriveClient {
    pub fn new(upload_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            upload_url: upload_url.to_string(),
        })
    }
}

impl RemoteStore for DriveClient {
    #[instrument(level = "info", skip_all, fields(%name, folder = %parent_folder_id, bytes = content.len()))]
    async fn create_file(
        &self,
        token: &Token,
        parent_folder_id: &str,
        name: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, UploadError> {
        let t0 = Instant::now();
        let boundary = format!("news_etl_{:016x}", rng().random::<u64>());
        let metadata = json!({ "name": name, "parents": [parent_folder_id] });
        let body = multipart_body(&boundary, &metadata, &content);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(token.secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            error!(status = status.as_u16(), "Drive rejected the credential");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            }
            .into());
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %truncate_for_log(&text, 300), "Drive upload failed");
            return Err(UploadError::Storage {
                status: status.as_u16(),
                body: truncate_for_log(&text, 300),
            });
        }

        let file = match response.bytes().await {
            Ok(raw) => created_file(&raw, name),
            Err(e) => {
                warn!(error = %e, "Drive created the file but the response was cut off");
                unnamed(name)
            }
        };
        info!(
            id = %file.id,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Created remote file"
        );
        Ok(file)
    }
}

/// Read the created file from a 2xx response body, falling back to the
/// requested name.
fn created_file(raw: &[u8], name: &str) -> RemoteFile {
    match serde_json::from_slice::<RemoteFile>(raw) {
        Ok(mut file) => {
            if file.name.is_empty() {
                file.name = name.to_string();
            }
            file
        }
        Err(e) => {
            warn!(
                error = %e,
                body = %truncate_for_log(&String::from_utf8_lossy(raw), 300),
                "Drive created the file but returned an unreadable body"
            );
            unnamed(name)
        }
    }
}

fn unnamed(name: &str) -> RemoteFile {
    RemoteFile {
        id: String::new(),
        name: name.to_string(),
    }
}

/// Assemble a `multipart/related` body with a JSON metadata part and an
/// opaque content part.
pub fn multipart_body(boundary: &str, metadata: &serde_json::Value, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: text/plain; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
