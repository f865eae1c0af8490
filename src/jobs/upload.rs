//! Upload: push one local artifact to a remote folder.

use crate::error::UploadError;
use crate::models::RemoteFile;
use crate::storage::{CredentialProvider, RemoteStore};
use std::path::Path;
use tracing::{info, instrument};

/// Upload the current bytes of `artifact` as a new file under `folder_id`.
///
/// The artifact is read before anything touches the network, so a missing
/// file fails with [`UploadError::ArtifactRead`] and no credential or store
/// call is made. Every successful call creates a new remote file, even if an
/// identical one was uploaded before. A store that accepted the file but sent
/// back an unreadable answer still counts as success (with an empty remote
/// id), so a retry never uploads the same artifact twice.
#[instrument(level = "info", skip_all, fields(artifact = %artifact.display(), %folder_id))]
pub async fn upload<C, S>(
    credentials: &C,
    store: &S,
    artifact: &Path,
    folder_id: &str,
) -> Result<RemoteFile, UploadError>
where
    C: CredentialProvider,
    S: RemoteStore,
{
    let content = tokio::fs::read(artifact)
        .await
        .map_err(|source| UploadError::ArtifactRead {
            path: artifact.to_path_buf(),
            source,
        })?;
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| artifact.display().to_string());

    let token = credentials.obtain_credential().await?;
    let bytes = content.len();
    let file = store.create_file(&token, folder_id, &name, content).await?;
    info!(remote_id = %file.id, %name, bytes, "Uploaded artifact");
    Ok(file)
}
