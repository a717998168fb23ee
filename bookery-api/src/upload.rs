/// Multipart upload staging
///
/// Uploaded files are relayed through a scratch directory on local disk: the
/// multipart field is streamed to `UPLOAD_DIR/<uuid>`, handed to the media
/// host client, and removed once the request finishes — on failure paths too.
/// The reconciliation sweep prunes anything that still slips through.
///
/// The generated staging name doubles as the remote `public_id`, so the
/// remote object identifier is known before the upload starts.

use axum::extract::multipart::Field;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Error type for upload staging
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Failed to read the multipart field from the request body
    #[error("Failed to read multipart field: {0}")]
    Read(#[from] axum::extract::multipart::MultipartError),

    /// Failed to write the staged file
    #[error("Failed to write staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// A multipart file staged on local disk
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Location in the scratch directory
    pub path: PathBuf,

    /// Generated staging name; reused as the remote object name
    pub file_name: String,

    /// Client-supplied filename, if any
    pub original_name: Option<String>,

    /// Client-supplied content type
    pub content_type: String,
}

impl StagedFile {
    /// Delivery format derived from the MIME subtype
    /// (e.g. "image/png" → "png")
    pub fn format(&self) -> Option<&str> {
        self.content_type.split('/').next_back()
    }

    /// Removes the staged file, tolerating a file that is already gone
    pub async fn remove(&self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove staged file"),
        }
    }
}

/// Creates the scratch directory if it doesn't exist
///
/// # Errors
///
/// Returns an error if the directory cannot be created
pub async fn ensure_upload_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir).await
}

/// Streams a multipart field to the scratch directory
///
/// # Errors
///
/// Returns an error if the request body cannot be read or the staged file
/// cannot be written.
pub async fn stage_field(mut field: Field<'_>, dir: &Path) -> Result<StagedFile, UploadError> {
    let original_name = field.file_name().map(String::from);
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let file_name = Uuid::new_v4().to_string();
    let path = dir.join(&file_name);

    let mut file = File::create(&path).await?;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    debug!(
        path = %path.display(),
        original_name = ?original_name,
        content_type = %content_type,
        "Staged multipart field"
    );

    Ok(StagedFile {
        path,
        file_name,
        original_name,
        content_type,
    })
}

/// Removes staged files older than `max_age` from the scratch directory
///
/// Called by the reconciliation sweep; a request that died between staging a
/// file and cleaning up leaves an entry this collects.
///
/// # Errors
///
/// Returns an error if the directory cannot be read; per-file failures are
/// logged and skipped.
pub async fn prune_stale(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let mut pruned = 0;
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();

        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat staged file");
                continue;
            }
        };

        let age = modified.elapsed().unwrap_or(Duration::ZERO);
        if age < max_age {
            continue;
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), age_secs = age.as_secs(), "Pruned stale staged file");
                pruned += 1;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to prune staged file"),
        }
    }

    Ok(pruned)
}
