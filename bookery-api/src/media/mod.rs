/// Remote media host client
///
/// Uploaded cover images and content files live on a remote media host, not
/// on the API server. This module defines the [`MediaStore`] trait the book
/// controller talks to, and the Cloudinary-backed implementation used in
/// production. Tests swap in an in-memory implementation.
///
/// # Modules
///
/// - [`cloudinary`]: HTTP implementation against the Cloudinary upload API
///
/// # Asset identity
///
/// Every successful upload returns both the delivery URL and the
/// folder-qualified `public_id`. Callers persist both; deletion always works
/// from the stored `public_id`, never from parsing the URL.

pub mod cloudinary;

use async_trait::async_trait;
use bookery_shared::models::orphaned_asset::AssetKind;
use std::path::PathBuf;

pub use cloudinary::Cloudinary;

/// Error type for media host operations
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Failed to read the staged file from local disk
    #[error("Failed to read staged file: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure talking to the media host
    #[error("Media host request failed: {0}")]
    Request(String),

    /// The media host rejected the operation
    #[error("Media host error: {0}")]
    Api(String),
}

/// An upload to perform against the media host
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Staged file on local disk
    pub path: PathBuf,

    /// Object name within the folder (no extension)
    pub public_id: String,

    /// Remote folder ("book-covers" or "book-files")
    pub folder: String,

    /// Resource type: image uploads are format-converted, raw uploads are
    /// stored verbatim
    pub kind: AssetKind,

    /// Delivery format for image uploads, derived from the MIME subtype
    pub format: Option<String>,
}

/// A successfully uploaded remote object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// HTTPS delivery URL
    pub url: String,

    /// Folder-qualified object identifier, used for deletion
    pub public_id: String,
}

/// Interface to the remote media host
///
/// Implementations must be cheap to share (`Arc<dyn MediaStore>` lives in the
/// application state) and their `destroy` must be idempotent: destroying an
/// object that is already gone is a success, which is what makes the
/// reconciliation sweep safe to retry.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads a staged local file, returning its URL and object identifier
    async fn upload(&self, request: UploadRequest) -> Result<MediaAsset, MediaError>;

    /// Deletes a remote object by its folder-qualified identifier
    async fn destroy(&self, public_id: &str, kind: AssetKind) -> Result<(), MediaError>;
}
