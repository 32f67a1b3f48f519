//! Serialization and export of a finished album design.
//!
//! Export turns the whole [`AlbumDocument`] into one transportable artifact:
//!
//! 1. **Check**: the cover title must be non-empty after trimming. Nothing
//!    is serialized or uploaded otherwise.
//! 2. **Serialize**: compact JSON in declaration order. Every page is
//!    included, along with images its layout hides.
//! 3. **Wrap**: `<prefix>-<unix millis>.json`, `application/json`.
//! 4. **Upload**: through the same [`Uploader`] used for photos.
//! 5. **Augment**: the returned reference becomes `previewFileUrl` on a
//!    [`SavedAlbum`], which is what the save callback receives.
//!
//! A failure at any step leaves the document as it was.

use crate::document::{AlbumDocument, ImageRef};
use crate::upload::{CancelToken, UploadError, UploadFile, Uploader};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("album needs a cover title before it can be saved")]
    MissingTitle,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("upload of album design failed: {0}")]
    Upload(#[from] UploadError),
}

/// The document as handed to the save callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAlbum {
    #[serde(flatten)]
    pub document: AlbumDocument,
    pub preview_file_url: ImageRef,
}

/// Export precondition.
pub fn check_ready(document: &AlbumDocument) -> Result<(), ExportError> {
    if document.cover().title.trim().is_empty() {
        return Err(ExportError::MissingTitle);
    }
    Ok(())
}

pub fn artifact_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.json", prefix, at.timestamp_millis())
}

/// Serialize `document` into the upload artifact.
pub fn build_artifact(
    document: &AlbumDocument,
    prefix: &str,
    at: DateTime<Utc>,
) -> Result<UploadFile, ExportError> {
    check_ready(document)?;
    let bytes = serde_json::to_vec(document)?;
    Ok(UploadFile::new(
        artifact_name(prefix, at),
        "application/json",
        bytes,
    ))
}

/// Serialize, upload and augment. The document itself is never modified.
pub fn export(
    document: &AlbumDocument,
    uploader: &impl Uploader,
    prefix: &str,
    cancel: &CancelToken,
) -> Result<SavedAlbum, ExportError> {
    let artifact = build_artifact(document, prefix, Utc::now())?;
    if cancel.is_cancelled() {
        return Err(UploadError::Cancelled.into());
    }
    let preview_file_url = uploader.upload(&artifact)?;
    if cancel.is_cancelled() {
        return Err(UploadError::Cancelled.into());
    }
    tracing::info!(artifact = %artifact.name, url = %preview_file_url, "album design exported");
    Ok(SavedAlbum {
        document: document.clone(),
        preview_file_url,
    })
}
