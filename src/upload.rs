//! Image upload collaborator and sequential batch uploads.
//!
//! Storage is external. The crate talks to it through the [`Uploader`]
//! trait: one file in, one opaque [`ImageRef`] out. The contract mirrors the
//! storefront endpoint, a multipart `POST` with the file in the `image` field
//! answered by `{ "url": "..." }`.
//!
//! Two implementations ship with the crate:
//!
//! | Uploader | Used when |
//! |---|---|
//! | [`HttpUploader`] | `upload.endpoint` is configured |
//! | [`DirectoryUploader`] | no endpoint; files land in `upload.directory` as percent-encoded `file://` URLs |
//!
//! ## Batches
//!
//! [`upload_batch`] sends files one at a time in order, so a batch takes the
//! sum of its per-file latencies. It is all-or-nothing: the first failure
//! discards everything uploaded so far, and the caller only ever sees a
//! complete, ordered list of references. A [`CancelToken`] is checked before
//! each file and once more at the end; a session that has been closed never
//! receives results.

use crate::config::UploadConfig;
use crate::document::ImageRef;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload rejected with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upload response missing url")]
    MissingUrl,
    #[error("upload failed: {0}")]
    Failed(String),
    #[error("upload cancelled")]
    Cancelled,
}

/// A named file ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a local file, guessing its content type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, content_type_for(path), bytes))
    }
}

/// Content type by extension (case-insensitive).
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Stores one file and returns a reference to it.
pub trait Uploader {
    fn upload(&self, file: &UploadFile) -> Result<ImageRef, UploadError>;
}

impl<U: Uploader + ?Sized> Uploader for &U {
    fn upload(&self, file: &UploadFile) -> Result<ImageRef, UploadError> {
        (**self).upload(file)
    }
}

impl<U: Uploader + ?Sized> Uploader for Box<U> {
    fn upload(&self, file: &UploadFile) -> Result<ImageRef, UploadError> {
        (**self).upload(file)
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Upload `files` in order, one request at a time.
///
/// `on_uploaded` sees each `(position, file, reference)` as it completes, for
/// progress reporting only; the returned list is the sole result.
pub fn upload_batch(
    uploader: &impl Uploader,
    files: &[UploadFile],
    cancel: &CancelToken,
    mut on_uploaded: impl FnMut(usize, &UploadFile, &ImageRef),
) -> Result<Vec<ImageRef>, UploadError> {
    let mut uploaded = Vec::with_capacity(files.len());
    for (position, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        let reference = uploader.upload(file)?;
        on_uploaded(position, file, &reference);
        uploaded.push(reference);
    }
    if cancel.is_cancelled() {
        return Err(UploadError::Cancelled);
    }
    Ok(uploaded)
}

/// Build the uploader described by `[upload]`.
pub fn from_config(config: &UploadConfig) -> Result<Box<dyn Uploader>, UploadError> {
    match &config.endpoint {
        Some(endpoint) => Ok(Box::new(HttpUploader::new(endpoint, config)?)),
        None => Ok(Box::new(DirectoryUploader::new(&config.directory))),
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: String,
}

/// Multipart upload to the storefront's image endpoint.
pub struct HttpUploader {
    client: reqwest::blocking::Client,
    endpoint: String,
    field_name: String,
    auth_token: Option<String>,
}

impl HttpUploader {
    pub fn new(endpoint: &str, config: &UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            field_name: config.field_name.clone(),
            auth_token: config.auth_token.clone(),
        })
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, file: &UploadFile) -> Result<ImageRef, UploadError> {
        let part = reqwest::blocking::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = reqwest::blocking::multipart::Form::new().part(self.field_name.clone(), part);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json()?;
        if body.url.is_empty() {
            return Err(UploadError::MissingUrl);
        }
        tracing::info!(file = %file.name, url = %body.url, "uploaded");
        Ok(ImageRef::new(body.url))
    }
}

/// Stores uploads in a local directory and hands back `file://` references.
///
/// Existing files are never overwritten: a clashing name gets a `-N` suffix.
pub struct DirectoryUploader {
    dir: PathBuf,
}

impl DirectoryUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn free_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        let as_path = Path::new(name);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = as_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (1..)
            .map(|n| self.dir.join(format!("{stem}-{n}{ext}")))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl Uploader for DirectoryUploader {
    fn upload(&self, file: &UploadFile) -> Result<ImageRef, UploadError> {
        fs::create_dir_all(&self.dir)?;
        // Only the final component: uploads never escape the directory
        let name = Path::new(&file.name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let path = self.free_path(&name);
        fs::write(&path, &file.bytes)?;
        let absolute = fs::canonicalize(&path)?;
        let url = Url::from_file_path(&absolute).map_err(|()| {
            UploadError::Failed(format!("{} has no file URL form", absolute.display()))
        })?;
        tracing::info!(file = %file.name, %url, "stored");
        Ok(ImageRef::new(url.to_string()))
    }
}
