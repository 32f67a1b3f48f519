//! Shared test utilities for the album-studio test suite.
//!
//! Provides document builders with predictable image references, occupancy
//! extractors, and recording doubles for the upload, confirmation and save
//! collaborators.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! // Page 1: grid holding p1-0, p1-1. Page 2: empty single.
//! let mut doc = doc_with_pages(&[(Layout::Grid, 2), (Layout::Single, 0)]);
//! distribute(doc.pages_mut(), refs("n", 3));
//! assert_eq!(occupancy(&doc), vec![4, 1]);
//! ```

use std::sync::Mutex;

use chrono::NaiveDate;

use crate::confirm::{ConfirmRequest, Confirmer};
use crate::document::{AlbumDocument, CoverDesign, ImageRef, Page};
use crate::export::SavedAlbum;
use crate::layout::Layout;
use crate::session::SaveSink;
use crate::upload::{UploadError, UploadFile, Uploader};

// =========================================================================
// Document builders
// =========================================================================

/// Cover with stock presets and a fixed date.
pub fn cover(title: &str) -> CoverDesign {
    CoverDesign {
        title: title.to_string(),
        template: "classic".to_string(),
        font: "serif".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        color: "black".to_string(),
    }
}

/// Document titled "Test Album" with one page per `(layout, image_count)`.
///
/// Page `n` is filled with references `pn-0`, `pn-1`, ...
pub fn doc_with_pages(pages: &[(Layout, usize)]) -> AlbumDocument {
    let mut doc = AlbumDocument::new(pages.len(), cover("Test Album"));
    for (page, (layout, count)) in doc.pages_mut().iter_mut().zip(pages) {
        let number = page.page_number;
        page.layout = *layout;
        page.images = (0..*count)
            .map(|i| ImageRef::new(format!("p{number}-{i}")))
            .collect();
    }
    doc
}

/// `count` references named `{prefix}0`, `{prefix}1`, ...
pub fn refs(prefix: &str, count: usize) -> Vec<ImageRef> {
    (0..count)
        .map(|i| ImageRef::new(format!("{prefix}{i}")))
        .collect()
}

/// Small image files with the given names.
pub fn upload_files(names: &[&str]) -> Vec<UploadFile> {
    names
        .iter()
        .map(|name| UploadFile::new(*name, "image/jpeg", name.as_bytes().to_vec()))
        .collect()
}

// =========================================================================
// Extractors
// =========================================================================

/// Image list length per page, in page order.
pub fn occupancy(doc: &AlbumDocument) -> Vec<usize> {
    doc.pages().iter().map(|p| p.images().len()).collect()
}

/// A page's references as plain strings.
pub fn image_urls(page: &Page) -> Vec<&str> {
    page.images().iter().map(|i| i.as_str()).collect()
}

// =========================================================================
// Collaborator doubles
// =========================================================================

/// Uploader that records every attempt and answers `mock://{name}`.
#[derive(Default)]
pub struct MockUploader {
    attempts: Mutex<Vec<String>>,
    fail_on: Option<String>,
    fail_all: bool,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the upload of the file called `name`.
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_all() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Names of every file an upload was attempted for, in order.
    pub fn uploaded_names(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Uploader for MockUploader {
    fn upload(&self, file: &UploadFile) -> Result<ImageRef, UploadError> {
        self.attempts.lock().unwrap().push(file.name.clone());
        if self.fail_all || self.fail_on.as_deref() == Some(file.name.as_str()) {
            return Err(UploadError::Failed(format!("mock rejected {}", file.name)));
        }
        Ok(ImageRef::new(format!("mock://{}", file.name)))
    }
}

/// Confirmer with a fixed answer that keeps every request it saw.
pub struct RecordingConfirmer {
    answer: bool,
    requests: Mutex<Vec<ConfirmRequest>>,
}

impl RecordingConfirmer {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ConfirmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Confirmer for RecordingConfirmer {
    fn confirm(&self, request: &ConfirmRequest) -> bool {
        self.requests.lock().unwrap().push(request.clone());
        self.answer
    }
}

/// Save sink that keeps saved albums and counts close calls.
#[derive(Default)]
pub struct RecordingSink {
    pub saved: Vec<SavedAlbum>,
    pub closed: usize,
}

impl SaveSink for RecordingSink {
    fn on_save(&mut self, album: SavedAlbum) {
        self.saved.push(album);
    }

    fn on_close(&mut self) {
        self.closed += 1;
    }
}
