//! The album document and its structural operations.
//!
//! An [`AlbumDocument`] is the complete customization state for one e-album
//! order line: a cover design plus a fixed-length list of pages. It is owned
//! by a single editing session and only changes through the methods here
//! (plus the crate-internal distribution and relocation steps), each of which
//! runs to completion on `&mut self`.
//!
//! ## JSON Shape
//!
//! The document serializes with camelCase keys; this is exactly the artifact
//! uploaded on export:
//!
//! ```json
//! {
//!   "coverDesign": {
//!     "title": "Summer 2026",
//!     "template": "classic",
//!     "font": "serif",
//!     "date": "2026-10-18",
//!     "color": "black"
//!   },
//!   "pages": [
//!     { "pageNumber": 1, "images": ["https://cdn/a.jpg"], "layout": "single" },
//!     { "pageNumber": 2, "images": [], "layout": "grid" }
//!   ]
//! }
//! ```
//!
//! ## Invariants
//!
//! - The page count is fixed when the document is created.
//! - `pageNumber` is the 1-based position of the page and never changes.
//! - A page's image list is not capped by its layout. Layout capacity only
//!   limits what is rendered and what the distribution engine places.

use crate::confirm::{Confirmation, ConfirmRequest, Confirmer};
use crate::layout::{self, Layout};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("page {page} does not exist (album has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },
    #[error("page {page} has no image at index {index} ({len} images)")]
    ImageIndexOutOfRange { page: usize, index: usize, len: usize },
    #[error("page at position {position} is numbered {found}")]
    PageNumbering { position: usize, found: usize },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Opaque reference to an uploaded image (a URL in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for ImageRef {
    fn from(url: String) -> Self {
        Self(url)
    }
}

/// Cover settings. Template, font and color are preset identifiers owned by
/// the storefront; the document stores them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverDesign {
    pub title: String,
    pub template: String,
    pub font: String,
    pub date: NaiveDate,
    pub color: String,
}

/// One replaceable cover scalar, as sent by the input surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverField {
    Title(String),
    Template(String),
    Font(String),
    Date(NaiveDate),
    Color(String),
}

/// A single album page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub(crate) page_number: usize,
    pub(crate) images: Vec<ImageRef>,
    #[serde(default)]
    pub(crate) layout: Layout,
}

impl Page {
    fn empty(page_number: usize, layout: Layout) -> Self {
        Self {
            page_number,
            images: Vec::new(),
            layout,
        }
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// All images in rendering order, including any the layout hides.
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Images the current layout renders.
    pub fn visible_images(&self) -> &[ImageRef] {
        layout::visible(self.layout, &self.images)
    }

    /// Images kept on the page beyond the layout's slot count.
    pub fn hidden_count(&self) -> usize {
        self.images.len().saturating_sub(self.layout.capacity())
    }

    /// Free slots left for distribution. Zero for full or over-full pages.
    pub fn remaining_capacity(&self) -> usize {
        layout::remaining(self.layout, self.images.len())
    }
}

/// Root of the customization state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumDocument {
    cover_design: CoverDesign,
    pages: Vec<Page>,
}

impl AlbumDocument {
    /// Fresh document: `page_count` empty pages in the default layout.
    pub fn new(page_count: usize, cover: CoverDesign) -> Self {
        Self::with_layout(page_count, Layout::default(), cover)
    }

    /// Fresh document whose pages all start in `layout`.
    pub fn with_layout(page_count: usize, layout: Layout, cover: CoverDesign) -> Self {
        Self {
            cover_design: cover,
            pages: (1..=page_count).map(|n| Page::empty(n, layout)).collect(),
        }
    }

    /// Parse a document and check that page numbers match positions.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let document: Self = serde_json::from_str(json)?;
        for (position, page) in document.pages.iter().enumerate() {
            if page.page_number != position + 1 {
                return Err(StoreError::PageNumbering {
                    position: position + 1,
                    found: page.page_number,
                });
            }
        }
        Ok(document)
    }

    pub fn cover(&self) -> &CoverDesign {
        &self.cover_design
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Look up a page by its 1-based number.
    pub fn page(&self, page_number: usize) -> Result<&Page, StoreError> {
        let index = self.index_of(page_number)?;
        Ok(&self.pages[index])
    }

    /// Sum of image list lengths across all pages, hidden images included.
    pub fn total_images(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }

    /// Replace one cover scalar. No validation happens here; the title length
    /// cap belongs to the input surface.
    pub fn set_cover_field(&mut self, field: CoverField) {
        let cover = &mut self.cover_design;
        match field {
            CoverField::Title(title) => cover.title = title,
            CoverField::Template(template) => cover.template = template,
            CoverField::Font(font) => cover.font = font,
            CoverField::Date(date) => cover.date = date,
            CoverField::Color(color) => cover.color = color,
        }
    }

    /// Change one page's layout. Existing images are neither truncated nor
    /// moved; only display and future distribution are affected.
    pub fn set_page_layout(&mut self, page_number: usize, layout: Layout) -> Result<(), StoreError> {
        let index = self.index_of(page_number)?;
        self.pages[index].layout = layout;
        Ok(())
    }

    /// Apply `layout` to every page once the confirmer approves.
    pub fn set_all_pages_layout(&mut self, layout: Layout, confirmer: &dyn Confirmer) -> Confirmation {
        let request = ConfirmRequest::ApplyLayoutToAll {
            layout,
            page_count: self.pages.len(),
        };
        if !confirmer.confirm(&request) {
            return Confirmation::Declined;
        }
        for page in &mut self.pages {
            page.layout = layout;
        }
        Confirmation::Applied
    }

    /// Remove the image at `image_index` on a page and return it.
    pub fn remove_image(&mut self, page_number: usize, image_index: usize) -> Result<ImageRef, StoreError> {
        let index = self.index_of(page_number)?;
        let page = &mut self.pages[index];
        if image_index >= page.images.len() {
            return Err(StoreError::ImageIndexOutOfRange {
                page: page_number,
                index: image_index,
                len: page.images.len(),
            });
        }
        Ok(page.images.remove(image_index))
    }

    pub(crate) fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    fn index_of(&self, page_number: usize) -> Result<usize, StoreError> {
        if page_number == 0 || page_number > self.pages.len() {
            return Err(StoreError::PageOutOfRange {
                page: page_number,
                page_count: self.pages.len(),
            });
        }
        Ok(page_number - 1)
    }
}
