//! Drag relocation of a single image between pages.
//!
//! Dragging an image chip arms a single-slot clipboard, the [`DragSlot`],
//! with an [`InFlight`] token naming where the image came from. Dropping on
//! a page resolves the token against the document:
//!
//! ```text
//!            drag-start                     drop on target
//!   Empty ───────────────▶ Holding(token) ─────────────────▶ Empty
//!                                            │
//!                          same page ────────┤ no-op
//!                          other page ───────┤ remove at source, append at target
//!                          stale token ──────┘ error, document untouched
//! ```
//!
//! The slot lives beside the document, never inside it, and is emptied by
//! every drop whatever the outcome. Page positions here are 0-based indices.
//!
//! Relocation ignores the target's layout capacity: a manual
//! move may over-fill a page, and the surplus is simply hidden by the
//! layout. Only the distribution engine is capacity-aware.

use crate::document::{AlbumDocument, ImageRef};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RelocateError {
    #[error("drop target page index {index} is out of range ({page_count} pages)")]
    TargetOutOfRange { index: usize, page_count: usize },
    #[error("dragged image no longer at page index {page_index}, image index {image_index}")]
    StaleToken { page_index: usize, image_index: usize },
}

/// The image currently being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub source_page_index: usize,
    pub source_image_index: usize,
    pub reference: ImageRef,
}

/// Single-slot holder for the in-flight token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragSlot {
    #[default]
    Empty,
    Holding(InFlight),
}

impl DragSlot {
    /// Start a drag. A new drag-start replaces any token still held.
    pub fn arm(&mut self, token: InFlight) {
        tracing::debug!(
            page_index = token.source_page_index,
            image_index = token.source_image_index,
            "drag armed"
        );
        *self = DragSlot::Holding(token);
    }

    /// Read and clear the slot in one step.
    pub fn take(&mut self) -> Option<InFlight> {
        match std::mem::take(self) {
            DragSlot::Empty => None,
            DragSlot::Holding(token) => Some(token),
        }
    }

    pub fn holding(&self) -> Option<&InFlight> {
        match self {
            DragSlot::Empty => None,
            DragSlot::Holding(token) => Some(token),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DragSlot::Empty)
    }
}

/// Result of resolving a token against a drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// Dropped back on its own page: nothing changes.
    SamePage,
    Moved {
        from_page_index: usize,
        to_page_index: usize,
        reference: ImageRef,
    },
}

/// Move the token's image to the end of the target page.
pub fn relocate(
    document: &mut AlbumDocument,
    token: InFlight,
    target_page_index: usize,
) -> Result<Relocation, RelocateError> {
    if token.source_page_index == target_page_index {
        return Ok(Relocation::SamePage);
    }

    let pages = document.pages_mut();
    if target_page_index >= pages.len() {
        return Err(RelocateError::TargetOutOfRange {
            index: target_page_index,
            page_count: pages.len(),
        });
    }

    let still_there = pages
        .get(token.source_page_index)
        .and_then(|page| page.images.get(token.source_image_index))
        .is_some_and(|image| *image == token.reference);
    if !still_there {
        tracing::warn!(
            page_index = token.source_page_index,
            image_index = token.source_image_index,
            "stale drag token"
        );
        return Err(RelocateError::StaleToken {
            page_index: token.source_page_index,
            image_index: token.source_image_index,
        });
    }

    let reference = pages[token.source_page_index]
        .images
        .remove(token.source_image_index);
    pages[target_page_index].images.push(reference.clone());

    Ok(Relocation::Moved {
        from_page_index: token.source_page_index,
        to_page_index: target_page_index,
        reference,
    })
}
