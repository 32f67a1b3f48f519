//! Fill-forward distribution of a freshly uploaded batch.
//!
//! When the customer bulk-uploads photos, the batch is spread over the album
//! automatically, lowest page first:
//!
//! ```text
//! pages:   [single: 1/1] [grid: 1/4] [double: 0/2]      batch: a b c d e f
//!                 │             │            │
//! remaining       0             3            2
//! placed          -           a b c         d e          dropped: f
//! ```
//!
//! Rules:
//!
//! - Remaining capacity is `capacity(layout) - images`, saturating at zero, so
//!   over-full pages (left behind by a layout switch or a manual drag) take
//!   nothing.
//! - Batch order is preserved: each page receives a contiguous run of the
//!   batch, and runs are handed out in page order.
//! - Whatever does not fit is dropped. It is not queued for later and not
//!   re-placed when a layout change frees capacity; the walk runs exactly
//!   once per batch.

use crate::document::{ImageRef, Page};

/// Images appended to one page by a distribution walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub page_number: usize,
    pub count: usize,
}

/// Summary of one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    /// Pages that received images, in page order.
    pub placements: Vec<Placement>,
    /// Trailing batch entries that found no free slot.
    pub dropped: usize,
}

impl Distribution {
    pub fn placed(&self) -> usize {
        self.placements.iter().map(|p| p.count).sum()
    }
}

/// Total free slots across `pages`.
pub fn total_remaining(pages: &[Page]) -> usize {
    pages.iter().map(Page::remaining_capacity).sum()
}

/// Append `batch` across `pages` using the fill-forward rule.
pub fn distribute(pages: &mut [Page], batch: Vec<ImageRef>) -> Distribution {
    let mut pending = batch.into_iter().peekable();
    let mut placements = Vec::new();

    for page in pages.iter_mut() {
        if pending.peek().is_none() {
            break;
        }
        let remaining = page.remaining_capacity();
        if remaining == 0 {
            continue;
        }
        let before = page.images.len();
        page.images.extend(pending.by_ref().take(remaining));
        placements.push(Placement {
            page_number: page.page_number,
            count: page.images.len() - before,
        });
    }

    let dropped = pending.count();
    if dropped > 0 {
        tracing::debug!(dropped, "batch exceeded remaining capacity");
    }
    Distribution {
        placements,
        dropped,
    }
}
