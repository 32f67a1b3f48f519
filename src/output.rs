//! CLI output formatting for the album document and session progress.
//!
//! # Output Format
//!
//! ## Document
//!
//! ```text
//! Cover
//!     Title: Summer 2026
//!     Template: classic, Font: serif, Color: black
//!     Date: 2026-10-18
//!
//! Pages
//! 001 single (1/1)
//!     001 https://cdn/a.jpg
//!     + 1 hidden
//! 002 grid (0/4)
//!
//! 2 images on 1 page, 1 hidden
//! ```
//!
//! Page headers show `visible/capacity`. Images the layout hides are counted
//! but not listed.
//!
//! ## Progress
//!
//! ```text
//! Uploading 2 files to album
//!     001 dawn.jpg → https://cdn/dawn.jpg
//!     002 dusk.jpg → https://cdn/dusk.jpg
//! Placed 2 images: page 001 (+1), page 002 (+1)
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O; the
//! `print_*` wrappers write to stdout.

use crate::confirm::ConfirmRequest;
use crate::document::AlbumDocument;
use crate::session::{StudioEvent, UploadScope};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn scope_label(scope: UploadScope) -> String {
    match scope {
        UploadScope::Album => "album".to_string(),
        UploadScope::Page(n) => format!("page {}", format_index(n)),
    }
}

// ============================================================================
// Document
// ============================================================================

/// Format the cover and every page with its visible images.
pub fn format_document(doc: &AlbumDocument) -> Vec<String> {
    let mut lines = Vec::new();
    let cover = doc.cover();

    lines.push("Cover".to_string());
    let title = if cover.title.trim().is_empty() {
        "(untitled)"
    } else {
        cover.title.as_str()
    };
    lines.push(format!("{}Title: {}", indent(1), title));
    lines.push(format!(
        "{}Template: {}, Font: {}, Color: {}",
        indent(1),
        cover.template,
        cover.font,
        cover.color
    ));
    lines.push(format!("{}Date: {}", indent(1), cover.date));

    lines.push(String::new());
    lines.push("Pages".to_string());
    let mut hidden_total = 0;
    for page in doc.pages() {
        let visible = page.visible_images();
        lines.push(format!(
            "{} {} ({}/{})",
            format_index(page.page_number()),
            page.layout(),
            visible.len(),
            page.layout().capacity()
        ));
        for (i, image) in visible.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(i + 1), image));
        }
        let hidden = page.hidden_count();
        if hidden > 0 {
            lines.push(format!("{}+ {} hidden", indent(1), hidden));
            hidden_total += hidden;
        }
    }

    let used = doc.pages().iter().filter(|p| !p.images().is_empty()).count();
    let mut summary = format!(
        "{} on {}",
        plural(doc.total_images(), "image"),
        plural(used, "page")
    );
    if hidden_total > 0 {
        summary.push_str(&format!(", {} hidden", hidden_total));
    }
    lines.push(String::new());
    lines.push(summary);
    lines
}

/// Print the document summary to stdout.
pub fn print_document(doc: &AlbumDocument) {
    for line in format_document(doc) {
        println!("{}", line);
    }
}

// ============================================================================
// Confirmation prompts
// ============================================================================

/// Question and consequence lines shown before asking for `[y/N]`.
pub fn format_confirm_request(request: &ConfirmRequest) -> Vec<String> {
    match request {
        ConfirmRequest::ApplyLayoutToAll { layout, page_count } => vec![
            format!("Apply {} layout to all {}?", layout, plural(*page_count, "page")),
            format!(
                "{}Each page shows at most {}; the rest stay on the page, hidden.",
                indent(1),
                plural(layout.capacity(), "image")
            ),
        ],
        ConfirmRequest::SaveAlbum => vec![
            "Save this album design?".to_string(),
            format!(
                "{}The design is uploaded and handed to the cart; the editor closes.",
                indent(1)
            ),
        ],
    }
}

// ============================================================================
// Session progress
// ============================================================================

/// Format a single session event as display lines.
pub fn format_event(event: &StudioEvent) -> Vec<String> {
    match event {
        StudioEvent::UploadStarted { scope, file_count } => vec![format!(
            "Uploading {} to {}",
            plural(*file_count, "file"),
            scope_label(*scope)
        )],
        StudioEvent::FileUploaded {
            position,
            name,
            reference,
        } => vec![format!(
            "{}{} {} \u{2192} {}",
            indent(1),
            format_index(position + 1),
            name,
            reference
        )],
        StudioEvent::BatchPlaced { distribution } => {
            // Overflow is dropped silently; only placements are shown
            if distribution.placements.is_empty() {
                return vec!["Nothing to place".to_string()];
            }
            let pages: Vec<String> = distribution
                .placements
                .iter()
                .map(|p| format!("page {} (+{})", format_index(p.page_number), p.count))
                .collect();
            vec![format!(
                "Placed {}: {}",
                plural(distribution.placed(), "image"),
                pages.join(", ")
            )]
        }
        StudioEvent::PageAppended { page_number, count } => vec![format!(
            "Added {} to page {}",
            plural(*count, "image"),
            format_index(*page_number)
        )],
        StudioEvent::UploadFailed { scope, reason } => vec![format!(
            "Upload to {} failed: {}",
            scope_label(*scope),
            reason
        )],
        StudioEvent::Relocated {
            from_page,
            to_page,
            reference,
        } => vec![format!(
            "Moved {} from page {} to page {}",
            reference,
            format_index(*from_page),
            format_index(*to_page)
        )],
        StudioEvent::DropCancelled { page_number } => vec![format!(
            "Dropped on its own page {}: nothing moved",
            format_index(*page_number)
        )],
        StudioEvent::LayoutChanged {
            page_number,
            layout,
        } => match page_number {
            Some(n) => vec![format!("Page {} layout: {}", format_index(*n), layout)],
            None => vec![format!("All pages layout: {}", layout)],
        },
        StudioEvent::ExportSaved { preview_file_url } => {
            vec![format!("Saved album design \u{2192} {}", preview_file_url)]
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
