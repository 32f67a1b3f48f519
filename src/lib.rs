//! # Album Studio
//!
//! The core of a printed photo album customizer. A customer designs a cover,
//! uploads photos, picks a layout per page and moves images between pages;
//! the finished design is serialized, uploaded as one artifact and handed to
//! the storefront's cart.
//!
//! # Architecture: One Writer, Pure Policies
//!
//! ```text
//!   CLI / UI ──▶ EditingSession ──▶ AlbumDocument ──▶ export ──▶ SaveSink
//!                 │   │    │
//!                 │   │    └─ DragSlot ─▶ relocate
//!                 │   └────── upload_batch ─▶ distribute
//!                 └────────── Confirmer (bulk layout change)
//! ```
//!
//! The [`session::EditingSession`] is the only writer. Every mutation is a
//! `&mut` method, so edits cannot interleave. The placement rules
//! ([`layout`], [`distribute`], [`relocate`]) are plain functions over pages and
//! tokens, unit-tested without any I/O. Uploads sit behind the
//! [`upload::Uploader`] trait so tests swap in a recording double.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | Layout tags, slot capacity and the visible-prefix rule |
//! | [`document`] | The album document: cover, pages, structural edits, JSON shape |
//! | [`distribute`] | Fill-forward placement of an upload batch across pages |
//! | [`relocate`] | Drag token and cross-page image moves |
//! | [`confirm`] | Confirmation requests for album-wide changes |
//! | [`upload`] | Upload collaborator: HTTP multipart or local directory |
//! | [`export`] | Serialize, upload and augment the finished design |
//! | [`session`] | Editing session tying the above together, with progress events |
//! | [`config`] | `studio.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting for documents and progress |
//!
//! # Design Decisions
//!
//! ## Capacity Bounds Distribution, Not Storage
//!
//! A page may hold more images than its layout shows. Bulk uploads respect
//! capacity and silently discard what does not fit; moves and per-page drops
//! do not, and the surplus stays hidden until the layout grows. Shrinking a
//! layout never deletes anything.
//!
//! ## All-Or-Nothing Batches
//!
//! A batch is uploaded completely before the document changes. The first
//! failure discards the batch, so the document never reflects a partial
//! upload. Closing a session trips its [`upload::CancelToken`], and a batch
//! still running for it is dropped instead of applied.
//!
//! ## Explicit Drag Slot
//!
//! The image being dragged lives in a [`relocate::DragSlot`] owned by the
//! session: armed by `drag_start`, emptied by every drop whatever its
//! outcome. A token that no longer matches the document is rejected rather
//! than moving the wrong image.
//!
//! ## The Document Is The Wire Format
//!
//! [`document::AlbumDocument`] serializes to exactly the JSON shape the
//! storefront stores, hidden images included. Export adds only
//! `previewFileUrl`.

pub mod config;
pub mod confirm;
pub mod distribute;
pub mod document;
pub mod export;
pub mod layout;
pub mod output;
pub mod relocate;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
