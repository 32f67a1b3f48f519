//! One album editing session.
//!
//! The session is the single writer for an [`AlbumDocument`]. It owns the
//! document, the drag slot, the upload collaborator and the cancellation
//! token, and is the only place where uploads and document mutation meet:
//!
//! ```text
//! bulk_upload ──▶ upload_batch ──▶ distribute ──▶ document
//! drag_start ───▶ DragSlot
//! drop_on ──────▶ DragSlot::take ─┬─▶ relocate ─────────────▶ document
//!                                 └─▶ upload_batch ─▶ append ▶ document
//! save ─────────▶ export ─▶ SaveSink::on_save ─▶ SaveSink::on_close
//! cancel ───────▶ CancelToken::cancel ─▶ SaveSink::on_close
//! ```
//!
//! Uploads complete before the document is touched, so a failed batch leaves
//! no partial state. Once the session is saved or cancelled its token is
//! tripped, and any batch still running for it is discarded.
//!
//! Progress is reported as [`StudioEvent`]s over an optional channel, for
//! the CLI to print as they happen.

use crate::config::StudioConfig;
use crate::confirm::{Confirmation, Confirmer};
use crate::distribute::{self, Distribution};
use crate::document::{AlbumDocument, CoverDesign, CoverField, ImageRef, StoreError};
use crate::export::{self, ExportError, SavedAlbum};
use crate::layout::Layout;
use crate::relocate::{self, DragSlot, InFlight, RelocateError, Relocation};
use crate::upload::{self, CancelToken, UploadError, UploadFile, Uploader};
use chrono::Local;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Relocate(#[from] RelocateError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("editing session is closed")]
    Closed,
}

/// Receives the outcome of a session.
pub trait SaveSink {
    /// The exported album, ready for the cart.
    fn on_save(&mut self, album: SavedAlbum);
    /// The editor is done, after a save or a cancel.
    fn on_close(&mut self);
}

/// Where an upload batch is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadScope {
    /// Bulk upload spread over the album by fill-forward.
    Album,
    /// Files dropped on one page (1-based number).
    Page(usize),
}

/// Progress notifications emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioEvent {
    UploadStarted {
        scope: UploadScope,
        file_count: usize,
    },
    FileUploaded {
        position: usize,
        name: String,
        reference: ImageRef,
    },
    BatchPlaced {
        distribution: Distribution,
    },
    PageAppended {
        page_number: usize,
        count: usize,
    },
    UploadFailed {
        scope: UploadScope,
        reason: String,
    },
    Relocated {
        from_page: usize,
        to_page: usize,
        reference: ImageRef,
    },
    DropCancelled {
        page_number: usize,
    },
    LayoutChanged {
        /// `None` when every page changed.
        page_number: Option<usize>,
        layout: Layout,
    },
    ExportSaved {
        preview_file_url: ImageRef,
    },
}

/// What a drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped back on the source page.
    Cancelled,
    Moved {
        from_page_index: usize,
        to_page_index: usize,
        reference: ImageRef,
    },
    /// Native files uploaded and appended to the target page.
    Uploaded { count: usize },
    /// Nothing in flight and no files.
    Ignored,
}

pub struct EditingSession<U> {
    document: AlbumDocument,
    drag: DragSlot,
    uploader: U,
    cancel: CancelToken,
    artifact_prefix: String,
    events: Option<Sender<StudioEvent>>,
    closed: bool,
}

impl<U: Uploader> EditingSession<U> {
    /// Open a fresh album. `page_count` overrides the configured count.
    pub fn open(config: &StudioConfig, page_count: Option<usize>, uploader: U) -> Self {
        let cover = CoverDesign {
            title: String::new(),
            template: config.cover.template.clone(),
            font: config.cover.font.clone(),
            date: Local::now().date_naive(),
            color: config.cover.color.clone(),
        };
        let document = AlbumDocument::with_layout(
            page_count.unwrap_or(config.album.page_count),
            config.album.default_layout,
            cover,
        );
        Self::resume(document, config, uploader)
    }

    /// Continue editing an existing document.
    pub fn resume(document: AlbumDocument, config: &StudioConfig, uploader: U) -> Self {
        Self {
            document,
            drag: DragSlot::default(),
            uploader,
            cancel: CancelToken::new(),
            artifact_prefix: config.export.artifact_prefix.clone(),
            events: None,
            closed: false,
        }
    }

    /// Report progress on `events`.
    pub fn with_events(mut self, events: Sender<StudioEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn document(&self) -> &AlbumDocument {
        &self.document
    }

    pub fn drag_slot(&self) -> &DragSlot {
        &self.drag
    }

    /// Token tripped when this session ends.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    pub fn set_cover_field(&mut self, field: CoverField) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.document.set_cover_field(field);
        Ok(())
    }

    pub fn set_page_layout(&mut self, page_number: usize, layout: Layout) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.document.set_page_layout(page_number, layout)?;
        tracing::info!(page_number, %layout, "page layout changed");
        self.emit(StudioEvent::LayoutChanged {
            page_number: Some(page_number),
            layout,
        });
        Ok(())
    }

    pub fn set_all_pages_layout(
        &mut self,
        layout: Layout,
        confirmer: &dyn Confirmer,
    ) -> Result<Confirmation, SessionError> {
        self.ensure_open()?;
        let outcome = self.document.set_all_pages_layout(layout, confirmer);
        if outcome == Confirmation::Applied {
            tracing::info!(%layout, "layout applied to all pages");
            self.emit(StudioEvent::LayoutChanged {
                page_number: None,
                layout,
            });
        }
        Ok(outcome)
    }

    pub fn remove_image(&mut self, page_number: usize, image_index: usize) -> Result<ImageRef, SessionError> {
        self.ensure_open()?;
        Ok(self.document.remove_image(page_number, image_index)?)
    }

    /// Upload `files` in order, then spread them over the album.
    pub fn bulk_upload(&mut self, files: &[UploadFile]) -> Result<Distribution, SessionError> {
        self.ensure_open()?;
        let references = self.upload_all(UploadScope::Album, files)?;
        let distribution = distribute::distribute(self.document.pages_mut(), references);
        tracing::debug!(
            placed = distribution.placed(),
            dropped = distribution.dropped,
            "batch distributed"
        );
        self.emit(StudioEvent::BatchPlaced {
            distribution: distribution.clone(),
        });
        Ok(distribution)
    }

    /// Pick up the image at `image_index` on the page at `page_index` (0-based).
    pub fn drag_start(&mut self, page_index: usize, image_index: usize) -> Result<(), SessionError> {
        self.ensure_open()?;
        let page = self.document.page(page_index + 1)?;
        let reference = page
            .images()
            .get(image_index)
            .cloned()
            .ok_or(StoreError::ImageIndexOutOfRange {
                page: page_index + 1,
                index: image_index,
                len: page.images().len(),
            })?;
        self.drag.arm(InFlight {
            source_page_index: page_index,
            source_image_index: image_index,
            reference,
        });
        Ok(())
    }

    /// Resolve a drop on the page at `target_page_index` (0-based).
    ///
    /// An image in flight always wins over `files`. The drag slot is empty
    /// when this returns, whatever the outcome.
    pub fn drop_on(
        &mut self,
        target_page_index: usize,
        files: &[UploadFile],
    ) -> Result<DropOutcome, SessionError> {
        let token = self.drag.take();
        self.ensure_open()?;

        if let Some(token) = token {
            return match relocate::relocate(&mut self.document, token, target_page_index)? {
                Relocation::SamePage => {
                    tracing::debug!(page_index = target_page_index, "drop on source page");
                    self.emit(StudioEvent::DropCancelled {
                        page_number: target_page_index + 1,
                    });
                    Ok(DropOutcome::Cancelled)
                }
                Relocation::Moved {
                    from_page_index,
                    to_page_index,
                    reference,
                } => {
                    tracing::debug!(from_page_index, to_page_index, "image relocated");
                    self.emit(StudioEvent::Relocated {
                        from_page: from_page_index + 1,
                        to_page: to_page_index + 1,
                        reference: reference.clone(),
                    });
                    Ok(DropOutcome::Moved {
                        from_page_index,
                        to_page_index,
                        reference,
                    })
                }
            };
        }

        if files.is_empty() {
            return Ok(DropOutcome::Ignored);
        }

        let page_number = target_page_index + 1;
        self.document.page(page_number)?;
        let references = self.upload_all(UploadScope::Page(page_number), files)?;
        let count = references.len();
        // Capacity is not enforced for drops; surplus is hidden by the layout
        self.document.pages_mut()[target_page_index]
            .images
            .extend(references);
        self.emit(StudioEvent::PageAppended { page_number, count });
        Ok(DropOutcome::Uploaded { count })
    }

    /// Export the album, hand it to `sink` and close the session.
    ///
    /// On failure the session stays open and the document is unchanged.
    pub fn save(&mut self, sink: &mut impl SaveSink) -> Result<ImageRef, SessionError> {
        self.ensure_open()?;
        let saved = export::export(&self.document, &self.uploader, &self.artifact_prefix, &self.cancel)
            .inspect_err(|e| tracing::warn!(error = %e, "export failed"))?;
        let preview_file_url = saved.preview_file_url.clone();
        self.emit(StudioEvent::ExportSaved {
            preview_file_url: preview_file_url.clone(),
        });
        sink.on_save(saved);
        self.close(sink);
        Ok(preview_file_url)
    }

    /// Discard the album without saving.
    pub fn cancel(mut self, sink: &mut impl SaveSink) {
        if !self.closed {
            self.close(sink);
        }
    }

    fn close(&mut self, sink: &mut impl SaveSink) {
        self.cancel.cancel();
        self.drag = DragSlot::Empty;
        self.closed = true;
        sink.on_close();
    }

    fn upload_all(&self, scope: UploadScope, files: &[UploadFile]) -> Result<Vec<ImageRef>, SessionError> {
        self.emit(StudioEvent::UploadStarted {
            scope,
            file_count: files.len(),
        });
        let events = &self.events;
        let result = upload::upload_batch(&self.uploader, files, &self.cancel, |position, file, reference| {
            send(
                events,
                StudioEvent::FileUploaded {
                    position,
                    name: file.name.clone(),
                    reference: reference.clone(),
                },
            );
        });
        result.map_err(|e| {
            tracing::warn!(?scope, error = %e, "upload failed");
            self.emit(StudioEvent::UploadFailed {
                scope,
                reason: e.to_string(),
            });
            SessionError::from(e)
        })
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn emit(&self, event: StudioEvent) {
        send(&self.events, event);
    }
}

fn send(events: &Option<Sender<StudioEvent>>, event: StudioEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening
        tx.send(event).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoConfirm;
    use crate::test_helpers::*;
    use std::sync::mpsc;

    fn session(pages: usize) -> EditingSession<MockUploader> {
        EditingSession::open(&StudioConfig::default(), Some(pages), MockUploader::new())
    }

    #[test]
    fn open_uses_config_defaults() {
        let mut config = StudioConfig::default();
        config.album.page_count = 5;
        config.album.default_layout = Layout::Double;
        config.cover.template = "modern".to_string();

        let s = EditingSession::open(&config, None, MockUploader::new());
        let doc = s.document();
        assert_eq!(doc.page_count(), 5);
        assert!(doc.pages().iter().all(|p| p.layout() == Layout::Double));
        assert_eq!(doc.cover().template, "modern");
        assert_eq!(doc.cover().font, "serif");
        assert!(doc.cover().title.is_empty());
        assert!(s.is_open());
    }

    #[test]
    fn open_page_count_override() {
        assert_eq!(session(3).document().page_count(), 3);
    }

    #[test]
    fn bulk_upload_distributes() {
        let mut s = session(3);
        let result = s.bulk_upload(&upload_files(&["a.jpg", "b.jpg"])).unwrap();
        assert_eq!(result.placed(), 2);
        assert_eq!(occupancy(s.document()), vec![1, 1, 0]);
        assert_eq!(image_urls(s.document().page(1).unwrap()), vec!["mock://a.jpg"]);
    }

    #[test]
    fn bulk_upload_failure_leaves_document_untouched() {
        let mut s = EditingSession::open(
            &StudioConfig::default(),
            Some(3),
            MockUploader::failing_on("b.jpg"),
        );
        let err = s
            .bulk_upload(&upload_files(&["a.jpg", "b.jpg", "c.jpg"]))
            .unwrap_err();
        assert!(matches!(err, SessionError::Upload(UploadError::Failed(_))));
        assert_eq!(s.document().total_images(), 0);
    }

    #[test]
    fn bulk_upload_emits_events() {
        let (tx, rx) = mpsc::channel();
        let mut s = session(1).with_events(tx);
        s.bulk_upload(&upload_files(&["a.jpg", "b.jpg"])).unwrap();
        drop(s);

        let events: Vec<StudioEvent> = rx.iter().collect();
        assert_eq!(
            events[0],
            StudioEvent::UploadStarted {
                scope: UploadScope::Album,
                file_count: 2
            }
        );
        assert!(matches!(&events[1], StudioEvent::FileUploaded { position: 0, name, .. } if name == "a.jpg"));
        assert!(matches!(&events[2], StudioEvent::FileUploaded { position: 1, .. }));
        match &events[3] {
            StudioEvent::BatchPlaced { distribution } => {
                assert_eq!(distribution.placed(), 1);
                assert_eq!(distribution.dropped, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn failed_upload_emits_failure_event() {
        let (tx, rx) = mpsc::channel();
        let mut s = EditingSession::open(&StudioConfig::default(), Some(1), MockUploader::failing_all())
            .with_events(tx);
        s.bulk_upload(&upload_files(&["a.jpg"])).unwrap_err();
        drop(s);
        let events: Vec<StudioEvent> = rx.iter().collect();
        assert!(matches!(
            events.last(),
            Some(StudioEvent::UploadFailed { scope: UploadScope::Album, .. })
        ));
    }

    #[test]
    fn drag_start_arms_slot_with_reference() {
        let mut s = session(2);
        s.bulk_upload(&upload_files(&["a.jpg"])).unwrap();
        s.drag_start(0, 0).unwrap();
        let token = s.drag_slot().holding().unwrap();
        assert_eq!(token.source_page_index, 0);
        assert_eq!(token.source_image_index, 0);
        assert_eq!(token.reference.as_str(), "mock://a.jpg");
    }

    #[test]
    fn drag_start_invalid_index_leaves_slot_empty() {
        let mut s = session(2);
        assert!(matches!(
            s.drag_start(0, 0),
            Err(SessionError::Store(StoreError::ImageIndexOutOfRange { .. }))
        ));
        assert!(matches!(
            s.drag_start(9, 0),
            Err(SessionError::Store(StoreError::PageOutOfRange { .. }))
        ));
        assert!(s.drag_slot().is_empty());
    }

    #[test]
    fn drop_on_other_page_moves() {
        let mut s = session(2);
        s.bulk_upload(&upload_files(&["a.jpg", "b.jpg"])).unwrap();
        s.drag_start(0, 0).unwrap();
        let outcome = s.drop_on(1, &[]).unwrap();

        assert!(matches!(outcome, DropOutcome::Moved { from_page_index: 0, to_page_index: 1, .. }));
        assert!(s.drag_slot().is_empty());
        assert_eq!(occupancy(s.document()), vec![0, 2]);
        assert_eq!(
            image_urls(s.document().page(2).unwrap()),
            vec!["mock://b.jpg", "mock://a.jpg"]
        );
    }

    #[test]
    fn drop_on_same_page_is_noop_and_clears_slot() {
        let mut s = session(2);
        s.bulk_upload(&upload_files(&["a.jpg"])).unwrap();
        let before = s.document().clone();
        s.drag_start(0, 0).unwrap();

        assert_eq!(s.drop_on(0, &[]).unwrap(), DropOutcome::Cancelled);
        assert!(s.drag_slot().is_empty());
        assert_eq!(s.document(), &before);
    }

    #[test]
    fn token_wins_over_files() {
        let mut s = session(2);
        s.bulk_upload(&upload_files(&["a.jpg"])).unwrap();
        s.drag_start(0, 0).unwrap();
        let outcome = s.drop_on(1, &upload_files(&["x.jpg"])).unwrap();
        assert!(matches!(outcome, DropOutcome::Moved { .. }));
        assert_eq!(s.document().total_images(), 1);
    }

    #[test]
    fn drop_files_appends_to_target_ignoring_capacity() {
        let mut s = session(2);
        let outcome = s
            .drop_on(1, &upload_files(&["x.jpg", "y.jpg", "z.jpg"]))
            .unwrap();
        assert_eq!(outcome, DropOutcome::Uploaded { count: 3 });
        let page = s.document().page(2).unwrap();
        assert_eq!(image_urls(page), vec!["mock://x.jpg", "mock://y.jpg", "mock://z.jpg"]);
        assert_eq!(page.hidden_count(), 2);
    }

    #[test]
    fn drop_files_failure_appends_nothing() {
        let mut s = EditingSession::open(
            &StudioConfig::default(),
            Some(2),
            MockUploader::failing_on("y.jpg"),
        );
        let err = s.drop_on(0, &upload_files(&["x.jpg", "y.jpg"])).unwrap_err();
        assert!(matches!(err, SessionError::Upload(_)));
        assert_eq!(s.document().total_images(), 0);
        assert!(s.drag_slot().is_empty());
    }

    #[test]
    fn drop_files_on_missing_page_uploads_nothing() {
        let uploader = MockUploader::new();
        let mut s = EditingSession::open(&StudioConfig::default(), Some(2), &uploader);
        let err = s.drop_on(5, &upload_files(&["x.jpg"])).unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::PageOutOfRange { .. })));
        assert!(uploader.uploaded_names().is_empty());
    }

    #[test]
    fn drop_with_nothing_is_ignored() {
        let mut s = session(1);
        assert_eq!(s.drop_on(0, &[]).unwrap(), DropOutcome::Ignored);
    }

    #[test]
    fn stale_drop_clears_slot() {
        let mut s = session(2);
        s.bulk_upload(&upload_files(&["a.jpg"])).unwrap();
        s.drag_start(0, 0).unwrap();
        s.remove_image(1, 0).unwrap();
        let err = s.drop_on(1, &[]).unwrap_err();
        assert!(matches!(err, SessionError::Relocate(RelocateError::StaleToken { .. })));
        assert!(s.drag_slot().is_empty());
    }

    #[test]
    fn layout_changes_emit_events() {
        let (tx, rx) = mpsc::channel();
        let mut s = session(2).with_events(tx);
        s.set_page_layout(2, Layout::Grid).unwrap();
        s.set_all_pages_layout(Layout::Collage, &AutoConfirm(false)).unwrap();
        s.set_all_pages_layout(Layout::Double, &AutoConfirm(true)).unwrap();
        drop(s);

        let events: Vec<StudioEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                StudioEvent::LayoutChanged {
                    page_number: Some(2),
                    layout: Layout::Grid
                },
                StudioEvent::LayoutChanged {
                    page_number: None,
                    layout: Layout::Double
                },
            ]
        );
    }

    #[test]
    fn save_without_title_keeps_session_open() {
        let mut s = session(2);
        let mut sink = RecordingSink::default();
        let err = s.save(&mut sink).unwrap_err();
        assert!(matches!(err, SessionError::Export(ExportError::MissingTitle)));
        assert!(s.is_open());
        assert!(sink.saved.is_empty());
        assert_eq!(sink.closed, 0);
    }

    #[test]
    fn save_hands_album_to_sink_and_closes() {
        let mut s = session(2);
        s.set_cover_field(CoverField::Title("Holiday".to_string())).unwrap();
        s.bulk_upload(&upload_files(&["a.jpg"])).unwrap();
        let token = s.cancel_token();
        let mut sink = RecordingSink::default();

        let url = s.save(&mut sink).unwrap();
        assert!(url.as_str().starts_with("mock://album-design-"));
        assert_eq!(sink.saved.len(), 1);
        assert_eq!(sink.saved[0].preview_file_url, url);
        assert_eq!(&sink.saved[0].document, s.document());
        assert_eq!(sink.closed, 1);
        assert!(!s.is_open());
        assert!(token.is_cancelled());
    }

    #[test]
    fn save_upload_failure_keeps_session_open() {
        let mut s = EditingSession::open(&StudioConfig::default(), Some(1), MockUploader::failing_all());
        s.set_cover_field(CoverField::Title("Holiday".to_string())).unwrap();
        let before = s.document().clone();
        let mut sink = RecordingSink::default();

        assert!(matches!(
            s.save(&mut sink),
            Err(SessionError::Export(ExportError::Upload(_)))
        ));
        assert!(s.is_open());
        assert_eq!(s.document(), &before);
        assert_eq!(sink.closed, 0);
    }

    #[test]
    fn closed_session_rejects_edits() {
        let mut s = session(1);
        s.set_cover_field(CoverField::Title("Holiday".to_string())).unwrap();
        let mut sink = RecordingSink::default();
        s.save(&mut sink).unwrap();

        assert!(matches!(s.set_page_layout(1, Layout::Grid), Err(SessionError::Closed)));
        assert!(matches!(
            s.bulk_upload(&upload_files(&["a.jpg"])),
            Err(SessionError::Closed)
        ));
        assert!(matches!(s.save(&mut sink), Err(SessionError::Closed)));
    }

    #[test]
    fn cancel_trips_token_and_closes() {
        let s = session(1);
        let token = s.cancel_token();
        let mut sink = RecordingSink::default();
        s.cancel(&mut sink);
        assert!(token.is_cancelled());
        assert_eq!(sink.closed, 1);
        assert!(sink.saved.is_empty());
    }
}
