//! The overlay view service object and its lifecycle.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use host_page::{FileBundle, NodeHandle, PageDocument, PageNode, PageServices, RepeatGuard};
use thiserror::Error;

use crate::bridge::{self, AttachError};
use crate::detector;
use crate::events::{AttachEvents, AttachObserver};
use crate::intercept;
use crate::status::{self, DownloadState, OverlayError};

/// Id of the hidden scratch container used for temporary elements.
pub(crate) const SCRATCH_ID: &str = "cumulus_scratch";

/// Errors surfaced by [`ComposeOverlay::mount`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MountError {
    /// The host document has no body to anchor into.
    #[error("host document body unavailable: {0}")]
    BodyUnavailable(String),
    /// The hidden scratch container could not be installed.
    #[error("scratch container could not be installed: {0}")]
    ScratchUnavailable(String),
}

pub(crate) struct OverlayShared {
    pub(crate) services: PageServices,
    pub(crate) enabled: Cell<bool>,
    pub(crate) rows: RefCell<Vec<NodeHandle>>,
    pub(crate) current_row: RefCell<Option<NodeHandle>>,
    pub(crate) control: RefCell<Option<NodeHandle>>,
    pub(crate) local_picker: RefCell<Option<NodeHandle>>,
    pub(crate) downloads: RefCell<HashMap<String, NodeHandle>>,
    pub(crate) events: AttachEvents,
    pub(crate) scratch: NodeHandle,
    poll: RefCell<Option<RepeatGuard>>,
}

/// The single view coordinating interception, compose detection, row
/// tracking, attachment delivery, and download status for one page.
///
/// Constructed explicitly via [`ComposeOverlay::mount`] and passed to
/// whoever needs it; there is no ambient instance. Handles are cheap
/// clones of the same view.
#[derive(Clone)]
pub struct ComposeOverlay {
    pub(crate) shared: Rc<OverlayShared>,
}

impl ComposeOverlay {
    /// Mounts the overlay against the given host services: installs the
    /// scratch container and interception hooks and starts the compose
    /// poll.
    ///
    /// # Errors
    ///
    /// Returns a [`MountError`] when the host document cannot anchor the
    /// overlay.
    pub fn mount(services: PageServices) -> Result<Self, MountError> {
        let document = services.document.clone();
        let body = document
            .body()
            .map_err(MountError::BodyUnavailable)?;

        let scratch = document.create_element_raw("div");
        scratch.set_attribute("id", SCRATCH_ID);
        scratch.set_style("display", "none");
        let inserted = match body.first_child() {
            Some(first) => body.insert_before(&scratch, &first),
            None => body.append_child(&scratch),
        };
        inserted.map_err(MountError::ScratchUnavailable)?;

        let shared = Rc::new(OverlayShared {
            services,
            enabled: Cell::new(true),
            rows: RefCell::new(Vec::new()),
            current_row: RefCell::new(None),
            control: RefCell::new(None),
            local_picker: RefCell::new(None),
            downloads: RefCell::new(HashMap::new()),
            events: AttachEvents::default(),
            scratch,
            poll: RefCell::new(None),
        });

        intercept::install(&shared);

        let weak = Rc::downgrade(&shared);
        let guard = shared.services.scheduler.repeat(
            detector::COMPOSE_POLL_MS,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    detector::poll(&shared);
                }
            }),
        );
        *shared.poll.borrow_mut() = Some(guard);

        Ok(Self { shared })
    }

    /// Tears the overlay down: stops scheduling further poll ticks and
    /// removes the scratch container. Safe to call more than once.
    pub fn teardown(&self) {
        self.shared.poll.borrow_mut().take();
        self.shared.scratch.remove_from_parent();
        self.shared.rows.borrow_mut().clear();
        *self.shared.current_row.borrow_mut() = None;
    }

    /// Registers an observer for `attach` events.
    pub fn add_observer(&self, observer: AttachObserver) {
        self.shared.events.add_observer(observer);
    }

    /// Whether the cloud path is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.get()
    }

    /// Delivers `files` to the host through the substituted control.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::ControlUnavailable`] when no control was ever
    /// substituted; the cloud path is disabled and the user alerted before
    /// the error is returned.
    pub fn attach_files(&self, files: Rc<dyn FileBundle>) -> Result<(), AttachError> {
        bridge::attach_files(&self.shared, files)
    }

    /// Creates the progress widget for download `id`.
    ///
    /// # Errors
    ///
    /// Returns an [`OverlayError`] when the custom row is not present or
    /// the host rejects the widget.
    pub fn add_download_view(
        &self,
        id: &str,
        filename: &str,
        size_bytes: u64,
    ) -> Result<(), OverlayError> {
        status::add_download_view(&self.shared, id, filename, size_bytes)
    }

    /// Applies `state` to download `id`'s widget; unknown ids are a no-op.
    pub fn update_download_view(&self, id: &str, state: DownloadState) {
        status::update_download_view(&self.shared, id, state);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixture;
    use crate::status::CUSTOM_ROW_ID;

    #[test]
    fn mount_installs_a_hidden_scratch_container_at_the_body_head() {
        let fx = fixture::mount();
        let body = fx.document.body().expect("body");
        let first = body.first_child().expect("scratch");
        assert_eq!(first.attribute("id").as_deref(), Some(SCRATCH_ID));
        assert!(!first.is_visible());
    }

    #[test]
    fn teardown_stops_the_compose_poll() {
        let fx = fixture::mount();
        fx.overlay.teardown();

        fixture::install_compose_form(&fx);
        fx.scheduler.advance_ms(10_000);
        assert!(fx.document.element_by_id(CUSTOM_ROW_ID).is_none());
    }

    #[test]
    fn teardown_removes_the_scratch_container_and_is_idempotent() {
        let fx = fixture::mount();
        fx.overlay.teardown();
        fx.overlay.teardown();

        let body = fx.document.body().expect("body");
        assert!(body.first_child().is_none());
    }

    #[test]
    fn the_view_starts_enabled() {
        let fx = fixture::mount();
        assert!(fx.overlay.is_enabled());
    }
}
