//! Per-download progress widgets rendered in the custom status row.

use std::rc::Rc;

use host_page::{IconKey, PageDocument, PageNode, TemplateKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::view::OverlayShared;

/// Attachment size cap enforced by the host, surfaced in the size-limit
/// message.
pub const MAX_ATTACHMENT_MB: u64 = 25;

/// How long a widget lingers after reaching a terminal state.
pub(crate) const WIDGET_LINGER_MS: u32 = 10_000;

/// Id of the injected custom row.
pub(crate) const CUSTOM_ROW_ID: &str = "cumulus_customrow";
/// Id of the downloads container inside the custom row.
pub(crate) const DOWNLOADS_CONTAINER_ID: &str = "cumulus_downloads";

const FILENAME_ID: &str = "filename";
const MESSAGE_ID: &str = "downloading_msg";
const STATUS_IMAGE_ID: &str = "download_status_img";

/// Lifecycle states a cloud download reports to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DownloadState {
    /// Download finished; the widget clears after a short linger.
    Done,
    /// Server-side processing; the widget stays until a terminal state.
    Processing,
    /// The host's attachment size cap rejected the file.
    MaxSizeExceeded,
    /// Transient failure; the user may retry manually.
    Error,
}

/// Errors surfaced by [`crate::ComposeOverlay::add_download_view`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// The widget template could not be instantiated.
    #[error("download widget template rejected: {0}")]
    Template(String),
    /// The custom status row has not been injected yet.
    #[error("compose status row is not present")]
    ComposeRowUnavailable,
    /// The host rejected a DOM mutation.
    #[error("host rejected widget insertion: {0}")]
    Host(String),
}

/// Creates the progress widget for download `id` and reveals the custom
/// row.
pub(crate) fn add_download_view(
    shared: &Rc<OverlayShared>,
    id: &str,
    filename: &str,
    size_bytes: u64,
) -> Result<(), OverlayError> {
    let document = shared.services.document.clone();
    let template = shared.services.resources.template(TemplateKey::DownloadWidget);
    let widget = document
        .create_fragment(&template)
        .map_err(OverlayError::Template)?;
    widget.set_attribute("id", id);

    let container = document
        .element_by_id(DOWNLOADS_CONTAINER_ID)
        .ok_or(OverlayError::ComposeRowUnavailable)?;
    container.append_child(&widget).map_err(OverlayError::Host)?;
    if let Some(custom_row) = document.element_by_id(CUSTOM_ROW_ID) {
        custom_row.set_style("display", "table-row");
    }

    let kib = size_bytes.div_ceil(1024);
    if let Some(label) = widget.descendant_by_id(FILENAME_ID) {
        label.set_text(&format!("{filename}  {kib}K"));
    }
    if let Some(image) = widget.descendant_by_id(STATUS_IMAGE_ID) {
        let url = shared.services.resources.icon_url(IconKey::DownloadLoading);
        image.set_attribute("src", &url);
    }

    shared.downloads.borrow_mut().insert(id.to_string(), widget);
    Ok(())
}

/// Applies `state` to download `id`'s widget. Unknown ids (including ids
/// whose widget already cleared) are a no-op.
pub(crate) fn update_download_view(shared: &Rc<OverlayShared>, id: &str, state: DownloadState) {
    let widget = shared.downloads.borrow().get(id).cloned();
    let Some(widget) = widget else { return };

    let (message, icon, terminal) = match state {
        DownloadState::Done => ("Done.".to_string(), Some(IconKey::DownloadComplete), true),
        DownloadState::Processing => ("Processing".to_string(), None, false),
        DownloadState::MaxSizeExceeded => (
            format!("{MAX_ATTACHMENT_MB}MB attachment size limit exceeded."),
            Some(IconKey::Error),
            true,
        ),
        DownloadState::Error => (
            "Error, please try again.".to_string(),
            Some(IconKey::Error),
            true,
        ),
    };

    if let Some(label) = widget.descendant_by_id(MESSAGE_ID) {
        label.set_text(&message);
    }
    if let Some(key) = icon {
        if let Some(image) = widget.descendant_by_id(STATUS_IMAGE_ID) {
            image.set_attribute("src", &shared.services.resources.icon_url(key));
        }
    }
    if terminal {
        schedule_removal(shared, id);
    }
}

/// Schedules the one-shot widget removal. The removal is idempotent: if the
/// widget is gone by the time the timer fires, nothing happens.
fn schedule_removal(shared: &Rc<OverlayShared>, id: &str) {
    let weak = Rc::downgrade(shared);
    let id = id.to_string();
    shared.services.scheduler.once(
        WIDGET_LINGER_MS,
        Box::new(move || {
            let Some(shared) = weak.upgrade() else { return };
            let widget = shared.downloads.borrow_mut().remove(&id);
            let Some(widget) = widget else { return };
            widget.remove_from_parent();
        }),
    );
}
