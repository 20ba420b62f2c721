//! Presentation/interception layer grafting a cloud-attachment affordance
//! onto a third-party webmail compose UI, without touching the host's own
//! code.
//!
//! The overlay intercepts the host document's element-creation and
//! child-removal primitives to substitute a scriptable stand-in for the
//! host's file-attachment control, polls for the compose form to keep a
//! custom status row positioned and its icon visible through host layout
//! churn, and bridges picked files back into the host's own change
//! handling. The controller driving cloud downloads subscribes through
//! [`ComposeOverlay::add_observer`] and reports progress through the
//! download-view calls.

mod bridge;
mod detector;
pub mod events;
pub mod intercept;
mod rows;
mod status;
mod view;

#[cfg(test)]
pub(crate) mod fixture;

pub use bridge::AttachError;
pub use events::{AttachEvent, AttachEvents, AttachObserver};
pub use intercept::{is_attach_context, ATTACH_LABEL_MAX_LEN, ATTACH_LABEL_PREFIX};
pub use status::{DownloadState, OverlayError, MAX_ATTACHMENT_MB};
pub use view::{ComposeOverlay, MountError};
