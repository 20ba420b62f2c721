//! Remote file-picker boundary.
//!
//! The picker itself is an external collaborator; this crate only defines
//! the contract the overlay calls and the handle shape a pick produces.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Opaque handle to a file chosen in the remote picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileHandle {
    /// Download URL for the remote file.
    pub url: String,
    /// File name shown to the user.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// MIME type reported by the storage service.
    pub mime_type: String,
}

/// Callback invoked with the handle of a picked file.
pub type PickHandler = Box<dyn FnOnce(RemoteFileHandle)>;

/// Remote file-picker service.
pub trait RemoteFilePicker {
    /// Whether the picker has finished loading and can be opened.
    fn is_available(&self) -> bool;
    /// Opens the picker; `on_pick` runs when the user chooses a file and is
    /// dropped unchanged when the user cancels.
    fn pick(&self, on_pick: PickHandler);
}

/// Picker that is never available; forces the local-dialog fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRemotePicker;

impl RemoteFilePicker for NoopRemotePicker {
    fn is_available(&self) -> bool {
        false
    }

    fn pick(&self, _on_pick: PickHandler) {}
}

/// Test picker that resolves picks from a queue of prepared handles.
///
/// An empty queue behaves like a user cancelling the dialog.
#[derive(Clone, Default)]
pub struct QueuedRemotePicker {
    queue: Rc<RefCell<VecDeque<RemoteFileHandle>>>,
}

impl QueuedRemotePicker {
    /// Queues a handle for the next pick.
    pub fn push(&self, handle: RemoteFileHandle) {
        self.queue.borrow_mut().push_back(handle);
    }
}

impl RemoteFilePicker for QueuedRemotePicker {
    fn is_available(&self) -> bool {
        true
    }

    fn pick(&self, on_pick: PickHandler) {
        let next = self.queue.borrow_mut().pop_front();
        if let Some(handle) = next {
            on_pick(handle);
        }
    }
}
