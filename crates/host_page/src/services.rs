//! Host service bundle injected into the overlay runtime.

use std::rc::Rc;

use crate::{AlertService, PageDocument, RemoteFilePicker, ResourceProvider, Scheduler};

/// Runtime-selected host services handed to the overlay at mount.
///
/// All environment-specific selection happens before this bundle crosses
/// into `compose_overlay`, which keeps the runtime decoupled from browser
/// adapter details.
#[derive(Clone)]
pub struct PageServices {
    /// The host page's document.
    pub document: Rc<dyn PageDocument>,
    /// Timer service driving the compose poll and widget removals.
    pub scheduler: Rc<dyn Scheduler>,
    /// Synchronous user-alert service.
    pub alerts: Rc<dyn AlertService>,
    /// Remote file-picker service.
    pub picker: Rc<dyn RemoteFilePicker>,
    /// Icon and template lookup.
    pub resources: Rc<dyn ResourceProvider>,
}
