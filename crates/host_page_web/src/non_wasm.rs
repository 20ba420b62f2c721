//! Signature-compatible stubs for non-browser targets.

use std::rc::Rc;

use host_page::{PageServices, RemoteFilePicker, ResourceProvider};

/// Builds the browser-backed service bundle.
///
/// # Errors
///
/// Always errors on native targets; browser services require wasm32.
pub fn browser_page_services(
    _picker: Rc<dyn RemoteFilePicker>,
    _resources: Rc<dyn ResourceProvider>,
) -> Result<PageServices, String> {
    Err("browser page services are only available when compiled for wasm32".to_string())
}
