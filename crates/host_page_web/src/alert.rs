//! Browser alert adapter.

use host_page::AlertService;

/// Blocking alert dialog backed by `window.alert`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebAlertService;

impl AlertService for WebAlertService {
    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}
