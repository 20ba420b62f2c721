//! Synchronous user-notification contract and adapters.

use std::cell::RefCell;
use std::rc::Rc;

/// Host service for blocking, user-visible alerts.
///
/// Delivery is synchronous: when `alert` returns, the user has been shown
/// the message (or the host has no way to show one).
pub trait AlertService {
    /// Shows `message` to the user.
    fn alert(&self, message: &str);
}

/// No-op alert service for unsupported targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlertService;

impl AlertService for NoopAlertService {
    fn alert(&self, _message: &str) {}
}

/// Alert service that records messages for inspection in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertService {
    messages: Rc<RefCell<Vec<String>>>,
}

impl MemoryAlertService {
    /// All messages shown so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl AlertService for MemoryAlertService {
    fn alert(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
