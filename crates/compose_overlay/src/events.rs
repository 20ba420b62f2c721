//! Typed publish/subscribe channel between the view and its controller.

use std::cell::RefCell;
use std::rc::Rc;

use host_page::RemoteFileHandle;

/// The single event kind the view publishes: the user picked a remote file
/// to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachEvent {
    /// Handle to the picked remote file.
    pub file: RemoteFileHandle,
}

/// Observer callback for [`AttachEvent`]s.
pub type AttachObserver = Rc<dyn Fn(&AttachEvent)>;

/// Observer registry carrying the `attach` event channel.
#[derive(Default)]
pub struct AttachEvents {
    observers: RefCell<Vec<AttachObserver>>,
}

impl AttachEvents {
    /// Registers an observer; observers fire in registration order.
    pub fn add_observer(&self, observer: AttachObserver) {
        self.observers.borrow_mut().push(observer);
    }

    /// Publishes `event` to every registered observer.
    pub fn publish(&self, event: &AttachEvent) {
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn event(name: &str) -> AttachEvent {
        AttachEvent {
            file: RemoteFileHandle {
                url: format!("https://files.example/{name}"),
                name: name.to_string(),
                size_bytes: 1,
                mime_type: "text/plain".to_string(),
            },
        }
    }

    #[test]
    fn observers_fire_in_registration_order() {
        let events = AttachEvents::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second"] {
            let seen = seen.clone();
            events.add_observer(Rc::new(move |event: &AttachEvent| {
                seen.borrow_mut().push(format!("{label}:{}", event.file.name));
            }));
        }

        events.publish(&event("a.txt"));
        assert_eq!(*seen.borrow(), vec!["first:a.txt", "second:a.txt"]);
    }
}
