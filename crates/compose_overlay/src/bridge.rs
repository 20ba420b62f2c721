//! Delivery of chosen files into the host's own attachment pipeline.

use std::rc::Rc;

use host_page::{FileBundle, NodeHandle, PageDocument, PageNode};
use thiserror::Error;

use crate::rows::HIDDEN_CLASS;
use crate::view::OverlayShared;

const INTEGRATION_FAILURE_ALERT: &str = "General error in the Cumulus extension. \
Disabling and reverting to the regular attachment mechanism.";

/// Errors surfaced by [`crate::ComposeOverlay::attach_files`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// No substituted control was recorded before delivery was attempted.
    /// This is fatal for the session: the cloud path is disabled and the
    /// user has already been alerted when this error is returned.
    #[error("no substituted attachment control is available")]
    ControlUnavailable,
}

/// Assigns `files` to the substituted control and fires the host's change
/// notification, exactly as if the user had used the native dialog.
pub(crate) fn attach_files(
    shared: &Rc<OverlayShared>,
    files: Rc<dyn FileBundle>,
) -> Result<(), AttachError> {
    let control = shared.control.borrow().clone();
    let Some(control) = control else {
        shared.enabled.set(false);
        shared.services.alerts.alert(INTEGRATION_FAILURE_ALERT);
        return Err(AttachError::ControlUnavailable);
    };

    control.set_files(files);
    if control.parent().is_none() {
        control.set_style("display", "none");
        match shared.services.document.body() {
            Ok(body) => {
                if let Err(err) = prepend_child(&body, &control) {
                    log::warn!("could not reattach substituted control: {err}");
                }
            }
            Err(err) => log::warn!("could not reattach substituted control: {err}"),
        }
    }
    if let Err(err) = control.fire_change() {
        log::warn!("change notification failed: {err}");
    }
    Ok(())
}

fn prepend_child(parent: &NodeHandle, child: &NodeHandle) -> Result<(), String> {
    match parent.first_child() {
        Some(first) => parent.insert_before(child, &first),
        None => parent.append_child(child),
    }
}

/// Opens the native local-file dialog through a temporary hidden input,
/// used when the extension is disabled or the remote picker is missing.
pub(crate) fn open_local_picker(shared: &Rc<OverlayShared>) {
    let existing = shared.local_picker.borrow().clone();
    let picker = match existing {
        Some(picker) => picker,
        None => {
            let Some(picker) = build_local_picker(shared) else {
                return;
            };
            picker
        }
    };
    picker.click();
}

fn build_local_picker(shared: &Rc<OverlayShared>) -> Option<NodeHandle> {
    let input = shared.services.document.create_element_raw("input");
    input.set_attribute("type", "file");
    input.add_class(HIDDEN_CLASS);
    if let Err(err) = shared.scratch.append_child(&input) {
        log::warn!("local picker could not be attached: {err}");
        return None;
    }

    let weak = Rc::downgrade(shared);
    let weak_input: std::rc::Weak<dyn PageNode> = Rc::downgrade(&input);
    input.set_change_hook(Rc::new(move || {
        let Some(shared) = weak.upgrade() else { return };
        let Some(input) = weak_input.upgrade() else { return };
        if let Some(files) = input.files() {
            let _ = attach_files(&shared, files);
        }
        input.remove_from_parent();
        *shared.local_picker.borrow_mut() = None;
    }));

    *shared.local_picker.borrow_mut() = Some(input.clone());
    Some(input)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use host_page::MemoryFileBundle;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixture::{self, Fixture};

    fn adopt_substitute(fx: &Fixture) -> NodeHandle {
        fx.focus_attach_label();
        fx.document.create_element("input")
    }

    #[test]
    fn attached_files_are_observable_and_fire_the_host_change_listener() {
        let fx = fixture::mount_in_compose();
        let control = adopt_substitute(&fx);

        let changes = Rc::new(RefCell::new(0u32));
        let seen = changes.clone();
        control.set_change_hook(Rc::new(move || *seen.borrow_mut() += 1));

        let bundle = MemoryFileBundle::single("report.pdf", 26_000);
        fx.overlay
            .attach_files(bundle)
            .expect("attach");

        let files = control.files().expect("files");
        assert_eq!(files.len(), 1);
        let stat = files.stat(0).expect("stat");
        assert_eq!(stat.name, "report.pdf");
        assert_eq!(stat.size_bytes, 26_000);
        assert_eq!(*changes.borrow(), 1);
    }

    #[test]
    fn detached_control_is_reinserted_hidden_at_the_body_head() {
        let fx = fixture::mount_in_compose();
        let control = adopt_substitute(&fx);
        assert!(control.parent().is_none());

        fx.overlay
            .attach_files(MemoryFileBundle::single("a.txt", 10))
            .expect("attach");

        let body = fx.document.body().expect("body");
        let first = body.first_child().expect("first child");
        assert!(first.same_node(&control));
        assert!(!control.is_visible());
    }

    #[test]
    fn missing_control_disables_the_cloud_path_for_the_session() {
        let fx = fixture::mount_in_compose();

        let result = fx
            .overlay
            .attach_files(MemoryFileBundle::single("a.txt", 10));
        assert_eq!(result, Err(AttachError::ControlUnavailable));
        assert!(!fx.overlay.is_enabled());
        let alerts = fx.alerts.messages();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("Disabling"));

        // Later clicks take the native fallback even though the remote
        // picker is available.
        fx.picker.push(fixture::remote_file("ignored.bin"));
        let control = adopt_substitute(&fx);
        control.click();
        let fallback = fx.overlay.shared.scratch.first_child().expect("fallback");
        assert_eq!(fallback.tag_name(), "input");
    }

    #[test]
    fn local_picker_change_delivers_files_and_destroys_the_input() {
        let fx = fixture::mount_in_compose();
        let control = adopt_substitute(&fx);

        fx.overlay.shared.enabled.set(false);
        control.click();
        let fallback = fx.overlay.shared.scratch.first_child().expect("fallback");

        fallback.set_files(MemoryFileBundle::single("local.txt", 2_000));
        fallback.fire_change().expect("change");

        let files = control.files().expect("files");
        assert_eq!(files.stat(0).expect("stat").name, "local.txt");
        assert!(fx.overlay.shared.scratch.first_child().is_none());
        assert!(fx.overlay.shared.local_picker.borrow().is_none());
    }

    #[test]
    fn reopening_the_local_picker_reuses_a_pending_input() {
        let fx = fixture::mount_in_compose();
        let control = adopt_substitute(&fx);
        fx.overlay.shared.enabled.set(false);

        control.click();
        control.click();
        assert_eq!(fx.overlay.shared.scratch.children().len(), 1);
    }
}
