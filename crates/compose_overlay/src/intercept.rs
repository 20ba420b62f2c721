//! Interception of the host's element-creation and child-removal
//! primitives.
//!
//! The host builds its file-attachment control dynamically: it creates a
//! container div, writes an `<input type="file">` into it, and detaches the
//! input with a child removal. Both primitives are routed through hooks
//! registered against the document abstraction, so the overlay learns about
//! the control the instant it exists and can hand the host a substitute it
//! fully scripts. The substitute is a container element, because the
//! platform refuses programmatic file-list assignment on a real input.

use std::rc::{Rc, Weak};

use host_page::{
    ClickDisposition, ClickHook, CreationHook, NodeHandle, PageDocument, PageNode, RemovalHook,
};

use crate::bridge;
use crate::events::AttachEvent;
use crate::view::OverlayShared;

/// Focused-element text prefix identifying the host's attach affordance.
pub const ATTACH_LABEL_PREFIX: &str = "Attach";
/// Upper bound (exclusive) on the focused-element text length for the
/// attach heuristic.
pub const ATTACH_LABEL_MAX_LEN: usize = 30;

/// Returns whether the focused element's visible text marks the host as
/// being in its attach flow: short text starting with the attach label.
pub fn is_attach_context(focused_text: Option<&str>) -> bool {
    let Some(text) = focused_text else { return false };
    text.chars().count() < ATTACH_LABEL_MAX_LEN && text.starts_with(ATTACH_LABEL_PREFIX)
}

/// Installs both interception hooks against the document.
pub(crate) fn install(shared: &Rc<OverlayShared>) {
    let document = shared.services.document.clone();
    let weak = Rc::downgrade(shared);

    let removal_hook: RemovalHook = {
        let document = document.clone();
        let weak = weak.clone();
        Rc::new(move |removed: &NodeHandle| on_child_removed(&document, &weak, removed))
    };

    let creation_hook: CreationHook = {
        let document = document.clone();
        Rc::new(move |tag: &str| on_create_element(&document, &weak, &removal_hook, tag))
    };
    document.intercept_creation(creation_hook);
}

fn focused_text(document: &Rc<dyn PageDocument>) -> Option<String> {
    document.active_element().map(|node| node.inner_text())
}

fn on_create_element(
    document: &Rc<dyn PageDocument>,
    weak: &Weak<OverlayShared>,
    removal_hook: &RemovalHook,
    tag: &str,
) -> Option<NodeHandle> {
    let tag_lower = tag.to_ascii_lowercase();
    if is_attach_context(focused_text(document).as_deref()) && tag_lower.contains("input") {
        let substitute = document.create_element_raw("div");
        if let Some(shared) = weak.upgrade() {
            adopt_control(&shared, &substitute);
        }
        return Some(substitute);
    }
    if tag_lower.contains("div") {
        let container = document.create_element_raw(tag);
        if let Err(err) = document.intercept_removal(&container, removal_hook.clone()) {
            log::warn!("container removal wrap failed: {err}");
        }
        return Some(container);
    }
    None
}

fn on_child_removed(
    document: &Rc<dyn PageDocument>,
    weak: &Weak<OverlayShared>,
    removed: &NodeHandle,
) -> NodeHandle {
    let is_file_input = removed.tag_name() == "input"
        && removed
            .attribute("type")
            .map(|kind| kind.eq_ignore_ascii_case("file"))
            .unwrap_or(false);
    if !is_file_input || !is_attach_context(focused_text(document).as_deref()) {
        return removed.clone();
    }

    match rebuild_as_container(document, removed) {
        Ok(substitute) => {
            if let Some(shared) = weak.upgrade() {
                adopt_control(&shared, &substitute);
            }
            substitute
        }
        Err(err) => {
            log::warn!("attachment control rebuild failed: {err}");
            removed.clone()
        }
    }
}

/// Round-trips `node` through serialization to produce a structurally
/// identical container the platform places no file-list restriction on.
fn rebuild_as_container(
    document: &Rc<dyn PageDocument>,
    node: &NodeHandle,
) -> Result<NodeHandle, String> {
    let scratch = document.create_element_raw("div");
    scratch.append_child(node)?;
    let markup = scratch.inner_html();
    scratch.remove_child(node)?;

    let rewritten = markup.replacen("input", "div", 1);
    scratch.set_inner_html(&rewritten)?;
    let rebuilt = scratch
        .first_child()
        .ok_or_else(|| "rewritten markup produced no element".to_string())?;
    scratch.remove_child(&rebuilt)?;
    Ok(rebuilt)
}

/// Wires the substitute's click behavior and records it as the current
/// substituted control.
pub(crate) fn adopt_control(shared: &Rc<OverlayShared>, control: &NodeHandle) {
    let weak = Rc::downgrade(shared);
    let hook: ClickHook = Rc::new(move || {
        let Some(shared) = weak.upgrade() else {
            return ClickDisposition::Default;
        };
        if shared.enabled.get() && shared.services.picker.is_available() {
            let observer_target = Rc::downgrade(&shared);
            shared.services.picker.pick(Box::new(move |file| {
                if let Some(shared) = observer_target.upgrade() {
                    shared.events.publish(&AttachEvent { file });
                }
            }));
            ClickDisposition::PreventDefault
        } else {
            bridge::open_local_picker(&shared);
            ClickDisposition::Default
        }
    });
    control.set_click_hook(hook);
    *shared.control.borrow_mut() = Some(control.clone());
}
