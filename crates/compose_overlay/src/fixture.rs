//! Shared in-memory world for unit tests.

use std::rc::Rc;

use host_page::{
    ManualScheduler, MemoryAlertService, MemoryDocument, NodeHandle, PageDocument, PageNode,
    PageServices, QueuedRemotePicker, RemoteFileHandle, StaticResources,
};

use crate::detector::COMPOSE_POLL_MS;
use crate::ComposeOverlay;

pub(crate) struct Fixture {
    pub overlay: ComposeOverlay,
    pub document: MemoryDocument,
    pub scheduler: ManualScheduler,
    pub alerts: MemoryAlertService,
    pub picker: QueuedRemotePicker,
}

impl Fixture {
    /// Advances virtual time by one compose-poll period.
    pub fn tick(&self) {
        self.scheduler.advance_ms(u64::from(COMPOSE_POLL_MS));
    }

    /// Marks the host's attach label as the focused element.
    pub fn focus_attach_label(&self) {
        let label = self
            .document
            .element_by_id("attach_label")
            .expect("attach label");
        self.document.set_active(Some(&label));
    }

    pub fn candidate_row(&self, index: usize) -> NodeHandle {
        let ids = ["recipients_row", "attach_row", "extra_row"];
        self.document
            .element_by_id(ids[index])
            .expect("candidate row")
    }
}

pub(crate) fn mount() -> Fixture {
    let document = MemoryDocument::default();
    let scheduler = ManualScheduler::default();
    let alerts = MemoryAlertService::default();
    let picker = QueuedRemotePicker::default();
    let services = PageServices {
        document: Rc::new(document.clone()),
        scheduler: Rc::new(scheduler.clone()),
        alerts: Rc::new(alerts.clone()),
        picker: Rc::new(picker.clone()),
        resources: Rc::new(StaticResources),
    };
    let overlay = ComposeOverlay::mount(services).expect("mount");
    Fixture {
        overlay,
        document,
        scheduler,
        alerts,
        picker,
    }
}

const COMPOSE_MARKUP: &str = concat!(
    r#"<div role="main"><table>"#,
    r#"<tr id="recipients_row"><td class="label_cell"></td>"#,
    r#"<td><textarea name="to"></textarea></td></tr>"#,
    r#"<tr id="subject_row"><td class="label_cell"></td>"#,
    r#"<td><input name="subject" /></td></tr>"#,
    r#"<tr id="attach_row"><td class="label_cell attach_cell"></td>"#,
    r#"<td><span id="attach_label">Attach a file</span></td></tr>"#,
    r#"<tr id="extra_row"><td class="label_cell"></td><td></td></tr>"#,
    r#"</table></div>"#,
);

/// Appends a host compose form shaped like the real thing to the body.
pub(crate) fn install_compose_form(fx: &Fixture) {
    let fragment = fx
        .document
        .create_fragment(COMPOSE_MARKUP)
        .expect("compose markup");
    let body = fx.document.body().expect("body");
    body.append_child(&fragment).expect("append compose form");
}

/// Mounts an overlay over a page already showing the compose form.
pub(crate) fn mount_in_compose() -> Fixture {
    let fx = mount();
    install_compose_form(&fx);
    fx
}

pub(crate) fn remote_file(name: &str) -> RemoteFileHandle {
    RemoteFileHandle {
        url: format!("https://cloud.example/{name}"),
        name: name.to_string(),
        size_bytes: 2_048,
        mime_type: "application/octet-stream".to_string(),
    }
}
