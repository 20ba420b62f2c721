//! Browser element adapter.

use std::any::Any;
use std::rc::Rc;

use host_page::{ChangeHook, ClickDisposition, ClickHook, FileBundle, NodeHandle, PageNode};
use js_sys::{Function, Reflect};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

use crate::files::WebFileBundle;

/// One live DOM element.
pub struct WebNode {
    element: web_sys::Element,
}

impl WebNode {
    /// Wraps a DOM element.
    pub fn new(element: web_sys::Element) -> Self {
        Self { element }
    }

    pub(crate) fn element(&self) -> &web_sys::Element {
        &self.element
    }

    fn html_element(&self) -> Option<&web_sys::HtmlElement> {
        self.element.dyn_ref::<web_sys::HtmlElement>()
    }

    fn wrap(element: web_sys::Element) -> NodeHandle {
        Rc::new(WebNode::new(element))
    }

    fn require_web<'a>(handle: &'a NodeHandle, context: &str) -> Result<&'a WebNode, String> {
        handle
            .as_any()
            .downcast_ref::<WebNode>()
            .ok_or_else(|| format!("{context}: foreign node handle"))
    }
}

impl PageNode for WebNode {
    fn tag_name(&self) -> String {
        self.element.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let _ = self.element.set_attribute(name, value);
    }

    fn add_class(&self, class: &str) {
        let _ = self.element.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.element.class_list().remove_1(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.element.class_list().contains(class)
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Some(element) = self.html_element() {
            let _ = element.style().set_property(property, value);
        }
    }

    fn inner_text(&self) -> String {
        match self.html_element() {
            Some(element) => element.inner_text(),
            None => self.element.text_content().unwrap_or_default(),
        }
    }

    fn set_text(&self, text: &str) {
        self.element.set_text_content(Some(text));
    }

    fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    fn set_inner_html(&self, markup: &str) -> Result<(), String> {
        self.element.set_inner_html(markup);
        Ok(())
    }

    fn parent(&self) -> Option<NodeHandle> {
        self.element.parent_element().map(Self::wrap)
    }

    fn children(&self) -> Vec<NodeHandle> {
        let collection = self.element.children();
        (0..collection.length())
            .filter_map(|index| collection.item(index))
            .map(Self::wrap)
            .collect()
    }

    fn first_child(&self) -> Option<NodeHandle> {
        self.element.first_element_child().map(Self::wrap)
    }

    fn previous_sibling(&self) -> Option<NodeHandle> {
        self.element.previous_element_sibling().map(Self::wrap)
    }

    fn next_sibling(&self) -> Option<NodeHandle> {
        self.element.next_element_sibling().map(Self::wrap)
    }

    fn append_child(&self, child: &NodeHandle) -> Result<(), String> {
        let child = Self::require_web(child, "append_child")?;
        self.element
            .append_child(child.element())
            .map(|_| ())
            .map_err(|err| format!("append_child rejected: {err:?}"))
    }

    fn insert_before(&self, new_child: &NodeHandle, reference: &NodeHandle) -> Result<(), String> {
        let new_child = Self::require_web(new_child, "insert_before")?;
        let reference = Self::require_web(reference, "insert_before")?;
        self.element
            .insert_before(new_child.element(), Some(reference.element()))
            .map(|_| ())
            .map_err(|err| format!("insert_before rejected: {err:?}"))
    }

    fn remove_child(&self, child: &NodeHandle) -> Result<NodeHandle, String> {
        let child = Self::require_web(child, "remove_child")?;
        // Routed through the element's `removeChild` property, so a patched
        // container applies its removal hook here as well.
        let removed = self
            .element
            .remove_child(child.element())
            .map_err(|err| format!("remove_child rejected: {err:?}"))?;
        removed
            .dyn_into::<web_sys::Element>()
            .map(Self::wrap)
            .map_err(|_| "remove_child returned a non-element node".to_string())
    }

    fn remove_from_parent(&self) {
        self.element.remove();
    }

    fn is_visible(&self) -> bool {
        if let Some(element) = self.html_element() {
            if element.offset_width() > 0 || element.offset_height() > 0 {
                return true;
            }
        }
        self.element.get_client_rects().length() > 0
    }

    fn same_node(&self, other: &NodeHandle) -> bool {
        other
            .as_any()
            .downcast_ref::<WebNode>()
            .map(|web| js_sys::Object::is(self.element.as_ref(), web.element.as_ref()))
            .unwrap_or(false)
    }

    fn set_click_hook(&self, hook: ClickHook) {
        let Some(element) = self.html_element() else {
            log::warn!("click hook requested on a non-interactive element");
            return;
        };
        let closure = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
            if hook() == ClickDisposition::PreventDefault {
                event.prevent_default();
            }
        }));
        element.set_onclick(Some(closure.as_ref().unchecked_ref()));
        closure.forget();
    }

    fn click(&self) {
        if let Some(element) = self.html_element() {
            element.click();
        }
    }

    fn set_change_hook(&self, hook: ChangeHook) {
        let Some(element) = self.html_element() else {
            log::warn!("change hook requested on a non-interactive element");
            return;
        };
        let closure = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| hook()));
        element.set_onchange(Some(closure.as_ref().unchecked_ref()));
        closure.forget();
    }

    fn fire_change(&self) -> Result<(), String> {
        // Prefer the legacy direct-invocation path when the host runtime
        // still exposes it.
        let legacy = Reflect::get(self.element.as_ref(), &JsValue::from_str("fireEvent"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok());
        if let Some(fire_event) = legacy {
            return fire_event
                .call1(self.element.as_ref(), &JsValue::from_str("onchange"))
                .map(|_| ())
                .map_err(|err| format!("fireEvent failed: {err:?}"));
        }

        let document = self
            .element
            .owner_document()
            .ok_or_else(|| "element has no owner document".to_string())?;
        let event = document
            .create_event("HTMLEvents")
            .map_err(|err| format!("change event creation failed: {err:?}"))?;
        event.init_event_with_bubbles_and_cancelable("change", false, true);
        self.element
            .dispatch_event(&event)
            .map(|_| ())
            .map_err(|err| format!("change dispatch failed: {err:?}"))
    }

    fn set_files(&self, files: Rc<dyn FileBundle>) {
        let Some(bundle) = files.as_any().downcast_ref::<WebFileBundle>() else {
            log::warn!("file assignment requires a browser file bundle");
            return;
        };
        let _ = Reflect::set(
            self.element.as_ref(),
            &JsValue::from_str("files"),
            bundle.as_js(),
        );
    }

    fn files(&self) -> Option<Rc<dyn FileBundle>> {
        let value = Reflect::get(self.element.as_ref(), &JsValue::from_str("files")).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
        Some(Rc::new(WebFileBundle::from_js(value)))
    }

    fn descendant_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.element
            .query_selector(&format!("[id=\"{id}\"]"))
            .ok()
            .flatten()
            .map(Self::wrap)
    }

    fn descendant_by_class(&self, class: &str) -> Option<NodeHandle> {
        self.element
            .query_selector(&format!(".{class}"))
            .ok()
            .flatten()
            .map(Self::wrap)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
