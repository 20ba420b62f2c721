//! Browser document adapter and host-primitive interposition.
//!
//! The interception contract is implemented by patching the live document's
//! `createElement` and, per wrapped container, `removeChild` properties.
//! The native functions are saved under renamed properties first, so hooks
//! can always reach the unpatched primitives.

use std::cell::RefCell;
use std::rc::Rc;

use host_page::{
    CreationHook, NodeHandle, PageDocument, PageNode, PageServices, RemovalHook, RemoteFilePicker,
    ResourceProvider,
};
use js_sys::{Function, Reflect};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

use crate::alert::WebAlertService;
use crate::node::WebNode;
use crate::schedule::WebScheduler;

const SAVED_CREATE_ELEMENT: &str = "cumulus_create_element";
const SAVED_REMOVE_CHILD: &str = "cumulus_remove_child";

/// The live browser document.
#[derive(Clone)]
pub struct WebDocument {
    document: web_sys::Document,
    creation_hook: Rc<RefCell<Option<CreationHook>>>,
}

impl WebDocument {
    /// Wraps a browser document.
    pub fn new(document: web_sys::Document) -> Self {
        Self {
            document,
            creation_hook: Rc::new(RefCell::new(None)),
        }
    }

    fn saved_create(&self) -> Option<Function> {
        Reflect::get(
            self.document.as_ref(),
            &JsValue::from_str(SAVED_CREATE_ELEMENT),
        )
        .ok()?
        .dyn_into()
        .ok()
    }

    /// Creates an element through the saved native primitive, bypassing any
    /// installed patch.
    fn native_create(&self, tag: &str) -> Option<web_sys::Element> {
        if let Some(saved) = self.saved_create() {
            return saved
                .call1(self.document.as_ref(), &JsValue::from_str(tag))
                .ok()?
                .dyn_into()
                .ok();
        }
        self.document.create_element(tag).ok()
    }

    fn install_creation_patch(&self) -> Result<(), String> {
        let target: &JsValue = self.document.as_ref();
        if Reflect::has(target, &JsValue::from_str(SAVED_CREATE_ELEMENT)).unwrap_or(false) {
            return Ok(());
        }

        let original: Function = Reflect::get(target, &JsValue::from_str("createElement"))
            .map_err(|err| format!("createElement lookup failed: {err:?}"))?
            .dyn_into()
            .map_err(|_| "createElement is not callable".to_string())?;
        Reflect::set(
            target,
            &JsValue::from_str(SAVED_CREATE_ELEMENT),
            original.as_ref(),
        )
        .map_err(|err| format!("saving createElement failed: {err:?}"))?;

        let hook_cell = self.creation_hook.clone();
        let document = self.document.clone();
        let patched = Closure::<dyn FnMut(String) -> JsValue>::wrap(Box::new(move |tag: String| {
            let hook = hook_cell.borrow().clone();
            if let Some(hook) = hook {
                if let Some(node) = hook(&tag) {
                    if let Some(web) = node.as_any().downcast_ref::<WebNode>() {
                        return web.element().clone().into();
                    }
                }
            }
            original
                .call1(document.as_ref(), &JsValue::from_str(&tag))
                .unwrap_or(JsValue::NULL)
        }));
        Reflect::set(
            target,
            &JsValue::from_str("createElement"),
            patched.as_ref().unchecked_ref(),
        )
        .map_err(|err| format!("patching createElement failed: {err:?}"))?;
        patched.forget();
        Ok(())
    }
}

impl PageDocument for WebDocument {
    fn create_element(&self, tag: &str) -> NodeHandle {
        let hook = self.creation_hook.borrow().clone();
        if let Some(hook) = hook {
            if let Some(node) = hook(tag) {
                return node;
            }
        }
        self.create_element_raw(tag)
    }

    fn create_element_raw(&self, tag: &str) -> NodeHandle {
        let element = self.native_create(tag).or_else(|| {
            log::warn!("element creation failed for tag `{tag}`; substituting a div");
            self.native_create("div")
        });
        match element {
            Some(element) => Rc::new(WebNode::new(element)),
            None => wasm_bindgen::throw_str("document cannot create elements"),
        }
    }

    fn create_fragment(&self, markup: &str) -> Result<NodeHandle, String> {
        let scratch = self.create_element_raw("div");
        scratch.set_inner_html(markup)?;
        let first = scratch
            .first_child()
            .ok_or_else(|| "fragment markup contains no element".to_string())?;
        first.remove_from_parent();
        Ok(first)
    }

    fn body(&self) -> Result<NodeHandle, String> {
        self.document
            .body()
            .map(|body| Rc::new(WebNode::new(body.into())) as NodeHandle)
            .ok_or_else(|| "document has no body".to_string())
    }

    fn active_element(&self) -> Option<NodeHandle> {
        self.document
            .active_element()
            .map(|element| Rc::new(WebNode::new(element)) as NodeHandle)
    }

    fn elements_by_name(&self, name: &str) -> Vec<NodeHandle> {
        let list = self.document.get_elements_by_name(name);
        (0..list.length())
            .filter_map(|index| list.get(index))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(|element| Rc::new(WebNode::new(element)) as NodeHandle)
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.document
            .get_element_by_id(id)
            .map(|element| Rc::new(WebNode::new(element)) as NodeHandle)
    }

    fn any_by_class(&self, class: &str) -> Option<NodeHandle> {
        self.document
            .query_selector(&format!(".{class}"))
            .ok()
            .flatten()
            .map(|element| Rc::new(WebNode::new(element)) as NodeHandle)
    }

    fn intercept_creation(&self, hook: CreationHook) {
        *self.creation_hook.borrow_mut() = Some(hook);
        if let Err(err) = self.install_creation_patch() {
            log::warn!("creation interception unavailable: {err}");
        }
    }

    fn intercept_removal(&self, container: &NodeHandle, hook: RemovalHook) -> Result<(), String> {
        let web = container
            .as_any()
            .downcast_ref::<WebNode>()
            .ok_or_else(|| "intercept_removal: foreign node handle".to_string())?;
        install_removal_patch(web.element(), hook)
    }
}

fn install_removal_patch(element: &web_sys::Element, hook: RemovalHook) -> Result<(), String> {
    let target: &JsValue = element.as_ref();
    if Reflect::has(target, &JsValue::from_str(SAVED_REMOVE_CHILD)).unwrap_or(false) {
        return Ok(());
    }

    let original: Function = Reflect::get(target, &JsValue::from_str("removeChild"))
        .map_err(|err| format!("removeChild lookup failed: {err:?}"))?
        .dyn_into()
        .map_err(|_| "removeChild is not callable".to_string())?;
    Reflect::set(
        target,
        &JsValue::from_str(SAVED_REMOVE_CHILD),
        original.as_ref(),
    )
    .map_err(|err| format!("saving removeChild failed: {err:?}"))?;

    let this = element.clone();
    let patched = Closure::<dyn FnMut(JsValue) -> JsValue>::wrap(Box::new(move |child: JsValue| {
        let removed = match original.call1(this.as_ref(), &child) {
            Ok(removed) => removed,
            Err(err) => {
                log::warn!("native removeChild failed: {err:?}");
                return child;
            }
        };
        let element = match removed.clone().dyn_into::<web_sys::Element>() {
            Ok(element) => element,
            Err(_) => return removed,
        };
        let handle: NodeHandle = Rc::new(WebNode::new(element));
        let substitute = hook(&handle);
        match substitute.as_any().downcast_ref::<WebNode>() {
            Some(web) => web.element().clone().into(),
            None => removed,
        }
    }));
    Reflect::set(
        target,
        &JsValue::from_str("removeChild"),
        patched.as_ref().unchecked_ref(),
    )
    .map_err(|err| format!("patching removeChild failed: {err:?}"))?;
    patched.forget();
    Ok(())
}

/// Builds the browser-backed service bundle for the current page.
///
/// The remote picker and resource provider are supplied by the embedding
/// extension; everything else is wired to the live window and document.
///
/// # Errors
///
/// Returns an error when no window or document is available.
pub fn browser_page_services(
    picker: Rc<dyn RemoteFilePicker>,
    resources: Rc<dyn ResourceProvider>,
) -> Result<PageServices, String> {
    let window = web_sys::window().ok_or_else(|| "window unavailable".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "document unavailable".to_string())?;
    Ok(PageServices {
        document: Rc::new(WebDocument::new(document)),
        scheduler: Rc::new(WebScheduler),
        alerts: Rc::new(WebAlertService),
        picker,
        resources,
    })
}
