//! Capability contracts over the host page's document and element tree.
//!
//! These traits are the API-first boundary between the overlay runtime and
//! whatever actually backs the page: the real browser document (see the
//! `host_page_web` adapters) or the in-memory document in [`crate::memory`].
//! The interception surface ([`PageDocument::intercept_creation`] and
//! [`PageDocument::intercept_removal`]) is deliberately expressed here so the
//! redirection logic can be exercised without touching a platform primitive.

use std::rc::Rc;

use crate::files::FileBundle;

/// Shared, cheaply clonable handle to a host-page element.
pub type NodeHandle = Rc<dyn PageNode>;

/// Hook consulted for every host element-creation request.
///
/// The hook receives the requested tag and returns the node the host should
/// receive, or `None` to let the document create the element natively. A
/// returned node fully replaces the native result.
pub type CreationHook = Rc<dyn Fn(&str) -> Option<NodeHandle>>;

/// Hook consulted after a real child removal on a wrapped container.
///
/// The hook receives the just-removed node and returns the node handed back
/// to the host caller (either the removed node itself or a substitute).
pub type RemovalHook = Rc<dyn Fn(&NodeHandle) -> NodeHandle>;

/// Hook invoked when an element is clicked.
pub type ClickHook = Rc<dyn Fn() -> ClickDisposition>;

/// Hook invoked when an element fires its change notification.
pub type ChangeHook = Rc<dyn Fn()>;

/// Default-action outcome reported by a [`ClickHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDisposition {
    /// Let the platform's default click behavior run.
    Default,
    /// Suppress the platform's default click behavior.
    PreventDefault,
}

/// One host-page element.
///
/// Handles are identity-bearing: two handles may wrap the same underlying
/// element, which is what [`PageNode::same_node`] reports.
pub trait PageNode {
    /// Lowercase tag name.
    fn tag_name(&self) -> String;
    /// Reads an attribute value.
    fn attribute(&self, name: &str) -> Option<String>;
    /// Writes an attribute value.
    fn set_attribute(&self, name: &str, value: &str);
    /// Adds a CSS class (no-op when already present).
    fn add_class(&self, class: &str);
    /// Removes a CSS class (no-op when absent).
    fn remove_class(&self, class: &str);
    /// Returns whether the class list contains `class`.
    fn has_class(&self, class: &str) -> bool;
    /// Sets one inline style property.
    fn set_style(&self, property: &str, value: &str);
    /// Visible text of this element and its descendants.
    fn inner_text(&self) -> String;
    /// Replaces the element's text content.
    fn set_text(&self, text: &str);
    /// Serialized markup of the element's children.
    fn inner_html(&self) -> String;
    /// Replaces the element's children by parsing `markup`.
    ///
    /// # Errors
    ///
    /// Returns an error when the markup cannot be parsed.
    fn set_inner_html(&self, markup: &str) -> Result<(), String>;
    /// Parent element, when attached.
    fn parent(&self) -> Option<NodeHandle>;
    /// Child elements in document order.
    fn children(&self) -> Vec<NodeHandle>;
    /// First child element.
    fn first_child(&self) -> Option<NodeHandle>;
    /// Previous sibling element.
    fn previous_sibling(&self) -> Option<NodeHandle>;
    /// Next sibling element.
    fn next_sibling(&self) -> Option<NodeHandle>;
    /// Appends `child` as the last child of this element.
    ///
    /// # Errors
    ///
    /// Returns an error when the host rejects the mutation.
    fn append_child(&self, child: &NodeHandle) -> Result<(), String>;
    /// Inserts `new_child` immediately before `reference`.
    ///
    /// # Errors
    ///
    /// Returns an error when `reference` is not a child of this element.
    fn insert_before(&self, new_child: &NodeHandle, reference: &NodeHandle) -> Result<(), String>;
    /// Removes `child` and returns the node handed back to the caller.
    ///
    /// When a removal hook is registered for this container the real removal
    /// runs first and the hook's node is returned; otherwise the removed
    /// child itself is returned.
    ///
    /// # Errors
    ///
    /// Returns an error when `child` is not a child of this element.
    fn remove_child(&self, child: &NodeHandle) -> Result<NodeHandle, String>;
    /// Detaches this element from its parent (no-op when already detached).
    fn remove_from_parent(&self);
    /// Whether the element currently occupies layout.
    fn is_visible(&self) -> bool;
    /// Whether `other` wraps the same underlying element.
    fn same_node(&self, other: &NodeHandle) -> bool;
    /// Installs the click hook, replacing any previous one.
    fn set_click_hook(&self, hook: ClickHook);
    /// Simulates a user click on the element.
    fn click(&self);
    /// Installs the change hook, replacing any previous one.
    fn set_change_hook(&self, hook: ChangeHook);
    /// Fires the element's change notification the way the platform would.
    ///
    /// # Errors
    ///
    /// Returns an error when the notification cannot be dispatched.
    fn fire_change(&self) -> Result<(), String>;
    /// Assigns a file list to the element.
    fn set_files(&self, files: Rc<dyn FileBundle>);
    /// Reads the element's assigned file list.
    fn files(&self) -> Option<Rc<dyn FileBundle>>;
    /// First descendant with the given id.
    fn descendant_by_id(&self, id: &str) -> Option<NodeHandle>;
    /// First descendant carrying the given class.
    fn descendant_by_class(&self, class: &str) -> Option<NodeHandle>;
    /// Type-erased self, used by adapters for identity comparison.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// The host page's document.
pub trait PageDocument {
    /// Creates an element, routing the request through the creation hook
    /// first. This is the surface the host's own code reaches.
    fn create_element(&self, tag: &str) -> NodeHandle;
    /// Creates an element natively, never consulting interception hooks.
    fn create_element_raw(&self, tag: &str) -> NodeHandle;
    /// Parses `markup` and returns its first element.
    ///
    /// # Errors
    ///
    /// Returns an error when the markup contains no parsable element.
    fn create_fragment(&self, markup: &str) -> Result<NodeHandle, String>;
    /// The document body.
    ///
    /// # Errors
    ///
    /// Returns an error when the document has no body.
    fn body(&self) -> Result<NodeHandle, String>;
    /// The currently focused element, when any.
    fn active_element(&self) -> Option<NodeHandle>;
    /// All attached elements whose `name` attribute equals `name`.
    fn elements_by_name(&self, name: &str) -> Vec<NodeHandle>;
    /// First attached element with the given id.
    fn element_by_id(&self, id: &str) -> Option<NodeHandle>;
    /// First attached element carrying the given class.
    fn any_by_class(&self, class: &str) -> Option<NodeHandle>;
    /// Installs the document-wide creation hook, replacing any previous one.
    fn intercept_creation(&self, hook: CreationHook);
    /// Routes child removals on `container` through `hook` after the native
    /// removal runs.
    ///
    /// # Errors
    ///
    /// Returns an error when the container cannot be instrumented.
    fn intercept_removal(&self, container: &NodeHandle, hook: RemovalHook) -> Result<(), String>;
}
