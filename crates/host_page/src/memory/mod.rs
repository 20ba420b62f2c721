//! In-memory implementation of the host-page contracts.
//!
//! Stands in for the browser document the same way the `Memory*` stores
//! stand in for browser storage: fully scriptable from tests, with a few
//! extra knobs (focus, visibility, click dispositions) the real platform
//! drives through user input.

mod markup;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::dom::{
    ChangeHook, ClickDisposition, ClickHook, CreationHook, NodeHandle, PageDocument, PageNode,
    RemovalHook,
};
use crate::files::FileBundle;

use markup::{escape_attribute, escape_text, is_void_tag, parse_fragment, ParsedElement};

struct DocumentState {
    next_node_id: Cell<u64>,
    body: RefCell<Option<Rc<MemoryNode>>>,
    active: RefCell<Option<NodeHandle>>,
    creation_hook: RefCell<Option<CreationHook>>,
    removal_hooks: RefCell<HashMap<u64, RemovalHook>>,
    click_dispositions: RefCell<Vec<ClickDisposition>>,
}

/// One element in the memory document.
pub struct MemoryNode {
    id: u64,
    doc: Weak<DocumentState>,
    self_weak: Weak<MemoryNode>,
    tag: String,
    attributes: RefCell<Vec<(String, String)>>,
    style: RefCell<Vec<(String, String)>>,
    text: RefCell<String>,
    children: RefCell<Vec<NodeHandle>>,
    parent: RefCell<Option<Weak<MemoryNode>>>,
    visible: Cell<bool>,
    click_hook: RefCell<Option<ClickHook>>,
    change_hook: RefCell<Option<ChangeHook>>,
    files: RefCell<Option<Rc<dyn FileBundle>>>,
}

/// Downcasts a handle to the memory-node implementation.
pub fn as_memory(handle: &NodeHandle) -> Option<&MemoryNode> {
    handle.as_any().downcast_ref::<MemoryNode>()
}

fn require_memory<'a>(handle: &'a NodeHandle, context: &str) -> Result<&'a MemoryNode, String> {
    as_memory(handle).ok_or_else(|| format!("{context}: foreign node handle"))
}

impl MemoryNode {
    fn new(doc: &Rc<DocumentState>, tag: &str) -> Rc<Self> {
        let id = doc.next_node_id.get();
        doc.next_node_id.set(id + 1);
        let doc = Rc::downgrade(doc);
        Rc::new_cyclic(|self_weak| Self {
            id,
            doc,
            self_weak: self_weak.clone(),
            tag: tag.to_ascii_lowercase(),
            attributes: RefCell::new(Vec::new()),
            style: RefCell::new(Vec::new()),
            text: RefCell::new(String::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(None),
            visible: Cell::new(true),
            click_hook: RefCell::new(None),
            change_hook: RefCell::new(None),
            files: RefCell::new(None),
        })
    }

    /// Layout-visibility knob driven by tests standing in for the host.
    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn style_value(&self, property: &str) -> Option<String> {
        self.style
            .borrow()
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.clone())
    }

    fn shows_in_own_right(&self) -> bool {
        self.visible.get() && self.style_value("display").as_deref() != Some("none")
    }

    fn classes(&self) -> Vec<String> {
        self.attribute_value("class")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attributes
            .borrow()
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.clone())
    }

    fn write_attribute(&self, name: &str, value: String) {
        let mut attributes = self.attributes.borrow_mut();
        if let Some(entry) = attributes.iter_mut().find(|(attr, _)| attr == name) {
            entry.1 = value;
        } else {
            attributes.push((name.to_string(), value));
        }
    }

    fn serialize_outer(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in self.attributes.borrow().iter() {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
        if is_void_tag(&self.tag) {
            out.push_str(" />");
            return out;
        }
        out.push('>');
        out.push_str(&self.serialize_inner());
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
        out
    }

    fn serialize_inner(&self) -> String {
        let mut out = escape_text(&self.text.borrow());
        for child in self.children.borrow().iter() {
            if let Some(mem) = as_memory(child) {
                out.push_str(&mem.serialize_outer());
            }
        }
        out
    }

    fn find_descendant(&self, matches: &dyn Fn(&MemoryNode) -> bool) -> Option<NodeHandle> {
        for child in self.children.borrow().iter() {
            if let Some(mem) = as_memory(child) {
                if matches(mem) {
                    return Some(child.clone());
                }
                if let Some(found) = mem.find_descendant(matches) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn detach_in_place(&self, child_id: u64) -> Option<NodeHandle> {
        let mut children = self.children.borrow_mut();
        let index = children
            .iter()
            .position(|c| as_memory(c).map(|m| m.id == child_id).unwrap_or(false))?;
        let removed = children.remove(index);
        if let Some(mem) = as_memory(&removed) {
            *mem.parent.borrow_mut() = None;
        }
        Some(removed)
    }
}

impl PageNode for MemoryNode {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attribute_value(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.write_attribute(name, value.to_string());
    }

    fn add_class(&self, class: &str) {
        let mut classes = self.classes();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.write_attribute("class", classes.join(" "));
        }
    }

    fn remove_class(&self, class: &str) {
        let classes: Vec<String> = self.classes().into_iter().filter(|c| c != class).collect();
        self.write_attribute("class", classes.join(" "));
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    fn set_style(&self, property: &str, value: &str) {
        let mut style = self.style.borrow_mut();
        if let Some(entry) = style.iter_mut().find(|(name, _)| name == property) {
            entry.1 = value.to_string();
        } else {
            style.push((property.to_string(), value.to_string()));
        }
    }

    fn inner_text(&self) -> String {
        let mut out = self.text.borrow().clone();
        for child in self.children.borrow().iter() {
            out.push_str(&child.inner_text());
        }
        out
    }

    fn set_text(&self, text: &str) {
        self.children.borrow_mut().clear();
        *self.text.borrow_mut() = text.to_string();
    }

    fn inner_html(&self) -> String {
        self.serialize_inner()
    }

    fn set_inner_html(&self, markup: &str) -> Result<(), String> {
        let Some(doc) = self.doc.upgrade() else {
            return Err("document dropped".to_string());
        };
        let parsed = parse_fragment(markup)?;
        self.text.borrow_mut().clear();
        self.children.borrow_mut().clear();
        for element in &parsed {
            let built = build_parsed(&doc, element);
            *built.parent.borrow_mut() = Some(self.self_weak.clone());
            self.children.borrow_mut().push(built as NodeHandle);
        }
        Ok(())
    }

    fn parent(&self) -> Option<NodeHandle> {
        let parent = self.parent.borrow().clone();
        parent
            .and_then(|weak| weak.upgrade())
            .map(|rc| rc as NodeHandle)
    }

    fn children(&self) -> Vec<NodeHandle> {
        self.children.borrow().clone()
    }

    fn first_child(&self) -> Option<NodeHandle> {
        self.children.borrow().first().cloned()
    }

    fn previous_sibling(&self) -> Option<NodeHandle> {
        let parent = self.parent()?;
        let siblings = parent.children();
        let index = siblings
            .iter()
            .position(|s| as_memory(s).map(|m| m.id == self.id).unwrap_or(false))?;
        index.checked_sub(1).and_then(|i| siblings.get(i).cloned())
    }

    fn next_sibling(&self) -> Option<NodeHandle> {
        let parent = self.parent()?;
        let siblings = parent.children();
        let index = siblings
            .iter()
            .position(|s| as_memory(s).map(|m| m.id == self.id).unwrap_or(false))?;
        siblings.get(index + 1).cloned()
    }

    fn append_child(&self, child: &NodeHandle) -> Result<(), String> {
        let mem = require_memory(child, "append_child")?;
        if let Some(old_parent) = mem.parent() {
            if let Some(old) = as_memory(&old_parent) {
                old.detach_in_place(mem.id);
            }
        }
        *mem.parent.borrow_mut() = Some(self.self_weak.clone());
        self.children.borrow_mut().push(child.clone());
        Ok(())
    }

    fn insert_before(&self, new_child: &NodeHandle, reference: &NodeHandle) -> Result<(), String> {
        let new_mem = require_memory(new_child, "insert_before")?;
        let ref_mem = require_memory(reference, "insert_before")?;
        if let Some(old_parent) = new_mem.parent() {
            if let Some(old) = as_memory(&old_parent) {
                old.detach_in_place(new_mem.id);
            }
        }
        let mut children = self.children.borrow_mut();
        let index = children
            .iter()
            .position(|c| as_memory(c).map(|m| m.id == ref_mem.id).unwrap_or(false))
            .ok_or_else(|| "insert_before: reference is not a child".to_string())?;
        children.insert(index, new_child.clone());
        drop(children);
        *new_mem.parent.borrow_mut() = Some(self.self_weak.clone());
        Ok(())
    }

    fn remove_child(&self, child: &NodeHandle) -> Result<NodeHandle, String> {
        let mem = require_memory(child, "remove_child")?;
        let removed = self
            .detach_in_place(mem.id)
            .ok_or_else(|| "remove_child: not a child".to_string())?;
        let hook = self
            .doc
            .upgrade()
            .and_then(|doc| doc.removal_hooks.borrow().get(&self.id).cloned());
        match hook {
            Some(hook) => Ok(hook(&removed)),
            None => Ok(removed),
        }
    }

    fn remove_from_parent(&self) {
        let parent = self.parent();
        if let Some(parent) = parent.as_ref().and_then(as_memory) {
            parent.detach_in_place(self.id);
        }
    }

    fn is_visible(&self) -> bool {
        if !self.shows_in_own_right() {
            return false;
        }
        let mut top_id = self.id;
        let mut current = self.parent();
        while let Some(node) = current {
            let Some(mem) = as_memory(&node) else {
                return false;
            };
            if !mem.shows_in_own_right() {
                return false;
            }
            top_id = mem.id;
            current = mem.parent();
        }
        let body_id = self
            .doc
            .upgrade()
            .and_then(|doc| doc.body.borrow().as_ref().map(|body| body.id));
        body_id == Some(top_id)
    }

    fn same_node(&self, other: &NodeHandle) -> bool {
        as_memory(other).map(|m| m.id == self.id).unwrap_or(false)
    }

    fn set_click_hook(&self, hook: ClickHook) {
        *self.click_hook.borrow_mut() = Some(hook);
    }

    fn click(&self) {
        let hook = self.click_hook.borrow().clone();
        let disposition = match hook {
            Some(hook) => hook(),
            None => ClickDisposition::Default,
        };
        if let Some(doc) = self.doc.upgrade() {
            doc.click_dispositions.borrow_mut().push(disposition);
        }
    }

    fn set_change_hook(&self, hook: ChangeHook) {
        *self.change_hook.borrow_mut() = Some(hook);
    }

    fn fire_change(&self) -> Result<(), String> {
        let hook = self.change_hook.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
        Ok(())
    }

    fn set_files(&self, files: Rc<dyn FileBundle>) {
        *self.files.borrow_mut() = Some(files);
    }

    fn files(&self) -> Option<Rc<dyn FileBundle>> {
        self.files.borrow().clone()
    }

    fn descendant_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.find_descendant(&|node| node.attribute_value("id").as_deref() == Some(id))
    }

    fn descendant_by_class(&self, class: &str) -> Option<NodeHandle> {
        self.find_descendant(&|node| node.has_class(class))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory host document.
#[derive(Clone)]
pub struct MemoryDocument {
    state: Rc<DocumentState>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        let state = Rc::new(DocumentState {
            next_node_id: Cell::new(1),
            body: RefCell::new(None),
            active: RefCell::new(None),
            creation_hook: RefCell::new(None),
            removal_hooks: RefCell::new(HashMap::new()),
            click_dispositions: RefCell::new(Vec::new()),
        });
        let body = MemoryNode::new(&state, "body");
        *state.body.borrow_mut() = Some(body);
        Self { state }
    }
}

impl MemoryDocument {
    /// Marks `node` as the focused element (`None` clears focus).
    pub fn set_active(&self, node: Option<&NodeHandle>) {
        *self.state.active.borrow_mut() = node.cloned();
    }

    /// Click dispositions recorded so far, in order.
    pub fn click_dispositions(&self) -> Vec<ClickDisposition> {
        self.state.click_dispositions.borrow().clone()
    }

    fn body_node(&self) -> Option<Rc<MemoryNode>> {
        self.state.body.borrow().clone()
    }
}

impl PageDocument for MemoryDocument {
    fn create_element(&self, tag: &str) -> NodeHandle {
        let hook = self.state.creation_hook.borrow().clone();
        if let Some(hook) = hook {
            if let Some(node) = hook(tag) {
                return node;
            }
        }
        self.create_element_raw(tag)
    }

    fn create_element_raw(&self, tag: &str) -> NodeHandle {
        MemoryNode::new(&self.state, tag)
    }

    fn create_fragment(&self, markup: &str) -> Result<NodeHandle, String> {
        let parsed = parse_fragment(markup)?;
        let first = parsed
            .into_iter()
            .next()
            .ok_or_else(|| "fragment markup contains no element".to_string())?;
        Ok(build_parsed(&self.state, &first) as NodeHandle)
    }

    fn body(&self) -> Result<NodeHandle, String> {
        self.body_node()
            .map(|body| body as NodeHandle)
            .ok_or_else(|| "document has no body".to_string())
    }

    fn active_element(&self) -> Option<NodeHandle> {
        self.state.active.borrow().clone()
    }

    fn elements_by_name(&self, name: &str) -> Vec<NodeHandle> {
        let Some(body) = self.body_node() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        collect_descendants(&body, &|node| {
            node.attribute_value("name").as_deref() == Some(name)
        }, &mut found);
        found
    }

    fn element_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.body_node()?
            .find_descendant(&|node| node.attribute_value("id").as_deref() == Some(id))
    }

    fn any_by_class(&self, class: &str) -> Option<NodeHandle> {
        self.body_node()?.find_descendant(&|node| node.has_class(class))
    }

    fn intercept_creation(&self, hook: CreationHook) {
        *self.state.creation_hook.borrow_mut() = Some(hook);
    }

    fn intercept_removal(&self, container: &NodeHandle, hook: RemovalHook) -> Result<(), String> {
        let mem = require_memory(container, "intercept_removal")?;
        self.state.removal_hooks.borrow_mut().insert(mem.id, hook);
        Ok(())
    }
}

fn build_parsed(doc: &Rc<DocumentState>, parsed: &ParsedElement) -> Rc<MemoryNode> {
    let node = MemoryNode::new(doc, &parsed.tag);
    for (name, value) in &parsed.attributes {
        node.write_attribute(name, value.clone());
    }
    *node.text.borrow_mut() = parsed.text.clone();
    for child in &parsed.children {
        let built = build_parsed(doc, child);
        *built.parent.borrow_mut() = Some(node.self_weak.clone());
        node.children.borrow_mut().push(built as NodeHandle);
    }
    node
}

fn collect_descendants(
    node: &MemoryNode,
    matches: &dyn Fn(&MemoryNode) -> bool,
    found: &mut Vec<NodeHandle>,
) {
    for child in node.children.borrow().iter() {
        if let Some(mem) = as_memory(child) {
            if matches(mem) {
                found.push(child.clone());
            }
            collect_descendants(mem, matches, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::files::MemoryFileBundle;

    fn doc_with_markup(markup: &str) -> MemoryDocument {
        let doc = MemoryDocument::default();
        let body = doc.body().expect("body");
        body.set_inner_html(markup).expect("markup");
        doc
    }

    #[test]
    fn creation_hook_replaces_native_creation() {
        let doc = MemoryDocument::default();
        let substitute = doc.create_element_raw("div");
        substitute.set_attribute("id", "sub");
        let handed = substitute.clone();
        doc.intercept_creation(Rc::new(move |tag: &str| {
            (tag == "input").then(|| handed.clone())
        }));

        let from_input = doc.create_element("input");
        assert_eq!(from_input.attribute("id").as_deref(), Some("sub"));

        let from_span = doc.create_element("span");
        assert_eq!(from_span.tag_name(), "span");
    }

    #[test]
    fn removal_hook_runs_after_the_real_removal() {
        let doc = doc_with_markup(r#"<div id="container"><input type="file" /></div>"#);
        let container = doc.element_by_id("container").expect("container");
        let child = container.first_child().expect("child");

        let substitute = doc.create_element_raw("div");
        substitute.set_attribute("id", "replacement");
        let handed = substitute.clone();
        doc.intercept_removal(&container, Rc::new(move |removed: &NodeHandle| {
            assert!(removed.parent().is_none());
            handed.clone()
        }))
        .expect("instrument");

        let returned = container.remove_child(&child).expect("remove");
        assert_eq!(returned.attribute("id").as_deref(), Some("replacement"));
        assert!(container.first_child().is_none());
    }

    #[test]
    fn visibility_requires_every_ancestor_visible_and_attachment() {
        let doc = doc_with_markup(r#"<table><tr id="row"><td id="cell"></td></tr></table>"#);
        let row = doc.element_by_id("row").expect("row");
        let cell = doc.element_by_id("cell").expect("cell");
        assert!(cell.is_visible());

        as_memory(&row).expect("memory node").set_visible(false);
        assert!(!cell.is_visible());
        as_memory(&row).expect("memory node").set_visible(true);

        row.set_style("display", "none");
        assert!(!cell.is_visible());
        row.set_style("display", "table-row");
        assert!(cell.is_visible());

        let detached = doc.create_element_raw("div");
        assert!(!detached.is_visible());
    }

    #[test]
    fn inner_html_round_trips_attributes_in_order() {
        let doc = MemoryDocument::default();
        let scratch = doc.create_element_raw("div");
        scratch
            .set_inner_html(r#"<input type="file" id="upload" name="attach" />"#)
            .expect("markup");
        assert_eq!(
            scratch.inner_html(),
            r#"<input type="file" id="upload" name="attach" />"#
        );
    }

    #[test]
    fn insert_before_places_node_among_siblings() {
        let doc = doc_with_markup(r#"<table><tr id="a"></tr><tr id="c"></tr></table>"#);
        let c = doc.element_by_id("c").expect("c");
        let parent = c.parent().expect("parent");
        let b = doc.create_fragment(r#"<tr id="b"></tr>"#).expect("fragment");
        parent.insert_before(&b, &c).expect("insert");

        let ids: Vec<_> = parent
            .children()
            .iter()
            .map(|n| n.attribute("id").unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            b.previous_sibling().and_then(|n| n.attribute("id")).as_deref(),
            Some("a")
        );
    }

    #[test]
    fn files_assignment_is_observable() {
        let doc = MemoryDocument::default();
        let control = doc.create_element_raw("div");
        let bundle = MemoryFileBundle::single("report.pdf", 26_000);
        control.set_files(bundle);

        let read = control.files().expect("files");
        assert_eq!(read.len(), 1);
        let stat = read.stat(0).expect("stat");
        assert_eq!(stat.name, "report.pdf");
        assert_eq!(stat.size_bytes, 26_000);
    }

    #[test]
    fn class_helpers_manage_the_class_attribute() {
        let doc = MemoryDocument::default();
        let node = doc.create_element_raw("img");
        node.add_class("one");
        node.add_class("two");
        node.add_class("one");
        assert_eq!(node.attribute("class").as_deref(), Some("one two"));
        node.remove_class("one");
        assert!(!node.has_class("one"));
        assert!(node.has_class("two"));
    }
}
