//! In-memory element tree.
//!
//! Stands in for the browser DOM: the server-rendered page is built into a
//! `Document`, and every handler in the crate reads and writes it through
//! the typed operations below instead of global selectors. Nodes live in an
//! arena and are addressed by `NodeId`; removing a node detaches it (and its
//! subtree) from the page without invalidating ids that callers still hold.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::format::escape_html;

/// Tags serialised without a closing tag.
const VOID_TAGS: &[&str] = &["img", "input", "br", "hr", "meta", "link"];

/// The element tree shared between handlers, the loader and notification timers.
pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Element not found: {0}")]
    MissingElement(String),
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),
    #[error("Element document lock poisoned")]
    LockPoisoned,
}

/// Lock the shared document, mapping poisoning to `DomError`.
pub fn lock(doc: &SharedDocument) -> Result<MutexGuard<'_, Document>, DomError> {
    doc.lock().map_err(|_| DomError::LockPoisoned)
}

/// Wrap a document for sharing across tasks.
pub fn shared(doc: Document) -> SharedDocument {
    Arc::new(Mutex::new(doc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    /// Text rendered before the element's children.
    pub text: String,
    /// Current value of a form control.
    pub value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena-backed element tree with a single `body` root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("body")],
            body: NodeId(0),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // ── Construction ────────────────────────────────────────

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Create an element with id and classes and append it under `parent`.
    pub fn append_new(
        &mut self,
        parent: NodeId,
        tag: &str,
        id: Option<&str>,
        classes: &[&str],
    ) -> Result<NodeId, DomError> {
        let node = self.create_element(tag);
        {
            let el = self.get_mut(node)?;
            el.id = id.map(str::to_string);
            el.classes = classes.iter().map(|c| c.to_string()).collect();
        }
        self.append_child(parent, node)?;
        Ok(node)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.get(parent)?;
        self.detach(child)?;
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Detach `node` from its parent. The subtree stays addressable but is
    /// no longer part of the page.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.detach(node)
    }

    pub fn clear_children(&mut self, node: NodeId) -> Result<(), DomError> {
        let children = std::mem::take(&mut self.get_mut(node)?.children);
        for child in children {
            self.get_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.get_mut(node)?.parent.take() {
            self.get_mut(parent)?.children.retain(|c| *c != node);
        }
        Ok(())
    }

    // ── Access ──────────────────────────────────────────────

    pub fn get(&self, node: NodeId) -> Result<&Element, DomError> {
        self.nodes.get(node.0).ok_or(DomError::UnknownNode(node))
    }

    pub fn get_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        self.nodes.get_mut(node.0).ok_or(DomError::UnknownNode(node))
    }

    /// Whether `node` is reachable from `body`.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.body {
                return true;
            }
            current = self.nodes.get(n.0).and_then(|el| el.parent);
        }
        false
    }

    /// Attached nodes in document order.
    fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.body];
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(el) = self.nodes.get(node.0) {
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|n| self.nodes[n.0].id.as_deref() == Some(id))
    }

    /// Like [`get_element_by_id`](Self::get_element_by_id) but missing is an error.
    pub fn require_id(&self, id: &str) -> Result<NodeId, DomError> {
        self.get_element_by_id(id)
            .ok_or_else(|| DomError::MissingElement(format!("#{id}")))
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|n| self.nodes[n.0].has_class(class))
            .collect()
    }

    pub fn first_by_class(&self, class: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|n| self.nodes[n.0].has_class(class))
    }

    pub fn require_class(&self, class: &str) -> Result<NodeId, DomError> {
        self.first_by_class(class)
            .ok_or_else(|| DomError::MissingElement(format!(".{class}")))
    }

    /// Attached elements carrying attribute `name` equal to `value`.
    pub fn elements_with_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|n| self.nodes[n.0].attr(name) == Some(value))
            .collect()
    }

    /// Nearest ancestor-or-self matching `predicate`.
    pub fn closest<P>(&self, node: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Element) -> bool,
    {
        let mut current = Some(node);
        while let Some(n) = current {
            let el = self.nodes.get(n.0)?;
            if predicate(el) {
                return Some(n);
            }
            current = el.parent;
        }
        None
    }

    pub fn closest_with_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.closest(node, |el| el.has_class(class))
    }

    pub fn closest_with_id(&self, node: NodeId, id: &str) -> Option<NodeId> {
        self.closest(node, |el| el.id.as_deref() == Some(id))
    }

    // ── Mutation ────────────────────────────────────────────

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let el = self.get_mut(node)?;
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.get_mut(node)?.classes.retain(|c| c != class);
        Ok(())
    }

    /// Flip `class` on `node`; returns whether the class is now present.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> Result<bool, DomError> {
        if self.get(node)?.has_class(class) {
            self.remove_class(node, class)?;
            Ok(false)
        } else {
            self.add_class(node, class)?;
            Ok(true)
        }
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.get_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        self.get_mut(node)?
            .styles
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    /// Replace the element's text and drop its children.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.clear_children(node)?;
        self.get_mut(node)?.text = text.to_string();
        Ok(())
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.get_mut(node)?.value = Some(value.to_string());
        Ok(())
    }

    // ── Serialisation ───────────────────────────────────────

    /// Serialise `node` and its subtree as HTML.
    pub fn outer_html(&self, node: NodeId) -> Result<String, DomError> {
        let mut out = String::new();
        self.write_html(node, &mut out)?;
        Ok(out)
    }

    fn write_html(&self, node: NodeId, out: &mut String) -> Result<(), DomError> {
        let el = self.get(node)?;
        out.push('<');
        out.push_str(&el.tag);
        if let Some(id) = &el.id {
            let _ = write!(out, " id=\"{}\"", escape_html(id));
        }
        if !el.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_html(&el.classes.join(" ")));
        }
        for (name, value) in &el.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
        }
        if !el.styles.is_empty() {
            let style = el
                .styles
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; ");
            let _ = write!(out, " style=\"{}\"", escape_html(&style));
        }
        if let Some(value) = &el.value {
            let _ = write!(out, " value=\"{}\"", escape_html(value));
        }
        out.push('>');
        if VOID_TAGS.contains(&el.tag.as_str()) {
            return Ok(());
        }
        out.push_str(&escape_html(&el.text));
        for child in &el.children {
            self.write_html(*child, out)?;
        }
        let _ = write!(out, "</{}>", el.tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let nav = doc.append_new(body, "nav", Some("sidebar"), &["sidebar"]).unwrap();
        let item = doc.append_new(nav, "a", None, &["nav-item", "active"]).unwrap();
        let main = doc.append_new(body, "main", None, &["main-content"]).unwrap();
        (doc, nav, item, main)
    }

    #[test]
    fn lookup_by_id_and_class() {
        let (doc, nav, item, main) = sample();
        assert_eq!(doc.get_element_by_id("sidebar"), Some(nav));
        assert_eq!(doc.first_by_class("main-content"), Some(main));
        assert_eq!(doc.elements_by_class("nav-item"), vec![item]);
        assert!(doc.get_element_by_id("missing").is_none());
    }

    #[test]
    fn require_id_reports_selector() {
        let (doc, ..) = sample();
        let err = doc.require_id("patient-name").unwrap_err();
        assert_eq!(err.to_string(), "Element not found: #patient-name");
    }

    #[test]
    fn toggle_class_twice_restores_state() {
        let (mut doc, nav, ..) = sample();
        assert!(doc.toggle_class(nav, "collapsed").unwrap());
        assert!(!doc.toggle_class(nav, "collapsed").unwrap());
        assert_eq!(doc.get(nav).unwrap().classes(), &["sidebar".to_string()]);
    }

    #[test]
    fn add_class_is_idempotent() {
        let (mut doc, _, item, _) = sample();
        doc.add_class(item, "active").unwrap();
        assert_eq!(doc.get(item).unwrap().classes().len(), 2);
    }

    #[test]
    fn closest_walks_ancestors() {
        let (doc, nav, item, main) = sample();
        assert_eq!(doc.closest_with_class(item, "sidebar"), Some(nav));
        assert_eq!(doc.closest_with_class(item, "nav-item"), Some(item));
        assert_eq!(doc.closest_with_class(main, "sidebar"), None);
    }

    #[test]
    fn removed_subtree_is_not_found() {
        let (mut doc, nav, item, _) = sample();
        doc.remove(nav).unwrap();
        assert!(!doc.is_connected(item));
        assert!(doc.get_element_by_id("sidebar").is_none());
        assert!(doc.elements_by_class("nav-item").is_empty());
        // Ids stay valid after removal
        assert_eq!(doc.get(item).unwrap().tag, "a");
    }

    #[test]
    fn document_order_is_depth_first() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.append_new(body, "div", None, &["x"]).unwrap();
        let a1 = doc.append_new(a, "div", None, &["x"]).unwrap();
        let b = doc.append_new(body, "div", None, &["x"]).unwrap();
        assert_eq!(doc.elements_by_class("x"), vec![a, a1, b]);
    }

    #[test]
    fn set_text_replaces_children() {
        let (mut doc, nav, item, _) = sample();
        doc.set_text(nav, "Menu").unwrap();
        assert!(doc.get(nav).unwrap().children().is_empty());
        assert!(!doc.is_connected(item));
    }

    #[test]
    fn outer_html_escapes_and_orders() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_new(body, "p", Some("note"), &["no-data"]).unwrap();
        doc.set_text(p, "<b>&").unwrap();
        let img = doc.append_new(body, "img", None, &[]).unwrap();
        doc.set_attr(img, "src", "/media/a\".png").unwrap();
        assert_eq!(
            doc.outer_html(p).unwrap(),
            "<p id=\"note\" class=\"no-data\">&lt;b&gt;&amp;</p>"
        );
        assert_eq!(
            doc.outer_html(img).unwrap(),
            "<img src=\"/media/a&quot;.png\">"
        );
    }

    #[test]
    fn styles_serialise_inline() {
        let (mut doc, nav, ..) = sample();
        doc.set_style(nav, "width", "67%").unwrap();
        let html = doc.outer_html(nav).unwrap();
        assert!(html.contains("style=\"width: 67%\""));
    }

    #[test]
    fn unknown_node_is_error() {
        let doc = Document::new();
        assert!(matches!(doc.get(NodeId(42)), Err(DomError::UnknownNode(_))));
    }
}
