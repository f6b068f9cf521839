//! In-memory document
//!
//! Arena-backed tree used for offline filtering (CLI, tests). Nodes are never
//! freed: detaching a subtree only unlinks it from its parent, so stale
//! [`NodeId`]s stay valid.

use std::fmt::Write as _;

use crate::dom::Dom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

impl Document {
    /// Empty `<html><head></head><body></body></html>` skeleton.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = doc.create_element("html", &[]);
        doc.root = root;
        let head = doc.create_element("head", &[]);
        let body = doc.create_element("body", &[]);
        doc.append_child(root, head);
        doc.append_child(root, body);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Unlink a subtree from its parent.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn find_child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.nodes[parent.0].children.iter().copied().find(|c| {
            matches!(&self.nodes[c.0].kind, NodeKind::Element { tag: t, .. } if t == tag)
        })
    }

    /// Serialise the document back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        self.write_node(self.root, &mut out);
        out
    }

    /// Serialise one subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &self.nodes[node.0].children {
                    self.write_node(*child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }

    fn attrs_mut(&mut self, node: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            NodeKind::Text(_) => None,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

impl Dom for Document {
    type Node = NodeId;

    fn document_element(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn body(&self) -> Option<NodeId> {
        self.find_child_element(self.root, "body")
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn text_value(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == "class")
                .is_some_and(|(_, v)| v.split_ascii_whitespace().any(|c| c == class)),
            NodeKind::Text(_) => false,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(attrs) = self.attrs_mut(*node) {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if let Some(attrs) = self.attrs_mut(*node) {
            attrs.retain(|(k, _)| k != name);
        }
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        if self.has_class(node, class) || self.tag_name(node).is_none() {
            return;
        }
        let updated = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &updated);
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        let existing = match self.attribute(node, "class") {
            Some(existing) => existing,
            None => return,
        };
        let kept: Vec<&str> = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        if kept.is_empty() {
            self.remove_attribute(node, "class");
        } else {
            self.set_attribute(node, "class", &kept.join(" "));
        }
    }
}

// =============================================================================
// HTML Parsing
// =============================================================================

#[cfg(feature = "html")]
mod html {
    use scraper::{ElementRef, Html};

    use super::{Document, NodeId};
    use crate::dom::Dom;

    impl Document {
        /// Parse a full HTML document.
        pub fn parse_html(html: &str) -> Self {
            let parsed = Html::parse_document(html);
            let mut doc = Self {
                nodes: Vec::new(),
                root: NodeId(0),
            };
            doc.root = doc.import_element(parsed.root_element());
            doc
        }

        /// Parse `html` as a fragment and append its nodes to `parent`.
        /// Returns the appended top-level nodes.
        pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
            let parsed = Html::parse_fragment(html);
            let mut added = Vec::new();
            for child in parsed.root_element().children() {
                let imported = if let Some(element) = ElementRef::wrap(child) {
                    Some(self.import_element(element))
                } else {
                    child.value().as_text().map(|text| self.create_text(text))
                };
                if let Some(node) = imported {
                    self.append_child(parent, node);
                    added.push(node);
                }
            }
            added
        }

        fn import_element(&mut self, element: ElementRef<'_>) -> NodeId {
            let value = element.value();
            let attrs: Vec<(&str, &str)> = value.attrs().collect();
            let node = self.create_element(value.name(), &attrs);
            for child in element.children() {
                if let Some(child_element) = ElementRef::wrap(child) {
                    let imported = self.import_element(child_element);
                    self.append_child(node, imported);
                } else if let Some(text) = child.value().as_text() {
                    let imported = self.create_text(text);
                    self.append_child(node, imported);
                }
            }
            node
        }

        /// First attached element carrying `class`.
        pub fn find_by_class(&self, class: &str) -> Option<NodeId> {
            (0..self.nodes.len())
                .map(NodeId)
                .find(|id| self.is_attached(*id) && self.has_class(id, class))
        }

        /// First attached element with the given `id` attribute.
        pub fn find_by_id(&self, id_value: &str) -> Option<NodeId> {
            (0..self.nodes.len())
                .map(NodeId)
                .find(|id| self.is_attached(*id) && self.attribute(id, "id").as_deref() == Some(id_value))
        }
    }
}
