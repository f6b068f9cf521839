//! Document abstraction
//!
//! The engine never owns the page. It reads and annotates it through the
//! narrow [`Dom`] trait, implemented by the in-memory [`crate::Document`] and by
//! the browser bindings.

use std::fmt;

use crate::selector::SelectorList;

/// Minimal read/write surface over a document tree.
///
/// Node handles are cheap to clone and carry no ownership of the tree.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    /// The `<html>` element.
    fn document_element(&self) -> Option<Self::Node>;

    /// The `<body>` element.
    fn body(&self) -> Option<Self::Node>;

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Element and text children in document order.
    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name, None for anything but elements.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    /// Value of a text node, None for anything else.
    fn text_value(&self, node: &Self::Node) -> Option<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    fn add_class(&mut self, node: &Self::Node, class: &str);

    fn remove_class(&mut self, node: &Self::Node, class: &str);
}

/// Derived queries available on every [`Dom`].
pub trait DomExt: Dom {
    fn is_element(&self, node: &Self::Node) -> bool {
        self.tag_name(node).is_some()
    }

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn child_elements(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.child_nodes(node)
            .into_iter()
            .filter(|child| self.is_element(child))
            .collect()
    }

    /// All descendants in preorder, `node` excluded.
    fn descendants(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.child_nodes(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            let children = self.child_nodes(&current);
            out.push(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    fn descendant_elements(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.descendants(node)
            .into_iter()
            .filter(|n| self.is_element(n))
            .collect()
    }

    fn text_nodes(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.descendants(node)
            .into_iter()
            .filter(|n| self.text_value(n).is_some())
            .collect()
    }

    /// Concatenated text of every descendant text node.
    fn text_content(&self, node: &Self::Node) -> String {
        if let Some(text) = self.text_value(node) {
            return text;
        }
        let mut out = String::new();
        for text_node in self.text_nodes(node) {
            if let Some(text) = self.text_value(&text_node) {
                out.push_str(&text);
            }
        }
        out
    }

    /// Ancestor elements from nearest to farthest, `node` excluded.
    fn ancestors(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut current = self.parent_element(node);
        while let Some(parent) = current {
            current = self.parent_element(&parent);
            out.push(parent);
        }
        out
    }

    /// Nearest ancestor-or-self element matching `selectors`.
    fn closest(&self, node: &Self::Node, selectors: &SelectorList) -> Option<Self::Node> {
        if self.is_element(node) && selectors.matches(self, node) {
            return Some(node.clone());
        }
        self.ancestors(node)
            .into_iter()
            .find(|ancestor| selectors.matches(self, ancestor))
    }

    /// Whether a strict ancestor matches `selectors`.
    fn has_ancestor_matching(&self, node: &Self::Node, selectors: &SelectorList) -> bool {
        self.ancestors(node)
            .iter()
            .any(|ancestor| selectors.matches(self, ancestor))
    }

    /// Descendant elements of `root` matching `selectors`, document order.
    fn query_all(&self, root: &Self::Node, selectors: &SelectorList) -> Vec<Self::Node> {
        self.descendant_elements(root)
            .into_iter()
            .filter(|n| selectors.matches(self, n))
            .collect()
    }

    fn query_first(&self, root: &Self::Node, selectors: &SelectorList) -> Option<Self::Node> {
        let mut stack: Vec<Self::Node> = self.child_nodes(root).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            if self.is_element(&current) && selectors.matches(self, &current) {
                return Some(current);
            }
            stack.extend(self.child_nodes(&current).into_iter().rev());
        }
        None
    }
}

impl<D: Dom + ?Sized> DomExt for D {}
