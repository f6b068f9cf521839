//! Labeled-tree classifier
//!
//! Classifies text nodes by the nearest ancestor matching one of an ordered
//! set of predicates. Used by the generic card extractor when a site's class
//! names are too volatile to target directly.

use std::sync::LazyLock;

use crate::dom::{Dom, DomExt};
use crate::selector::{Selector, SelectorList};
use crate::style::HIDDEN_CLASS;
use crate::types::Field;
use crate::selectors;

pub struct TreeClassifier<L: Copy> {
    rules: Vec<(SelectorList, L)>,
    fallback: L,
}

impl<L: Copy> TreeClassifier<L> {
    pub fn new(rules: Vec<(SelectorList, L)>, fallback: L) -> Self {
        Self { rules, fallback }
    }

    /// Label for `node` (a text node or an element). Rules are tried in order,
    /// each against the nearest ancestor-or-self element.
    pub fn classify<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> L {
        let element = if dom.is_element(node) {
            Some(node.clone())
        } else {
            dom.parent_element(node)
        };
        let element = match element {
            Some(element) => element,
            None => return self.fallback,
        };

        for (selectors, label) in &self.rules {
            if dom.closest(&element, selectors).is_some() {
                return *label;
            }
        }
        self.fallback
    }

    /// Non-blank text fragments under `root` with their labels, document
    /// order. Text in scripts, styles, or hidden elements strictly below
    /// `root` is skipped.
    pub fn fragments<D: Dom + ?Sized>(&self, dom: &D, root: &D::Node) -> Vec<(L, String)> {
        let mut out = Vec::new();
        for text_node in dom.text_nodes(root) {
            let text = match dom.text_value(&text_node) {
                Some(text) => text,
                None => continue,
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            if is_skipped(dom, &text_node, root) {
                continue;
            }
            out.push((self.classify(dom, &text_node), trimmed.to_string()));
        }
        out
    }
}

fn is_skipped<D: Dom + ?Sized>(dom: &D, text_node: &D::Node, root: &D::Node) -> bool {
    let parent = match dom.parent_element(text_node) {
        Some(parent) => parent,
        None => return true,
    };
    if matches!(
        dom.tag_name(&parent).as_deref(),
        Some("script" | "style" | "noscript")
    ) {
        return true;
    }

    let mut current = Some(parent);
    while let Some(element) = current {
        if &element == root {
            break;
        }
        if dom.has_class(&element, HIDDEN_CLASS) {
            return true;
        }
        current = dom.parent_element(&element);
    }
    false
}

/// Heading-like text is a title, citations and timestamps are the site,
/// everything else is description.
pub static FIELD_CLASSIFIER: LazyLock<TreeClassifier<Field>> = LazyLock::new(|| {
    TreeClassifier::new(
        vec![
            (
                selectors![
                    Selector::tag("h3"),
                    Selector::tag("h4"),
                    Selector::tag("h2"),
                    Selector::any().with_attr_eq("role", "heading"),
                    Selector::attr("aria-level"),
                ],
                Field::Title,
            ),
            (selectors![Selector::tag("cite"), Selector::tag("time")], Field::Site),
        ],
        Field::Description,
    )
});
