//! Structural selectors
//!
//! Typed stand-ins for the CSS selectors search engines are targeted with.
//! Every selector renders back to CSS so the same predicate can be injected
//! into the page stylesheet.

use std::fmt;

use crate::dom::{Dom, DomExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    Exists(&'static str),
    Equals(&'static str, &'static str),
    Prefix(&'static str, &'static str),
}

impl AttrMatch {
    fn matches<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        match self {
            AttrMatch::Exists(name) => dom.attribute(node, name).is_some(),
            AttrMatch::Equals(name, value) => dom.attribute(node, name).as_deref() == Some(*value),
            AttrMatch::Prefix(name, prefix) => dom
                .attribute(node, name)
                .is_some_and(|v| v.starts_with(prefix)),
        }
    }
}

/// One compound selector with an optional combinator to its left.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<&'static str>,
    classes: Vec<&'static str>,
    attrs: Vec<AttrMatch>,
    not: Vec<Selector>,
    has: Vec<Selector>,
    empty: bool,
    parent: Option<Box<Selector>>,
    ancestor: Option<Box<Selector>>,
}

impl Selector {
    /// Universal selector.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: &'static str) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }

    /// Shorthand for `.class`.
    pub fn class(class: &'static str) -> Self {
        Self::any().with_class(class)
    }

    /// Shorthand for `[name]`.
    pub fn attr(name: &'static str) -> Self {
        Self::any().with_attr(name)
    }

    pub fn with_class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_attr(mut self, name: &'static str) -> Self {
        self.attrs.push(AttrMatch::Exists(name));
        self
    }

    pub fn with_attr_eq(mut self, name: &'static str, value: &'static str) -> Self {
        self.attrs.push(AttrMatch::Equals(name, value));
        self
    }

    pub fn with_attr_prefix(mut self, name: &'static str, prefix: &'static str) -> Self {
        self.attrs.push(AttrMatch::Prefix(name, prefix));
        self
    }

    /// `:not(sel)`
    pub fn not(mut self, sel: Selector) -> Self {
        self.not.push(sel);
        self
    }

    /// `:has(sel)`, descendant form.
    pub fn has(mut self, sel: Selector) -> Self {
        self.has.push(sel);
        self
    }

    /// `:empty` restricted to element children.
    pub fn empty(mut self) -> Self {
        self.empty = true;
        self
    }

    /// `parent > self`
    pub fn child_of(mut self, parent: Selector) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// `ancestor self`
    pub fn within(mut self, ancestor: Selector) -> Self {
        self.ancestor = Some(Box::new(ancestor));
        self
    }

    pub fn matches<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        if !self.matches_compound(dom, node) {
            return false;
        }
        if let Some(parent_sel) = &self.parent {
            match dom.parent_element(node) {
                Some(parent) if parent_sel.matches(dom, &parent) => {}
                _ => return false,
            }
        }
        if let Some(ancestor_sel) = &self.ancestor {
            if !dom.ancestors(node).iter().any(|a| ancestor_sel.matches(dom, a)) {
                return false;
            }
        }
        true
    }

    fn matches_compound<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        let tag = match dom.tag_name(node) {
            Some(tag) => tag,
            None => return false,
        };
        if let Some(expected) = self.tag {
            if tag != expected {
                return false;
            }
        }
        if !self.classes.iter().all(|class| dom.has_class(node, class)) {
            return false;
        }
        if !self.attrs.iter().all(|attr| attr.matches(dom, node)) {
            return false;
        }
        if self.not.iter().any(|sel| sel.matches(dom, node)) {
            return false;
        }
        if self.empty && !dom.child_elements(node).is_empty() {
            return false;
        }
        self.has.iter().all(|sel| {
            dom.descendant_elements(node)
                .iter()
                .any(|d| sel.matches_compound(dom, d))
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ancestor) = &self.ancestor {
            write!(f, "{} ", ancestor)?;
        }
        if let Some(parent) = &self.parent {
            write!(f, "{} > ", parent)?;
        }
        let bare = self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty();
        match self.tag {
            Some(tag) => f.write_str(tag)?,
            None if bare => f.write_str("*")?,
            None => {}
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        for attr in &self.attrs {
            match attr {
                AttrMatch::Exists(name) => write!(f, "[{}]", name)?,
                AttrMatch::Equals(name, value) => write!(f, "[{}=\"{}\"]", name, value)?,
                AttrMatch::Prefix(name, prefix) => write!(f, "[{}^=\"{}\"]", name, prefix)?,
            }
        }
        for sel in &self.not {
            write!(f, ":not({})", sel)?;
        }
        for sel in &self.has {
            write!(f, ":has({})", sel)?;
        }
        if self.empty {
            f.write_str(":empty")?;
        }
        Ok(())
    }
}

// =============================================================================
// Selector List
// =============================================================================

/// Comma-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorList(Vec<Selector>);

impl SelectorList {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self(selectors)
    }

    pub fn matches<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        self.0.iter().any(|sel| sel.matches(dom, node))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenate two lists.
    pub fn union(&self, other: &SelectorList) -> SelectorList {
        let mut all = self.0.clone();
        all.extend(other.0.iter().cloned());
        SelectorList(all)
    }
}

impl From<Selector> for SelectorList {
    fn from(sel: Selector) -> Self {
        Self(vec![sel])
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sel) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", sel)?;
        }
        Ok(())
    }
}

/// Build a [`SelectorList`] from selector expressions.
#[macro_export]
macro_rules! selectors {
    ($($sel:expr),+ $(,)?) => {
        $crate::selector::SelectorList::new(vec![$($sel),+])
    };
}
