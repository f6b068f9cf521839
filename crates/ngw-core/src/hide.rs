//! Hide/reveal engine
//!
//! The only writer of hidden-state markers. A card's state lives on the
//! element itself (see [`crate::style`]), so the engine holds no per-card
//! bookkeeping and survives the page re-rendering around it.

use std::sync::LazyLock;

use crate::dom::{Dom, DomExt};
use crate::selector::{Selector, SelectorList};
use crate::selectors;
use crate::style::{
    CHECKED_ATTR, COLLAPSED_ATTR, EMPTY_CLASS, FIELD_ATTR, HIDDEN_CLASS, LABEL_ATTR, TIP_X_ATTR, TIP_Y_ATTR, WORD_ATTR,
    WORD_SEPARATOR,
};
use crate::types::{CardState, Field, HideOutcome};

/// Page chrome that is never hidden, whatever a rule matches.
static CHROME: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("header"),
        Selector::tag("nav"),
        Selector::any().with_attr_eq("id", "gb"),
        Selector::any().with_attr_eq("id", "searchform"),
        Selector::class("appbar"),
    ]
});

/// Result grids that must stay in place even when every item inside is hidden.
const PROTECTED_CLASS: &str = "YjPgVd";

static HIDDEN: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::class(HIDDEN_CLASS)]);
static SWEPT: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::class(EMPTY_CLASS)]);

/// What a hidden card records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub words: Vec<String>,
    pub field: Option<Field>,
    pub collapsed_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HideEngine {
    label: String,
}

impl HideEngine {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether `node` is page chrome or inside it.
    pub fn is_chrome<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        dom.has_class(node, PROTECTED_CLASS) || dom.closest(node, &CHROME).is_some()
    }

    /// Record a match of `raw_line` on `target`.
    pub fn hide<D: Dom + ?Sized>(&self, dom: &mut D, target: &D::Node, raw_line: &str, field: Field) -> HideOutcome {
        self.mark(dom, target, raw_line, Some(field))
    }

    /// Hide a carousel container whose sub-cards are all hidden.
    pub fn collapse<D: Dom + ?Sized>(&self, dom: &mut D, container: &D::Node, raw_line: &str) -> HideOutcome {
        let outcome = self.mark(dom, container, raw_line, None);
        if outcome == HideOutcome::Hidden {
            dom.set_attribute(container, COLLAPSED_ATTR, raw_line);
        }
        outcome
    }

    fn mark<D: Dom + ?Sized>(
        &self,
        dom: &mut D,
        target: &D::Node,
        raw_line: &str,
        field: Option<Field>,
    ) -> HideOutcome {
        if self.is_chrome(dom, target) {
            return HideOutcome::Refused;
        }

        if !dom.has_class(target, HIDDEN_CLASS) {
            dom.add_class(target, HIDDEN_CLASS);
            dom.set_attribute(target, WORD_ATTR, raw_line);
            if let Some(field) = field {
                dom.set_attribute(target, FIELD_ATTR, field.as_str());
            }
            dom.set_attribute(target, LABEL_ATTR, &self.label);
            dom.remove_attribute(target, CHECKED_ATTR);
            return HideOutcome::Hidden;
        }

        let mut words = self.words(dom, target);
        if words.iter().any(|w| w == raw_line) {
            return HideOutcome::Unchanged;
        }
        words.push(raw_line.to_string());
        dom.set_attribute(target, WORD_ATTR, &join_words(&words));
        HideOutcome::Merged
    }

    /// Drop one matched word. Returns true when the card recorded it; a card
    /// left with no words becomes fully visible again.
    pub fn remove_word<D: Dom + ?Sized>(&self, dom: &mut D, node: &D::Node, raw_line: &str) -> bool {
        let words = self.words(dom, node);
        if !words.iter().any(|w| w == raw_line) {
            return false;
        }
        let remaining: Vec<String> = words.into_iter().filter(|w| w != raw_line).collect();
        if remaining.is_empty() {
            self.unhide(dom, node);
        } else {
            dom.set_attribute(node, WORD_ATTR, &join_words(&remaining));
            if dom.attribute(node, COLLAPSED_ATTR).as_deref() == Some(raw_line) {
                dom.remove_attribute(node, COLLAPSED_ATTR);
            }
        }
        true
    }

    /// Clear every hidden-state marker from `node`.
    pub fn unhide<D: Dom + ?Sized>(&self, dom: &mut D, node: &D::Node) {
        dom.remove_class(node, HIDDEN_CLASS);
        for attr in [WORD_ATTR, FIELD_ATTR, LABEL_ATTR, COLLAPSED_ATTR, TIP_X_ATTR, TIP_Y_ATTR] {
            dom.remove_attribute(node, attr);
        }
    }

    pub fn mark_checked<D: Dom + ?Sized>(&self, dom: &mut D, node: &D::Node) {
        if !dom.has_class(node, HIDDEN_CLASS) {
            dom.set_attribute(node, CHECKED_ATTR, "1");
        }
    }

    /// Matched words recorded on `node`, in match order.
    pub fn words<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> Vec<String> {
        dom.attribute(node, WORD_ATTR)
            .map(|value| {
                value
                    .split(WORD_SEPARATOR)
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn state<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> CardState {
        if dom.has_class(node, HIDDEN_CLASS) {
            CardState::Hidden(self.words(dom, node))
        } else if dom.has_attribute(node, CHECKED_ATTR) {
            CardState::Checked
        } else {
            CardState::Visible
        }
    }

    /// Details shown when the user inspects a hidden card.
    pub fn inspect<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> Option<Inspection> {
        if !dom.has_class(node, HIDDEN_CLASS) {
            return None;
        }
        Some(Inspection {
            words: self.words(dom, node),
            field: dom.attribute(node, FIELD_ATTR).and_then(|f| Field::from_str(&f)),
            collapsed_by: dom.attribute(node, COLLAPSED_ATTR),
        })
    }

    pub fn is_hidden<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        dom.has_class(node, HIDDEN_CLASS)
    }

    /// Whether a strict ancestor of `node` is hidden.
    pub fn inside_hidden<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        dom.has_ancestor_matching(node, &HIDDEN)
    }

    /// Hidden elements, document order.
    pub fn hidden_cards<D: Dom + ?Sized>(&self, dom: &D) -> Vec<D::Node> {
        match dom.document_element() {
            Some(root) => dom.query_all(&root, &HIDDEN),
            None => Vec::new(),
        }
    }

    pub fn hidden_count<D: Dom + ?Sized>(&self, dom: &D) -> usize {
        self.hidden_cards(dom).len()
    }

    /// Take the page's current husks out of view and give back any earlier
    /// husk that has since been filled. Returns how many were newly swept.
    pub fn sweep<D: Dom + ?Sized>(&self, dom: &mut D, husks: &[D::Node]) -> usize {
        if let Some(root) = dom.document_element() {
            for node in dom.query_all(&root, &SWEPT) {
                if !husks.contains(&node) {
                    dom.remove_class(&node, EMPTY_CLASS);
                }
            }
        }

        let mut swept = 0;
        for husk in husks {
            if dom.has_class(husk, EMPTY_CLASS) || self.is_chrome(dom, husk) {
                continue;
            }
            dom.add_class(husk, EMPTY_CLASS);
            swept += 1;
        }
        swept
    }

    pub fn is_swept<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        dom.has_class(node, EMPTY_CLASS)
    }

    /// Reveal mode draws a frame and label only on the innermost hidden
    /// elements, never on one that contains another.
    pub fn should_annotate<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        dom.has_class(node, HIDDEN_CLASS) && dom.query_first(node, &HIDDEN).is_none()
    }

    /// Restore every card on the page. Returns how many were hidden.
    pub fn revert_all<D: Dom + ?Sized>(&self, dom: &mut D) -> usize {
        let root = match dom.document_element() {
            Some(root) => root,
            None => return 0,
        };
        let hidden = dom.query_all(&root, &HIDDEN);
        for node in &hidden {
            self.unhide(dom, node);
        }

        let checked: SelectorList = Selector::attr(CHECKED_ATTR).into();
        for node in dom.query_all(&root, &checked) {
            dom.remove_attribute(&node, CHECKED_ATTR);
        }
        for node in dom.query_all(&root, &SWEPT) {
            dom.remove_class(&node, EMPTY_CLASS);
        }
        hidden.len()
    }
}

impl Default for HideEngine {
    fn default() -> Self {
        Self::new("Filtered")
    }
}

fn join_words(words: &[String]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(WORD_SEPARATOR);
        }
        out.push_str(word);
    }
    out
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;
    use crate::document::Document;

    fn fixture() -> Document {
        Document::parse_html(
            r#"<html><body>
                <header><div id="h" class="card">Logo</div></header>
                <div class="YjPgVd" id="grid"><div class="card" id="a">A</div></div>
                <div class="card" id="b">B</div>
            </body></html>"#,
        )
    }

    #[test]
    fn hide_then_merge_then_repeat() {
        let mut doc = fixture();
        let engine = HideEngine::new("Filtered");
        let a = doc.find_by_id("a").expect("a");

        assert_eq!(engine.hide(&mut doc, &a, "foo", Field::Title), HideOutcome::Hidden);
        assert_eq!(engine.hide(&mut doc, &a, "bar[regex,nosite]", Field::Site), HideOutcome::Merged);
        assert_eq!(engine.hide(&mut doc, &a, "foo", Field::Description), HideOutcome::Unchanged);

        assert_eq!(
            engine.state(&doc, &a),
            CardState::Hidden(vec!["foo".to_string(), "bar[regex,nosite]".to_string()])
        );
        let inspection = engine.inspect(&doc, &a).expect("hidden");
        assert_eq!(inspection.field, Some(Field::Title));
        assert_eq!(doc.attribute(&a, LABEL_ATTR).as_deref(), Some("Filtered"));
    }

    #[test]
    fn removing_last_word_clears_every_marker() {
        let mut doc = fixture();
        let engine = HideEngine::default();
        let b = doc.find_by_id("b").expect("b");
        let untouched = doc.outer_html(b);

        engine.hide(&mut doc, &b, "foo", Field::Title);
        engine.hide(&mut doc, &b, "bar", Field::Title);
        doc.set_attribute(&b, TIP_X_ATTR, "10");
        doc.set_attribute(&b, TIP_Y_ATTR, "20");

        assert!(engine.remove_word(&mut doc, &b, "foo"));
        assert_eq!(engine.state(&doc, &b), CardState::Hidden(vec!["bar".to_string()]));
        assert!(!engine.remove_word(&mut doc, &b, "foo"));
        assert!(engine.remove_word(&mut doc, &b, "bar"));

        assert_eq!(engine.state(&doc, &b), CardState::Visible);
        assert_eq!(doc.outer_html(b), untouched);
    }

    #[test]
    fn chrome_and_protected_grids_are_refused() {
        let mut doc = fixture();
        let engine = HideEngine::default();
        let h = doc.find_by_id("h").expect("h");
        let grid = doc.find_by_id("grid").expect("grid");
        assert_eq!(engine.hide(&mut doc, &h, "logo", Field::Title), HideOutcome::Refused);
        assert_eq!(engine.hide(&mut doc, &grid, "a", Field::Title), HideOutcome::Refused);
        assert_eq!(engine.hidden_count(&doc), 0);
    }

    #[test]
    fn sweep_tracks_current_husks_only() {
        let mut doc = fixture();
        let engine = HideEngine::default();
        let a = doc.find_by_id("a").expect("a");
        let b = doc.find_by_id("b").expect("b");
        let h = doc.find_by_id("h").expect("h");

        assert_eq!(engine.sweep(&mut doc, &[a, b, h]), 2);
        assert!(engine.is_swept(&doc, &a));
        assert!(!engine.is_swept(&doc, &h));
        assert_eq!(engine.sweep(&mut doc, &[a, b]), 0);
        assert_eq!(engine.hidden_count(&doc), 0);

        assert_eq!(engine.sweep(&mut doc, &[b]), 0);
        assert!(!engine.is_swept(&doc, &a));

        engine.revert_all(&mut doc);
        assert!(!engine.is_swept(&doc, &b));
    }

    #[test]
    fn checked_is_cleared_on_hide_and_skipped_when_hidden() {
        let mut doc = fixture();
        let engine = HideEngine::default();
        let b = doc.find_by_id("b").expect("b");
        engine.mark_checked(&mut doc, &b);
        assert_eq!(engine.state(&doc, &b), CardState::Checked);
        engine.hide(&mut doc, &b, "b", Field::Title);
        assert!(!doc.has_attribute(&b, CHECKED_ATTR));
        engine.mark_checked(&mut doc, &b);
        assert!(!doc.has_attribute(&b, CHECKED_ATTR));
    }

    #[test]
    fn collapse_records_trigger_and_annotation_goes_innermost() {
        let mut doc = Document::parse_html(
            r#"<html><body><div id="c"><div id="s1">x</div><div id="s2">y</div></div></body></html>"#,
        );
        let engine = HideEngine::default();
        let c = doc.find_by_id("c").expect("c");
        let s1 = doc.find_by_id("s1").expect("s1");
        let s2 = doc.find_by_id("s2").expect("s2");
        engine.hide(&mut doc, &s1, "w", Field::Title);
        engine.hide(&mut doc, &s2, "w", Field::Title);
        assert_eq!(engine.collapse(&mut doc, &c, "w"), HideOutcome::Hidden);

        let inspection = engine.inspect(&doc, &c).expect("collapsed");
        assert_eq!(inspection.collapsed_by.as_deref(), Some("w"));
        assert_eq!(inspection.field, None);
        assert!(!engine.should_annotate(&doc, &c));
        assert!(engine.should_annotate(&doc, &s1));
        assert!(engine.inside_hidden(&doc, &s1));
        assert_eq!(engine.hidden_count(&doc), 3);
    }

    #[test]
    fn revert_all_restores_page() {
        let mut doc = fixture();
        let engine = HideEngine::default();
        let a = doc.find_by_id("a").expect("a");
        let b = doc.find_by_id("b").expect("b");
        let before = doc.to_html();
        engine.hide(&mut doc, &a, "a", Field::Title);
        engine.mark_checked(&mut doc, &b);
        assert_eq!(engine.revert_all(&mut doc), 1);
        assert_eq!(doc.to_html(), before);
    }
}
