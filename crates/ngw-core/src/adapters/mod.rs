//! Site adapters
//!
//! One adapter per search engine and result page flavour. Each adapter knows
//! how to find result cards in that page's markup and how to pull title, site
//! and description text out of a card. The active set is chosen once per pass
//! from the page URL and the per-page toggles.

mod bing;
mod google;
mod google_news;

use std::fmt;

use crate::classify::FIELD_CLASSIFIER;
use crate::config::SubOptions;
use crate::dom::{Dom, DomExt};
use crate::page::PageContext;
use crate::selector::SelectorList;
use crate::types::{Field, PageType};

pub use bing::{BingImage, BingMain, BingNews, BingShop, BingVideo};
pub use google::{GoogleImage, GoogleMain, GoogleNews, GoogleShop, GoogleShorts, GoogleVideo};
pub use google_news::GoogleNewsSite;

// =============================================================================
// Adapter Contract
// =============================================================================

/// How the matcher reads a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Title, then site, then description fragments from the adapter.
    Fields,
    /// As [`MatchMode::Fields`], but a card with no structured fragment at all
    /// is read with the generic text walk instead.
    FieldsOrTextWalk,
    /// Generic text walk over the whole card. The first non-suppressed hit
    /// hides the card.
    WholeCard,
}

/// A container whose sub-cards, once all hidden, hide the container too.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseGroup<N> {
    pub container: N,
    pub members: Vec<N>,
}

pub trait SiteAdapter {
    fn kind(&self) -> AdapterKind;

    /// Structural predicate for this adapter's cards, also used by the
    /// flicker-prevention stylesheet.
    fn card_selectors(&self) -> &'static SelectorList;

    /// Cards currently in the document, document order.
    fn discover_cards<D: Dom + ?Sized>(&self, dom: &D) -> Vec<D::Node> {
        match dom.document_element() {
            Some(root) => dom.query_all(&root, self.card_selectors()),
            None => Vec::new(),
        }
    }

    fn match_mode<D: Dom + ?Sized>(&self, _dom: &D, _card: &D::Node) -> MatchMode {
        MatchMode::Fields
    }

    /// Text fragments of `field` in `card`. Missing markup yields nothing.
    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String>;

    /// Element that is actually hidden when `card` matches.
    fn hide_target<D: Dom + ?Sized>(&self, _dom: &D, card: &D::Node) -> D::Node {
        card.clone()
    }

    fn collapse_groups<D: Dom + ?Sized>(&self, _dom: &D, _cards: &[D::Node]) -> Vec<CollapseGroup<D::Node>> {
        Vec::new()
    }

    /// Empty shells the page leaves behind after re-laying out its results.
    /// They carry no text and are swept out of view without counting as
    /// hidden cards.
    fn husks<D: Dom + ?Sized>(&self, _dom: &D) -> Vec<D::Node> {
        Vec::new()
    }
}

// =============================================================================
// Adapter Kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    BingMain,
    BingImage,
    BingVideo,
    BingNews,
    BingShop,
    GoogleMain,
    GoogleVideo,
    GoogleNews,
    GoogleImage,
    GoogleShop,
    GoogleShorts,
    GoogleNewsSite,
}

macro_rules! dispatch {
    ($kind:expr, $adapter:ident => $body:expr) => {
        match $kind {
            AdapterKind::BingMain => { let $adapter = &BingMain; $body }
            AdapterKind::BingImage => { let $adapter = &BingImage; $body }
            AdapterKind::BingVideo => { let $adapter = &BingVideo; $body }
            AdapterKind::BingNews => { let $adapter = &BingNews; $body }
            AdapterKind::BingShop => { let $adapter = &BingShop; $body }
            AdapterKind::GoogleMain => { let $adapter = &GoogleMain; $body }
            AdapterKind::GoogleVideo => { let $adapter = &GoogleVideo; $body }
            AdapterKind::GoogleNews => { let $adapter = &GoogleNews; $body }
            AdapterKind::GoogleImage => { let $adapter = &GoogleImage; $body }
            AdapterKind::GoogleShop => { let $adapter = &GoogleShop; $body }
            AdapterKind::GoogleShorts => { let $adapter = &GoogleShorts; $body }
            AdapterKind::GoogleNewsSite => { let $adapter = &GoogleNewsSite; $body }
        }
    };
}

impl AdapterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AdapterKind::BingMain => "bing-main",
            AdapterKind::BingImage => "bing-image",
            AdapterKind::BingVideo => "bing-video",
            AdapterKind::BingNews => "bing-news",
            AdapterKind::BingShop => "bing-shop",
            AdapterKind::GoogleMain => "google-main",
            AdapterKind::GoogleVideo => "google-video",
            AdapterKind::GoogleNews => "google-news",
            AdapterKind::GoogleImage => "google-image",
            AdapterKind::GoogleShop => "google-shop",
            AdapterKind::GoogleShorts => "google-shorts",
            AdapterKind::GoogleNewsSite => "google-news-site",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SiteAdapter for AdapterKind {
    fn kind(&self) -> AdapterKind {
        *self
    }

    fn card_selectors(&self) -> &'static SelectorList {
        dispatch!(self, a => a.card_selectors())
    }

    fn discover_cards<D: Dom + ?Sized>(&self, dom: &D) -> Vec<D::Node> {
        dispatch!(self, a => a.discover_cards(dom))
    }

    fn match_mode<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node) -> MatchMode {
        dispatch!(self, a => a.match_mode(dom, card))
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        dispatch!(self, a => a.extract_field(dom, card, field))
    }

    fn hide_target<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node) -> D::Node {
        dispatch!(self, a => a.hide_target(dom, card))
    }

    fn collapse_groups<D: Dom + ?Sized>(&self, dom: &D, cards: &[D::Node]) -> Vec<CollapseGroup<D::Node>> {
        dispatch!(self, a => a.collapse_groups(dom, cards))
    }

    fn husks<D: Dom + ?Sized>(&self, dom: &D) -> Vec<D::Node> {
        dispatch!(self, a => a.husks(dom))
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Adapters active on `page`, in evaluation order.
pub fn select_adapters(page: &PageContext, options: &SubOptions) -> Vec<AdapterKind> {
    let gated = |on: bool, kind: AdapterKind| if on { vec![kind] } else { Vec::new() };

    match page.page_type {
        PageType::BingMain => gated(options.bing_main, AdapterKind::BingMain),
        PageType::BingImage => gated(options.bing_image, AdapterKind::BingImage),
        PageType::BingVideo => gated(options.bing_video, AdapterKind::BingVideo),
        PageType::BingNews => gated(options.bing_news, AdapterKind::BingNews),
        PageType::BingShop => gated(options.bing_shop, AdapterKind::BingShop),
        PageType::GoogleNewsSite => vec![AdapterKind::GoogleNewsSite],
        google => {
            if (google == PageType::GoogleVideo && !options.google_video)
                || (google == PageType::GoogleNews && !options.google_news)
            {
                return Vec::new();
            }

            let mut kinds = Vec::new();
            if options.google_shorts {
                kinds.push(AdapterKind::GoogleShorts);
            }
            if options.google_main && google != PageType::GoogleShop {
                kinds.push(AdapterKind::GoogleMain);
            }
            match google {
                PageType::GoogleVideo => kinds.push(AdapterKind::GoogleVideo),
                PageType::GoogleNews => kinds.push(AdapterKind::GoogleNews),
                PageType::GoogleImage if options.google_image => kinds.push(AdapterKind::GoogleImage),
                PageType::GoogleShop if options.google_shop => kinds.push(AdapterKind::GoogleShop),
                _ => {}
            }
            kinds
        }
    }
}

/// Card predicates of `kinds`, for the flicker-prevention stylesheet.
pub fn candidate_selectors(kinds: &[AdapterKind]) -> SelectorList {
    kinds
        .iter()
        .fold(SelectorList::default(), |acc, kind| acc.union(kind.card_selectors()))
}

// =============================================================================
// Extraction Helpers
// =============================================================================

fn push_text(out: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Text of every element under `card` matching `selectors`.
pub(crate) fn all_texts<D: Dom + ?Sized>(dom: &D, card: &D::Node, selectors: &SelectorList) -> Vec<String> {
    let mut out = Vec::new();
    for el in dom.query_all(card, selectors) {
        push_text(&mut out, &dom.text_content(&el));
    }
    out
}

/// Text of the first element under `card` matching `selectors`.
pub(crate) fn first_text<D: Dom + ?Sized>(dom: &D, card: &D::Node, selectors: &SelectorList) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(el) = dom.query_first(card, selectors) {
        push_text(&mut out, &dom.text_content(&el));
    }
    out
}

/// Attribute `name` of the first element under `card` matching `selectors`.
pub(crate) fn first_attr<D: Dom + ?Sized>(
    dom: &D,
    card: &D::Node,
    selectors: &SelectorList,
    name: &str,
) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(value) = dom
        .query_first(card, selectors)
        .and_then(|el| dom.attribute(&el, name))
    {
        push_text(&mut out, &value);
    }
    out
}

/// Generic text-walk fragments of `card` classified as `field`.
pub(crate) fn walk_field<D: Dom + ?Sized>(dom: &D, card: &D::Node, field: Field) -> Vec<String> {
    FIELD_CLASSIFIER
        .fragments(dom, card)
        .into_iter()
        .filter_map(|(label, text)| (label == field).then_some(text))
        .collect()
}

/// Attribute `name` of the card itself.
pub(crate) fn own_attr<D: Dom + ?Sized>(dom: &D, card: &D::Node, name: &str) -> Option<String> {
    dom.attribute(card, name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
