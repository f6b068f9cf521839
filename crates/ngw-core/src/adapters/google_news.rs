//! news.google.com

use std::sync::LazyLock;

use super::google::news_wrapper_target;
use super::{walk_field, AdapterKind, MatchMode, SiteAdapter};
use crate::dom::Dom;
use crate::selector::{Selector, SelectorList};
use crate::selectors;
use crate::types::Field;

static CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("article"),
        Selector::tag("c-wiz").with_attr("data-n-tid"),
        Selector::tag("div").with_attr("data-n-tid"),
    ]
});

/// Article cards on the standalone news site. Class names there are
/// generated, so every card is read with the generic text walk.
pub struct GoogleNewsSite;

impl SiteAdapter for GoogleNewsSite {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GoogleNewsSite
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &CARDS
    }

    fn match_mode<D: Dom + ?Sized>(&self, _dom: &D, _card: &D::Node) -> MatchMode {
        MatchMode::WholeCard
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        walk_field(dom, card, field)
    }

    fn hide_target<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node) -> D::Node {
        news_wrapper_target(dom, card)
    }
}
