//! Google search result pages

use std::sync::LazyLock;

use super::{all_texts, first_attr, first_text, walk_field, AdapterKind, MatchMode, SiteAdapter};
use crate::dom::{Dom, DomExt};
use crate::selector::{Selector, SelectorList};
use crate::selectors;
use crate::types::Field;

static NEWS_WRAPPER: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::class("zP82e")]);

/// News-style cards hide their `.zP82e` wrapper when there is one.
pub(super) fn news_wrapper_target<D: Dom + ?Sized>(dom: &D, card: &D::Node) -> D::Node {
    dom.closest(card, &NEWS_WRAPPER).unwrap_or_else(|| card.clone())
}

/// Whether `node` sits under an element matching `selectors`, looking no
/// higher than `card`.
fn under<D: Dom + ?Sized>(dom: &D, node: &D::Node, card: &D::Node, selectors: &SelectorList) -> bool {
    let mut current = dom.parent_element(node);
    while let Some(el) = current {
        if selectors.matches(dom, &el) {
            return true;
        }
        if &el == card {
            return false;
        }
        current = dom.parent_element(&el);
    }
    false
}

// =============================================================================
// Main Results
// =============================================================================

static MAIN_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("div").with_class("g"),
        Selector::tag("div").with_class("SoaBEf"),
        Selector::tag("g-card"),
        Selector::tag("div").with_class("n0jPhd"),
        Selector::tag("div").child_of(Selector::tag("div").with_class("MjjYud")),
    ]
});
static NEWS_STYLE: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("div").with_class("SoaBEf"),
        Selector::tag("g-card"),
        Selector::tag("div").with_class("n0jPhd"),
    ]
});
static MAIN_TITLE: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::tag("h3")]);
static MAIN_SITE: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("cite"),
        Selector::class("TbwUpd"),
        Selector::class("VuuXrf"),
    ]
});
static MAIN_DESC: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::class("VwiC3b"),
        Selector::tag("span").with_class("st"),
        Selector::class("yXK7lf"),
    ]
});

/// Web results. Plain results read the first title, site and snippet
/// element; news blocks mixed into the results are read as a whole.
pub struct GoogleMain;

impl SiteAdapter for GoogleMain {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GoogleMain
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &MAIN_CARDS
    }

    fn match_mode<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node) -> MatchMode {
        if NEWS_STYLE.matches(dom, card) {
            MatchMode::WholeCard
        } else {
            MatchMode::Fields
        }
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        if NEWS_STYLE.matches(dom, card) {
            return walk_field(dom, card, field);
        }
        match field {
            Field::Title => first_text(dom, card, &MAIN_TITLE),
            Field::Site => first_text(dom, card, &MAIN_SITE),
            Field::Description => first_text(dom, card, &MAIN_DESC),
        }
    }

    fn hide_target<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node) -> D::Node {
        if NEWS_STYLE.matches(dom, card) {
            news_wrapper_target(dom, card)
        } else {
            card.clone()
        }
    }
}

// =============================================================================
// Video Search
// =============================================================================

static VIDEO_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("div").with_class("g").has(Selector::tag("video-voyager")),
        Selector::tag("div").with_class("g").has(Selector::attr("data-vid")),
        Selector::tag("video-voyager"),
        Selector::tag("div").with_attr("data-vid"),
    ]
});
static VIDEO_ARIA_LINK: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("a").with_attr("aria-label")]);
static VIDEO_TITLE_ATTR: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::attr("title")]);
static VIDEO_CHANNEL: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("cite"),
        Selector::class("NbKaIc"),
        Selector::class("TbwUpd"),
        Selector::class("VuuXrf"),
        Selector::tag("span").with_attr_eq("role", "text"),
        Selector::class("gqF9Jc"),
        Selector::class("fG8Fp"),
        Selector::tag("cite").within(Selector::tag("a").with_attr("ping")),
        Selector::class("dXiKIc"),
        Selector::class("f4hh3d").within(Selector::class("LEwnzc")),
    ]
});
static VIDEO_CHANNEL_ATTR: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::attr("data-channel-name")]);
/// Snippet selectors, each contributing its first element.
static VIDEO_DESC: LazyLock<Vec<SelectorList>> = LazyLock::new(|| {
    vec![
        selectors![Selector::class("VwiC3b")],
        selectors![Selector::class("yXK7lf")],
        selectors![Selector::class("Uroaid")],
        selectors![Selector::class("ITZIwc")],
    ]
});
/// Elements whose text never counts as channel text.
static VIDEO_NOT_CHANNEL: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("h3"),
        Selector::tag("script"),
        Selector::tag("style"),
        Selector::tag("noscript"),
        Selector::class("VwiC3b"),
        Selector::class("yXK7lf"),
        Selector::class("Uroaid"),
        Selector::class("ITZIwc"),
    ]
});

/// Video results. Channel names have no stable markup, so any loose card
/// text outside the title and snippet also counts as site text.
pub struct GoogleVideo;

impl SiteAdapter for GoogleVideo {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GoogleVideo
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &VIDEO_CARDS
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        match field {
            Field::Title => {
                let mut out = first_text(dom, card, &MAIN_TITLE);
                out.extend(first_attr(dom, card, &VIDEO_ARIA_LINK, "aria-label"));
                out.extend(first_attr(dom, card, &VIDEO_TITLE_ATTR, "title"));
                out
            }
            Field::Site => {
                let mut out = all_texts(dom, card, &VIDEO_CHANNEL);
                out.extend(
                    dom.query_all(card, &VIDEO_CHANNEL_ATTR)
                        .iter()
                        .filter_map(|el| dom.attribute(el, "data-channel-name"))
                        .filter(|v| !v.trim().is_empty()),
                );
                for text_node in dom.text_nodes(card) {
                    if under(dom, &text_node, card, &VIDEO_NOT_CHANNEL) {
                        continue;
                    }
                    if let Some(text) = dom.text_value(&text_node) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            out.push(trimmed.to_string());
                        }
                    }
                }
                out
            }
            Field::Description => VIDEO_DESC
                .iter()
                .flat_map(|selectors| first_text(dom, card, selectors))
                .collect(),
        }
    }
}

// =============================================================================
// News Tab
// =============================================================================

static NEWS_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("div").with_class("SoaBEf"),
        Selector::tag("g-card"),
        Selector::tag("div").with_class("WlydOe"),
        Selector::tag("article"),
        Selector::tag("div").with_class("n0jPhd"),
    ]
});

/// News tab. Layouts vary too much for field selectors.
pub struct GoogleNews;

impl SiteAdapter for GoogleNews {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GoogleNews
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &NEWS_CARDS
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

// =============================================================================
// Image Search
// =============================================================================

static IMAGE_CARDS: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("div").with_attr_eq("jsname", "dTDiAc")]);
static IMAGE_TITLE: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("div").with_class("toI8Rb").with_class("OSrXXb")]);
static IMAGE_SITE_BOX: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("div").with_class("Xxy7Vb")]);
static SPAN: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::tag("span")]);

pub struct GoogleImage;

impl SiteAdapter for GoogleImage {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GoogleImage
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &IMAGE_CARDS
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        match field {
            Field::Title => first_text(dom, card, &IMAGE_TITLE),
            Field::Site => match dom.query_first(card, &IMAGE_SITE_BOX) {
                Some(site_box) => all_texts(dom, &site_box, &SPAN),
                None => Vec::new(),
            },
            Field::Description => Vec::new(),
        }
    }
}

// =============================================================================
// Shopping
// =============================================================================

/// Separator between product name and price in the accessible label.
const PRICE_MARKER: &str = "現在の価格";

static SHOP_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("div").with_attr_eq("jsname", "dQK82e"),
        Selector::tag("div").with_class("wOPJ9c"),
    ]
});
static SHOP_TITLE_ATTR: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("div").with_class("JK3kIe")]);
static SHOP_SITE: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("span").with_class("WJMUdc")]);
static SHOP_LABELLED: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("div").with_class("njFjte"),
        Selector::tag("div").with_attr("aria-label"),
    ]
});
static SHOP_TITLE_FALLBACK: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("h3"),
        Selector::class("tAxDx"),
        Selector::class("C7Lkve"),
    ]
});
static SHOP_SITE_FALLBACK: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::class("aULzUe"),
        Selector::class("IuHnof"),
        Selector::class("a3Hn7"),
    ]
});

/// Product name and seller pieces of the accessible label.
fn split_label(label: &str) -> (&str, &str) {
    label.split_once(PRICE_MARKER).unwrap_or((label, ""))
}

/// Product cards. Only the card itself is hidden, never the grid around it.
pub struct GoogleShop;

impl GoogleShop {
    fn label<D: Dom + ?Sized>(dom: &D, card: &D::Node) -> Option<String> {
        dom.query_first(card, &SHOP_LABELLED)
            .and_then(|el| dom.attribute(&el, "aria-label"))
    }
}

impl SiteAdapter for GoogleShop {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GoogleShop
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &SHOP_CARDS
    }

    fn match_mode<D: Dom + ?Sized>(&self, _dom: &D, _card: &D::Node) -> MatchMode {
        MatchMode::FieldsOrTextWalk
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        let label = Self::label(dom, card);
        let mut out = Vec::new();
        match field {
            Field::Title => {
                out.extend(first_attr(dom, card, &SHOP_TITLE_ATTR, "title"));
                if let Some(label) = &label {
                    let (name, _) = split_label(label);
                    if !name.trim().is_empty() {
                        out.push(name.trim().to_string());
                    }
                }
                out.extend(first_text(dom, card, &SHOP_TITLE_FALLBACK));
            }
            Field::Site => {
                out.extend(first_text(dom, card, &SHOP_SITE));
                if let Some(label) = &label {
                    let (_, rest) = split_label(label);
                    if !rest.trim().is_empty() {
                        out.push(rest.trim().to_string());
                    }
                }
                out.extend(first_text(dom, card, &SHOP_SITE_FALLBACK));
            }
            Field::Description => {}
        }
        out
    }
}

// =============================================================================
// Shorts
// =============================================================================

static SHORTS_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![Selector::tag("div")
        .with_class("MjjYud")
        .has(Selector::tag("span").with_class("Yt787"))]
});
static SHORTS_TITLE: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("span").with_class("Yt787")]);
static SHORTS_CHANNEL: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("span").with_class("jSLaVc")]);
static SHORTS_SITE: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("span").with_class("E51IV")]);

/// Short-video blocks mixed into any result page.
pub struct GoogleShorts;

impl SiteAdapter for GoogleShorts {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GoogleShorts
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &SHORTS_CARDS
    }

    fn match_mode<D: Dom + ?Sized>(&self, _dom: &D, _card: &D::Node) -> MatchMode {
        MatchMode::FieldsOrTextWalk
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        match field {
            Field::Title => first_text(dom, card, &SHORTS_TITLE),
            Field::Site => {
                let mut out = first_text(dom, card, &SHORTS_CHANNEL);
                out.extend(first_text(dom, card, &SHORTS_SITE));
                out
            }
            Field::Description => Vec::new(),
        }
    }
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn main_reads_first_element_per_field() {
        let doc = Document::parse_html(
            r#"<html><body><div class="MjjYud"><div class="g" id="r">
                <h3>First title</h3><h3>Second title</h3>
                <div class="VuuXrf">Example Site</div>
                <div class="VwiC3b">A snippet</div>
            </div></div></body></html>"#,
        );
        let card = doc.find_by_id("r").expect("card");
        assert_eq!(GoogleMain.match_mode(&doc, &card), MatchMode::Fields);
        assert_eq!(GoogleMain.extract_field(&doc, &card, Field::Title), vec!["First title".to_string()]);
        assert_eq!(GoogleMain.extract_field(&doc, &card, Field::Site), vec!["Example Site".to_string()]);
        assert_eq!(GoogleMain.extract_field(&doc, &card, Field::Description), vec!["A snippet".to_string()]);
        // The same element is reachable through both div.g and MjjYud > div
        assert_eq!(GoogleMain.discover_cards(&doc), vec![card]);
    }

    #[test]
    fn news_style_cards_hide_their_wrapper() {
        let doc = Document::parse_html(
            r#"<html><body><div class="zP82e" id="w"><div class="SoaBEf" id="n">
                <div role="heading">Story</div><span>Publisher</span>
            </div></div></body></html>"#,
        );
        let card = doc.find_by_id("n").expect("card");
        assert_eq!(GoogleMain.match_mode(&doc, &card), MatchMode::WholeCard);
        assert_eq!(GoogleMain.hide_target(&doc, &card), doc.find_by_id("w").expect("wrapper"));
        assert_eq!(GoogleNews.hide_target(&doc, &card), doc.find_by_id("w").expect("wrapper"));
        assert_eq!(GoogleMain.extract_field(&doc, &card, Field::Title), vec!["Story".to_string()]);
    }

    #[test]
    fn video_site_includes_loose_text_but_not_title_or_snippet() {
        let doc = Document::parse_html(
            r#"<html><body><div class="g" id="v"><video-voyager>
                <h3>Clip title</h3>
                <div><span>Uploader Name</span></div>
                <div class="VwiC3b">Clip snippet</div>
            </video-voyager></div></body></html>"#,
        );
        let card = doc.find_by_id("v").expect("card");
        let cards = GoogleVideo.discover_cards(&doc);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0], card);

        let site = GoogleVideo.extract_field(&doc, &card, Field::Site);
        assert_eq!(site, vec!["Uploader Name".to_string()]);
        assert_eq!(GoogleVideo.extract_field(&doc, &card, Field::Title), vec!["Clip title".to_string()]);
        assert_eq!(
            GoogleVideo.extract_field(&doc, &card, Field::Description),
            vec!["Clip snippet".to_string()]
        );
    }

    #[test]
    fn image_site_reads_spans() {
        let doc = Document::parse_html(
            r#"<html><body><div jsname="dTDiAc" id="i">
                <div class="toI8Rb OSrXXb">Sunset</div>
                <div class="Xxy7Vb"><span>photos.example</span><span>Gallery</span></div>
            </div></body></html>"#,
        );
        let card = doc.find_by_id("i").expect("card");
        assert_eq!(GoogleImage.extract_field(&doc, &card, Field::Title), vec!["Sunset".to_string()]);
        assert_eq!(
            GoogleImage.extract_field(&doc, &card, Field::Site),
            vec!["photos.example".to_string(), "Gallery".to_string()]
        );
    }

    #[test]
    fn shop_splits_accessible_label() {
        let doc = Document::parse_html(
            r#"<html><body><div class="wOPJ9c" id="p">
                <div class="njFjte" aria-label="Acme Kettle. 現在の価格: ￥3,000. Shop Town."></div>
            </div></body></html>"#,
        );
        let card = doc.find_by_id("p").expect("card");
        assert_eq!(GoogleShop.extract_field(&doc, &card, Field::Title), vec!["Acme Kettle.".to_string()]);
        assert_eq!(
            GoogleShop.extract_field(&doc, &card, Field::Site),
            vec![": ￥3,000. Shop Town.".to_string()]
        );
    }

    #[test]
    fn shorts_cards_need_a_title_span() {
        let doc = Document::parse_html(
            r#"<html><body>
                <div class="MjjYud" id="s"><span class="Yt787">Short clip</span><span class="jSLaVc">Channel</span></div>
                <div class="MjjYud"><div class="g"><h3>Plain</h3></div></div>
            </body></html>"#,
        );
        let cards = GoogleShorts.discover_cards(&doc);
        assert_eq!(cards, vec![doc.find_by_id("s").expect("shorts")]);
        assert_eq!(GoogleShorts.extract_field(&doc, &cards[0], Field::Site), vec!["Channel".to_string()]);
    }
}
