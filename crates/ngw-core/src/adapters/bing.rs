//! Bing result pages

use std::sync::LazyLock;

use serde::Deserialize;

use super::{first_attr, first_text, own_attr, push_text, walk_field, AdapterKind, CollapseGroup, MatchMode, SiteAdapter};
use crate::dom::{Dom, DomExt};
use crate::page::extract_host;
use crate::selector::{Selector, SelectorList};
use crate::selectors;
use crate::types::Field;

// =============================================================================
// Main Results
// =============================================================================

static MAIN_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("li").with_class("b_algo"),
        Selector::tag("li").with_class("b_top"),
        Selector::tag("div").with_class("b_top"),
        Selector::tag("div").with_class("slide"),
        Selector::tag("div").with_class("na_card_wrp"),
        Selector::tag("div").with_class("mmlp"),
        Selector::tag("div").with_class("dg_u"),
        Selector::tag("div").with_class("mc_fgvc_u"),
        Selector::tag("li").with_class("b_ans"),
        Selector::tag("div").with_class("b_ans"),
    ]
});

static MAIN_TITLE_TEXT: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("h2"), Selector::tag("a").with_class("b_title")]);
static MAIN_TITLE_LABEL: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("a").with_attr("aria-label").within(Selector::tag("h2"))]);
static DATA_TITLE: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::attr("data-title")]);

static MAIN_SITE_TEXT: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("cite"), Selector::class("b_attribution")]);
static DATA_DISPLAYNAME: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::attr("data-displayname")]);

// Carousel slides Bing empties out when it re-renders a carousel
static EMPTY_SLIDES: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("div").with_attr_prefix("class", "slide").empty()]);

static MAIN_DESC_TEXT: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("p").not(Selector::class("na_t")),
        Selector::class("b_snippet"),
    ]
});

/// Main web results, answers and carousels. Cards nest (a carousel answer
/// holds slide cards), so a card only reads text that no nested card owns.
pub struct BingMain;

impl BingMain {
    /// Whether `el` belongs to `card` rather than to a card nested inside it.
    fn owns<D: Dom + ?Sized>(dom: &D, card: &D::Node, el: &D::Node) -> bool {
        if MAIN_CARDS.matches(dom, el) {
            return false;
        }
        for ancestor in dom.ancestors(el) {
            if &ancestor == card {
                return true;
            }
            if MAIN_CARDS.matches(dom, &ancestor) {
                return false;
            }
        }
        false
    }

    fn owned<D: Dom + ?Sized>(dom: &D, card: &D::Node, selectors: &SelectorList) -> Vec<D::Node> {
        dom.query_all(card, selectors)
            .into_iter()
            .filter(|el| Self::owns(dom, card, el))
            .collect()
    }

    fn owned_texts<D: Dom + ?Sized>(dom: &D, card: &D::Node, selectors: &SelectorList) -> Vec<String> {
        Self::owned(dom, card, selectors)
            .iter()
            .map(|el| dom.text_content(el).trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }

    fn owned_attrs<D: Dom + ?Sized>(
        dom: &D,
        card: &D::Node,
        selectors: &SelectorList,
        name: &str,
    ) -> Vec<String> {
        let mut out: Vec<String> = own_attr(dom, card, name).into_iter().collect();
        out.extend(
            Self::owned(dom, card, selectors)
                .iter()
                .filter_map(|el| dom.attribute(el, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        );
        out
    }
}

impl SiteAdapter for BingMain {
    fn kind(&self) -> AdapterKind {
        AdapterKind::BingMain
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &MAIN_CARDS
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        match field {
            Field::Title => {
                let mut out = Self::owned_texts(dom, card, &MAIN_TITLE_TEXT);
                out.extend(Self::owned_attrs(dom, card, &MAIN_TITLE_LABEL, "aria-label"));
                out.extend(Self::owned_attrs(dom, card, &DATA_TITLE, "data-title"));
                out
            }
            Field::Site => {
                let mut out = Self::owned_texts(dom, card, &MAIN_SITE_TEXT);
                out.extend(Self::owned_attrs(dom, card, &DATA_DISPLAYNAME, "data-displayname"));
                out
            }
            Field::Description => Self::owned_texts(dom, card, &MAIN_DESC_TEXT),
        }
    }

    fn collapse_groups<D: Dom + ?Sized>(&self, dom: &D, cards: &[D::Node]) -> Vec<CollapseGroup<D::Node>> {
        let mut groups: Vec<CollapseGroup<D::Node>> = Vec::new();
        for card in cards {
            // Nearest enclosing card among the discovered ones
            let parent_card = dom
                .ancestors(card)
                .into_iter()
                .find(|ancestor| cards.contains(ancestor));
            let container = match parent_card {
                Some(container) => container,
                None => continue,
            };
            match groups.iter_mut().find(|g| g.container == container) {
                Some(group) => group.members.push(card.clone()),
                None => groups.push(CollapseGroup {
                    container,
                    members: vec![card.clone()],
                }),
            }
        }
        groups
    }

    fn husks<D: Dom + ?Sized>(&self, dom: &D) -> Vec<D::Node> {
        match dom.document_element() {
            Some(root) => dom.query_all(&root, &EMPTY_SLIDES),
            None => Vec::new(),
        }
    }
}

// =============================================================================
// Image Search
// =============================================================================

static IMAGE_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("li").has(Selector::tag("a").with_attr("aria-label")),
        Selector::tag("li").has(Selector::class("iusc")),
    ]
});
static IMAGE_ANCHORS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![Selector::tag("a").with_attr("aria-label"), Selector::class("iusc")]
});
static IMAGE_LABELS: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("a").with_attr("aria-label")]);
static IMAGE_META: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::class("iusc")]);
static LIST_ITEM: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::tag("li")]);

/// Image grid. The list item around a tile is hidden so the grid closes up.
pub struct BingImage;

impl SiteAdapter for BingImage {
    fn kind(&self) -> AdapterKind {
        AdapterKind::BingImage
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &IMAGE_CARDS
    }

    fn discover_cards<D: Dom + ?Sized>(&self, dom: &D) -> Vec<D::Node> {
        let root = match dom.document_element() {
            Some(root) => root,
            None => return Vec::new(),
        };
        let mut cards: Vec<D::Node> = Vec::new();
        for anchor in dom.query_all(&root, &IMAGE_ANCHORS) {
            if let Some(item) = dom.closest(&anchor, &LIST_ITEM) {
                if !cards.contains(&item) {
                    cards.push(item);
                }
            }
        }
        cards
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        let mut out = Vec::new();
        if field == Field::Title {
            for el in dom.query_all(card, &IMAGE_LABELS) {
                if let Some(label) = dom.attribute(&el, "aria-label") {
                    push_text(&mut out, &label);
                }
            }
        }
        for meta in image_meta(dom, card) {
            match field {
                Field::Title => push_opt(&mut out, meta.t.as_deref()),
                Field::Site => push_opt(&mut out, meta.purl.as_deref().map(extract_host)),
                Field::Description => push_opt(&mut out, meta.desc.as_deref()),
            }
        }
        out
    }
}

/// The JSON blob Bing keeps in an `.iusc` tile's `m` attribute.
#[derive(Debug, Deserialize)]
struct ImageMeta {
    /// Image title
    t: Option<String>,
    /// Page the image was found on
    purl: Option<String>,
    desc: Option<String>,
}

/// Parsed metadata of every tile in `card`. Malformed blobs are skipped.
fn image_meta<D: Dom + ?Sized>(dom: &D, card: &D::Node) -> Vec<ImageMeta> {
    dom.query_all(card, &IMAGE_META)
        .iter()
        .filter_map(|el| dom.attribute(el, "m"))
        .filter_map(|raw| serde_json::from_str(&raw).ok())
        .collect()
}

fn push_opt(out: &mut Vec<String>, text: Option<&str>) {
    if let Some(text) = text {
        push_text(out, text);
    }
}

// =============================================================================
// Video Search
// =============================================================================

static VIDEO_TILES: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::tag("div").with_class("mmlp"),
        Selector::tag("div").with_class("mc_fgvc_u"),
        Selector::tag("div").with_class("slide"),
    ]
});
static VIDEO_GRID: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("div").with_class("dg_u").not(Selector::class("mmlp"))]);
static VIDEO_CARDS: LazyLock<SelectorList> = LazyLock::new(|| VIDEO_TILES.union(&VIDEO_GRID));
static VIDEO_TITLE: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::class("mc_vtvc_title")]);
static VIDEO_META: LazyLock<SelectorList> = LazyLock::new(|| selectors![Selector::class("mc_vtvc_meta_row")]);

/// Video tiles read their title attribute and meta row; plain grid items are
/// read as a whole.
pub struct BingVideo;

impl SiteAdapter for BingVideo {
    fn kind(&self) -> AdapterKind {
        AdapterKind::BingVideo
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &VIDEO_CARDS
    }

    fn match_mode<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node) -> MatchMode {
        if VIDEO_GRID.matches(dom, card) {
            MatchMode::WholeCard
        } else {
            MatchMode::Fields
        }
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        match field {
            Field::Title => first_attr(dom, card, &VIDEO_TITLE, "title"),
            Field::Site => first_text(dom, card, &VIDEO_META),
            Field::Description => Vec::new(),
        }
    }
}

// =============================================================================
// News Search
// =============================================================================

static NEWS_CARDS: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::class("news-card"),
        Selector::tag("li").with_class("b_algo"),
        Selector::tag("div").with_class("verp"),
        Selector::tag("div").with_class("news-item"),
    ]
});
static NEWS_TITLE: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("a").with_class("title"), Selector::tag("h2")]);
static NEWS_SITE: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::class("source"),
        Selector::tag("cite"),
        Selector::class("b_attribution"),
    ]
});
static NEWS_DESC: LazyLock<SelectorList> = LazyLock::new(|| {
    selectors![
        Selector::class("snippet"),
        Selector::tag("p").within(Selector::class("b_caption")),
        Selector::class("b_snippet"),
    ]
});

/// News cards carry their headline and publisher as data attributes when
/// available; the markup is the fallback.
pub struct BingNews;

impl SiteAdapter for BingNews {
    fn kind(&self) -> AdapterKind {
        AdapterKind::BingNews
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &NEWS_CARDS
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        match field {
            Field::Title => match own_attr(dom, card, "data-title") {
                Some(title) => vec![title],
                None => first_text(dom, card, &NEWS_TITLE),
            },
            Field::Site => match own_attr(dom, card, "data-author") {
                Some(author) => vec![author],
                None => first_text(dom, card, &NEWS_SITE),
            },
            Field::Description => first_text(dom, card, &NEWS_DESC),
        }
    }
}

// =============================================================================
// Shopping
// =============================================================================

static SHOP_CARDS: LazyLock<SelectorList> =
    LazyLock::new(|| selectors![Selector::tag("li").with_class("br-item")]);

/// Product tiles have no stable field markup and are read as a whole.
pub struct BingShop;

impl SiteAdapter for BingShop {
    fn kind(&self) -> AdapterKind {
        AdapterKind::BingShop
    }

    fn card_selectors(&self) -> &'static SelectorList {
        &SHOP_CARDS
    }

    fn match_mode<D: Dom + ?Sized>(&self, _dom: &D, _card: &D::Node) -> MatchMode {
        MatchMode::WholeCard
    }

    fn extract_field<D: Dom + ?Sized>(&self, dom: &D, card: &D::Node, field: Field) -> Vec<String> {
        walk_field(dom, card, field)
    }
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;
    use crate::document::Document;

    const MAIN_PAGE: &str = r#"<html><body><ol id="b_results">
        <li class="b_algo" id="r1">
            <h2><a href="https://widgetco.com" aria-label="Widget store">WidgetCo Store</a></h2>
            <div class="b_caption"><cite>https://widgetco.com</cite><p>Buy widgets online.</p></div>
        </li>
        <li class="b_ans" id="carousel">
            <h2>Top stories</h2>
            <div class="slide" id="s1"><a data-title="Alpha story">Alpha</a></div>
            <div class="slide" id="s2"><a data-title="Beta story">Beta</a></div>
        </li>
    </ol></body></html>"#;

    #[test]
    fn main_extracts_fields() {
        let doc = Document::parse_html(MAIN_PAGE);
        let card = doc.find_by_id("r1").expect("card");
        assert_eq!(
            BingMain.extract_field(&doc, &card, Field::Title),
            vec!["WidgetCo Store".to_string(), "Widget store".to_string()]
        );
        assert_eq!(
            BingMain.extract_field(&doc, &card, Field::Site),
            vec!["https://widgetco.com".to_string()]
        );
        assert_eq!(
            BingMain.extract_field(&doc, &card, Field::Description),
            vec!["Buy widgets online.".to_string()]
        );
    }

    #[test]
    fn main_container_excludes_nested_card_text() {
        let doc = Document::parse_html(MAIN_PAGE);
        let carousel = doc.find_by_id("carousel").expect("carousel");
        assert_eq!(
            BingMain.extract_field(&doc, &carousel, Field::Title),
            vec!["Top stories".to_string()]
        );
        assert!(BingMain.extract_field(&doc, &carousel, Field::Description).is_empty());

        let slide = doc.find_by_id("s1").expect("slide");
        assert_eq!(
            BingMain.extract_field(&doc, &slide, Field::Title),
            vec!["Alpha story".to_string()]
        );
    }

    #[test]
    fn main_groups_slides_under_carousel() {
        let doc = Document::parse_html(MAIN_PAGE);
        let cards = BingMain.discover_cards(&doc);
        assert_eq!(cards.len(), 4);

        let groups = BingMain.collapse_groups(&doc, &cards);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].container, doc.find_by_id("carousel").expect("carousel"));
        assert_eq!(
            groups[0].members,
            vec![doc.find_by_id("s1").expect("s1"), doc.find_by_id("s2").expect("s2")]
        );
    }

    #[test]
    fn main_husks_are_childless_slides() {
        let doc = Document::parse_html(
            r#"<html><body><li class="b_ans">
                <div class="slide" id="full"><a data-title="Story">Story</a></div>
                <div class="slide" id="shell"></div>
                <div class="slide_wrap" id="shell2">  </div>
                <span class="slide" id="inline"></span>
            </li></body></html>"#,
        );
        assert_eq!(
            BingMain.husks(&doc),
            vec![doc.find_by_id("shell").expect("shell"), doc.find_by_id("shell2").expect("shell2")]
        );
        assert!(BingNews.husks(&doc).is_empty());
    }

    #[test]
    fn image_cards_are_enclosing_list_items() {
        let doc = Document::parse_html(
            r#"<html><body><ul>
                <li id="i1"><div><a class="iusc" m='{"t":"cat photo"}' aria-label="Cute cat"></a></div></li>
                <li id="i2"><a aria-label="Dog"></a></li>
                <li id="i3"><span>no image</span></li>
            </ul></body></html>"#,
        );
        let cards = BingImage.discover_cards(&doc);
        assert_eq!(cards, vec![doc.find_by_id("i1").expect("i1"), doc.find_by_id("i2").expect("i2")]);
        assert_eq!(
            BingImage.extract_field(&doc, &cards[0], Field::Title),
            vec!["Cute cat".to_string(), "cat photo".to_string()]
        );
        assert!(BingImage.extract_field(&doc, &cards[0], Field::Description).is_empty());
    }

    #[test]
    fn image_metadata_splits_into_fields() {
        let doc = Document::parse_html(
            r#"<html><body><ul>
                <li id="i1"><a class="iusc" m='{"murl":"https://cdn.example/w.jpg","t":"Widget photo","purl":"https://www.gadgets.example/widgets","desc":"A shiny gadget"}'></a></li>
                <li id="i2"><a class="iusc" m='{"t": broken'></a><a aria-label="Plain label"></a></li>
            </ul></body></html>"#,
        );
        let tile = doc.find_by_id("i1").expect("i1");
        assert_eq!(BingImage.extract_field(&doc, &tile, Field::Title), vec!["Widget photo".to_string()]);
        assert_eq!(
            BingImage.extract_field(&doc, &tile, Field::Site),
            vec!["www.gadgets.example".to_string()]
        );
        assert_eq!(
            BingImage.extract_field(&doc, &tile, Field::Description),
            vec!["A shiny gadget".to_string()]
        );

        let broken = doc.find_by_id("i2").expect("i2");
        assert_eq!(BingImage.extract_field(&doc, &broken, Field::Title), vec!["Plain label".to_string()]);
        assert!(BingImage.extract_field(&doc, &broken, Field::Site).is_empty());
        assert!(BingImage.extract_field(&doc, &broken, Field::Description).is_empty());
    }

    #[test]
    fn video_modes_per_card() {
        let doc = Document::parse_html(
            r#"<html><body>
                <div class="mmlp dg_u" id="v1"><div class="mc_vtvc_title" title="Tutorial"></div>
                    <div class="mc_vtvc_meta_row"><span>SomeChannel</span></div></div>
                <div class="dg_u" id="v2"><span>Grid item</span></div>
            </body></html>"#,
        );
        let v1 = doc.find_by_id("v1").expect("v1");
        let v2 = doc.find_by_id("v2").expect("v2");
        assert_eq!(BingVideo.match_mode(&doc, &v1), MatchMode::Fields);
        assert_eq!(BingVideo.match_mode(&doc, &v2), MatchMode::WholeCard);
        assert_eq!(BingVideo.extract_field(&doc, &v1, Field::Title), vec!["Tutorial".to_string()]);
        assert_eq!(BingVideo.extract_field(&doc, &v1, Field::Site), vec!["SomeChannel".to_string()]);
    }

    #[test]
    fn news_prefers_data_attributes() {
        let doc = Document::parse_html(
            r#"<html><body>
                <div class="news-card" id="n1" data-title="Headline" data-author="Daily Paper">
                    <a class="title">Other</a><div class="snippet">Summary</div></div>
            </body></html>"#,
        );
        let card = doc.find_by_id("n1").expect("card");
        assert_eq!(BingNews.extract_field(&doc, &card, Field::Title), vec!["Headline".to_string()]);
        assert_eq!(BingNews.extract_field(&doc, &card, Field::Site), vec!["Daily Paper".to_string()]);
        assert_eq!(BingNews.extract_field(&doc, &card, Field::Description), vec!["Summary".to_string()]);
    }
}
