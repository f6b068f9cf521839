//! Rule-against-card matching
//!
//! Reads a card through its adapter and reports the first field whose text
//! matches a rule. Pure: the document is never written here.

use crate::adapters::{MatchMode, SiteAdapter};
use crate::classify::FIELD_CLASSIFIER;
use crate::dom::Dom;
use crate::rule::Rule;
use crate::types::Field;

/// A rule hit on one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub field: Field,
    pub raw_line: String,
}

/// Evaluate `rule` against `card`. Malformed rules and cards without
/// readable text never match.
pub fn match_card<A, D>(rule: &Rule, adapter: &A, dom: &D, card: &D::Node) -> Option<MatchResult>
where
    A: SiteAdapter + ?Sized,
    D: Dom + ?Sized,
{
    if !rule.is_valid() {
        return None;
    }

    let field = match adapter.match_mode(dom, card) {
        MatchMode::Fields => match_fields(rule, adapter, dom, card).0,
        MatchMode::FieldsOrTextWalk => match match_fields(rule, adapter, dom, card) {
            (Some(field), _) => Some(field),
            (None, true) => match_text_walk(rule, dom, card),
            (None, false) => None,
        },
        MatchMode::WholeCard => match_text_walk(rule, dom, card),
    }?;

    Some(MatchResult {
        field,
        raw_line: rule.raw_line().to_string(),
    })
}

/// Field order is Title, Site, Description. Also reports whether the card
/// had no structured fragment at all.
fn match_fields<A, D>(rule: &Rule, adapter: &A, dom: &D, card: &D::Node) -> (Option<Field>, bool)
where
    A: SiteAdapter + ?Sized,
    D: Dom + ?Sized,
{
    let mut empty = true;
    for field in Field::ALL {
        let fragments = adapter.extract_field(dom, card, field);
        if !fragments.is_empty() {
            empty = false;
        }
        if rule.suppresses(field) {
            continue;
        }
        if fragments.iter().any(|text| rule.is_match(text)) {
            return (Some(field), false);
        }
    }
    (None, empty)
}

/// First non-suppressed fragment in document order wins.
fn match_text_walk<D: Dom + ?Sized>(rule: &Rule, dom: &D, card: &D::Node) -> Option<Field> {
    FIELD_CLASSIFIER
        .fragments(dom, card)
        .into_iter()
        .find(|(field, text)| !rule.suppresses(*field) && rule.is_match(text))
        .map(|(field, _)| field)
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;
    use crate::adapters::AdapterKind;
    use crate::document::Document;
    use crate::parser::parse_line;

    fn rule(line: &str) -> Rule {
        parse_line(line).0
    }

    const GOOGLE_CARD: &str = r#"<html><body><div class="g" id="c">
        <h3>Cheap Flights</h3><cite>travel.example</cite><div class="VwiC3b">Book flights today</div>
    </div></body></html>"#;

    #[test]
    fn first_matching_field_wins() {
        let doc = Document::parse_html(GOOGLE_CARD);
        let card = doc.find_by_id("c").expect("card");
        let hit = match_card(&rule("flights"), &AdapterKind::GoogleMain, &doc, &card).expect("match");
        assert_eq!(hit.field, Field::Title);
        assert_eq!(hit.raw_line, "flights");
    }

    #[test]
    fn suppressed_field_falls_through_to_next() {
        let doc = Document::parse_html(GOOGLE_CARD);
        let card = doc.find_by_id("c").expect("card");
        let hit = match_card(&rule("flights[notitle]"), &AdapterKind::GoogleMain, &doc, &card).expect("match");
        assert_eq!(hit.field, Field::Description);

        assert_eq!(
            match_card(&rule("cheap[notitle]"), &AdapterKind::GoogleMain, &doc, &card),
            None
        );
    }

    #[test]
    fn malformed_rule_never_matches() {
        let doc = Document::parse_html(GOOGLE_CARD);
        let card = doc.find_by_id("c").expect("card");
        assert_eq!(match_card(&rule("([[oops[regex]"), &AdapterKind::GoogleMain, &doc, &card), None);
    }

    #[test]
    fn whole_card_walk_reports_classified_field() {
        let doc = Document::parse_html(
            r#"<html><body><article id="c"><h4>Weather</h4><time>Spam Times</time><p>Sunny</p></article></body></html>"#,
        );
        let card = doc.find_by_id("c").expect("card");
        let hit = match_card(&rule("spam"), &AdapterKind::GoogleNewsSite, &doc, &card).expect("match");
        assert_eq!(hit.field, Field::Site);
        assert_eq!(match_card(&rule("spam[nosite]"), &AdapterKind::GoogleNewsSite, &doc, &card), None);
    }

    #[test]
    fn structured_cards_without_fragments_fall_back_to_text_walk() {
        let doc = Document::parse_html(
            r#"<html><body><div class="wOPJ9c" id="p"><div><span>Discount Gadget</span></div></div></body></html>"#,
        );
        let card = doc.find_by_id("p").expect("card");
        let hit = match_card(&rule("gadget"), &AdapterKind::GoogleShop, &doc, &card).expect("match");
        assert_eq!(hit.field, Field::Description);

        // Plain field mode has no fallback
        assert_eq!(match_card(&rule("gadget"), &AdapterKind::GoogleMain, &doc, &card), None);
    }

    #[test]
    fn literal_and_regex_agree_on_special_characters() {
        let doc = Document::parse_html(
            r#"<html><body><div class="g" id="c"><h3>C++ (2024) guide</h3></div></body></html>"#,
        );
        let card = doc.find_by_id("c").expect("card");
        assert!(match_card(&rule("c++ (2024)"), &AdapterKind::GoogleMain, &doc, &card).is_some());
        assert!(match_card(&rule(r"c\+\+ \(2024\)[regex]"), &AdapterKind::GoogleMain, &doc, &card).is_some());
        assert!(match_card(&rule("c+ (2024)"), &AdapterKind::GoogleMain, &doc, &card).is_none());
    }
}
