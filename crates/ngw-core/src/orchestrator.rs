//! Filter pass
//!
//! One pass evaluates every active rule against every card the page's
//! adapters discover, then marks the survivors as checked and publishes the
//! hidden count. Running a pass again on an unchanged page changes nothing.

use crate::adapters::{CollapseGroup, SiteAdapter};
use crate::dom::Dom;
use crate::hide::HideEngine;
use crate::matcher::match_card;
use crate::notify::CountNotifier;
use crate::state::FilterState;
use crate::style::{COLLAPSED_ATTR, PENDING_CLASS};
use crate::types::HideOutcome;

/// What a pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// False when filtering was off and the pass exited early
    pub ran: bool,
    /// Cards discovered across all active adapters
    pub cards: usize,
    pub newly_hidden: usize,
    pub merged: usize,
    pub collapsed: usize,
    /// Matches that landed on page chrome
    pub refused: usize,
    /// Empty placeholders newly swept out of view
    pub swept: usize,
    pub hidden_count: usize,
    /// Host should re-dispatch a resize so grids close their gaps
    pub needs_relayout: bool,
}

struct Plan<A, N> {
    adapter: A,
    cards: Vec<N>,
    groups: Vec<CollapseGroup<N>>,
}

/// Run one pass. `forced` ignores the global and site toggles; the page must
/// still have adapters.
pub fn run_pass<D, N>(
    dom: &mut D,
    state: &mut FilterState,
    engine: &HideEngine,
    notifier: &N,
    forced: bool,
) -> PassReport
where
    D: Dom + ?Sized,
    N: CountNotifier + ?Sized,
{
    let adapters = state.adapters();
    let active = if forced {
        !adapters.is_empty()
    } else {
        state.is_filtering()
    };
    if !active {
        if let Some(body) = dom.body() {
            dom.remove_class(&body, PENDING_CLASS);
        }
        return PassReport {
            hidden_count: state.hidden_count,
            ..PassReport::default()
        };
    }

    let plans: Vec<Plan<_, D::Node>> = adapters
        .into_iter()
        .map(|adapter| {
            let cards = adapter.discover_cards(&*dom);
            let groups = adapter.collapse_groups(&*dom, &cards);
            Plan { adapter, cards, groups }
        })
        .collect();

    let mut report = PassReport {
        ran: true,
        cards: plans.iter().map(|plan| plan.cards.len()).sum(),
        ..PassReport::default()
    };

    let husks: Vec<D::Node> = plans.iter().flat_map(|plan| plan.adapter.husks(&*dom)).collect();
    report.swept = engine.sweep(dom, &husks);

    for rule in state.rules.active() {
        for plan in &plans {
            for card in &plan.cards {
                // Already covered by a hidden ancestor. A target that is
                // itself hidden is still evaluated so later words merge in.
                let target = plan.adapter.hide_target(&*dom, card);
                if engine.inside_hidden(&*dom, &target) && !engine.is_hidden(&*dom, &target) {
                    continue;
                }
                let hit = match match_card(rule, &plan.adapter, &*dom, card) {
                    Some(hit) => hit,
                    None => continue,
                };
                match engine.hide(dom, &target, &hit.raw_line, hit.field) {
                    HideOutcome::Hidden => report.newly_hidden += 1,
                    HideOutcome::Merged => report.merged += 1,
                    HideOutcome::Refused => report.refused += 1,
                    HideOutcome::Unchanged => {}
                }
            }

            for group in &plan.groups {
                if engine.is_hidden(&*dom, &group.container) || engine.inside_hidden(&*dom, &group.container) {
                    continue;
                }
                if members_hidden(&*dom, engine, &group.members)
                    && engine.collapse(dom, &group.container, rule.raw_line()) == HideOutcome::Hidden
                {
                    report.collapsed += 1;
                }
            }
        }
    }

    for plan in &plans {
        for card in &plan.cards {
            if !engine.is_hidden(&*dom, card) && !engine.inside_hidden(&*dom, card) {
                engine.mark_checked(dom, card);
            }
        }
    }

    report.hidden_count = engine.hidden_count(&*dom);
    report.needs_relayout = state.page.needs_relayout();
    state.hidden_count = report.hidden_count;
    publish_count(notifier, report.hidden_count);

    log::debug!(
        "filter pass on {}: {} cards, {} hidden ({} new, {} merged, {} collapsed, {} refused), {} swept",
        state.page.page_type,
        report.cards,
        report.hidden_count,
        report.newly_hidden,
        report.merged,
        report.collapsed,
        report.refused,
        report.swept,
    );
    report
}

/// Whether every sub-card that still has content is hidden. Swept husks do
/// not hold a container open, but a group of nothing but husks never
/// collapses.
fn members_hidden<D: Dom + ?Sized>(dom: &D, engine: &HideEngine, members: &[D::Node]) -> bool {
    let mut live = members.iter().filter(|m| !engine.is_swept(dom, m)).peekable();
    live.peek().is_some() && live.all(|m| engine.is_hidden(dom, m))
}

/// Best-effort count delivery.
pub fn publish_count<N: CountNotifier + ?Sized>(notifier: &N, count: usize) {
    if let Err(err) = notifier.notify_hidden_count(count) {
        log::debug!("hidden count not delivered: {err}");
    }
}

/// Delete `words` from every hidden element on the page, then drop collapse
/// words from containers that would otherwise hide visible sub-cards.
/// Returns how many elements lost a word.
pub fn remove_words<D: Dom + ?Sized>(
    dom: &mut D,
    state: &FilterState,
    engine: &HideEngine,
    words: &[String],
) -> usize {
    if words.is_empty() {
        return 0;
    }
    let mut touched = 0;
    for node in engine.hidden_cards(&*dom) {
        for word in words {
            if engine.remove_word(dom, &node, word) {
                touched += 1;
            }
        }
    }
    audit_collapsed(dom, state, engine);
    touched
}

/// Un-collapse containers whose sub-cards are no longer all hidden. Returns
/// how many containers changed.
pub fn audit_collapsed<D: Dom + ?Sized>(dom: &mut D, state: &FilterState, engine: &HideEngine) -> usize {
    let mut changed = 0;
    for adapter in state.adapters() {
        let cards = adapter.discover_cards(&*dom);
        for group in adapter.collapse_groups(&*dom, &cards) {
            let trigger = match dom.attribute(&group.container, COLLAPSED_ATTR) {
                Some(trigger) => trigger,
                None => continue,
            };
            if members_hidden(&*dom, engine, &group.members) {
                continue;
            }
            if engine.remove_word(dom, &group.container, &trigger) {
                changed += 1;
            }
        }
    }
    changed
}
