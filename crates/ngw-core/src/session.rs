//! Per-page filter session
//!
//! Owns everything one content-script instance needs: settings, parsed
//! rules, the hide engine and the pass scheduler. The host forwards page
//! events (mutations, timers, storage changes, menu commands) and executes
//! the timer requests it gets back.

use std::collections::HashSet;

use crate::adapters::candidate_selectors;
use crate::config::{ConfigError, StorageChanges, StoredConfig, Tuning};
use crate::dom::Dom;
use crate::hide::HideEngine;
use crate::list;
use crate::notify::CountNotifier;
use crate::orchestrator::{publish_count, remove_words, run_pass, PassReport};
use crate::page::PageContext;
use crate::parser::{RuleDiagnostic, RuleSet};
use crate::scheduler::{PassScheduler, TimerKind, TimerRequest};
use crate::state::FilterState;
use crate::style::{stylesheet, PENDING_CLASS, REVEALED_CLASS};
use crate::types::RuleOptions;

/// Result of [`FilterSession::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub report: PassReport,
    /// Safety timer that ends the flicker window
    pub flicker: Option<TimerRequest>,
}

pub struct FilterSession<N: CountNotifier> {
    config: StoredConfig,
    tuning: Tuning,
    state: FilterState,
    engine: HideEngine,
    scheduler: PassScheduler,
    notifier: N,
    reported: HashSet<String>,
    store_failure_reported: bool,
}

impl<N: CountNotifier> FilterSession<N> {
    pub fn new(url: &str, config: StoredConfig, tuning: Tuning, notifier: N) -> Self {
        let state = FilterState::new(PageContext::from_url(url), &config);
        let mut session = Self {
            engine: HideEngine::new(tuning.label.clone()),
            scheduler: PassScheduler::new(tuning.debounce_ms),
            config,
            tuning,
            state,
            notifier,
            reported: HashSet::new(),
            store_failure_reported: false,
        };
        session.report_diagnostics();
        session
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn config(&self) -> &StoredConfig {
        &self.config
    }

    pub fn engine(&self) -> &HideEngine {
        &self.engine
    }

    pub fn block_list(&self) -> &str {
        &self.config.block_list
    }

    pub fn hidden_count(&self) -> usize {
        self.state.hidden_count
    }

    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        self.state.rules.diagnostics()
    }

    /// Distinct malformed lines logged so far.
    pub fn reported_diagnostics(&self) -> usize {
        self.reported.len()
    }

    /// Stylesheet to inject for this page's adapters.
    pub fn stylesheet(&self) -> String {
        stylesheet(&candidate_selectors(&self.state.adapters()))
    }

    // =========================================================================
    // Page Events
    // =========================================================================

    /// First pass after page load. Opens the flicker window when filtering.
    pub fn start<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Started {
        let flicker = if self.state.is_filtering() {
            if let Some(body) = dom.body() {
                dom.add_class(&body, PENDING_CLASS);
            }
            Some(self.scheduler.start_flicker(self.tuning.flicker_window_ms))
        } else {
            None
        };
        let report = self.run(dom, false);
        Started { report, flicker }
    }

    /// Nodes were added to the page. Removals never schedule a pass.
    pub fn on_mutations(&mut self, added: usize) -> Option<TimerRequest> {
        if added == 0 || !self.state.is_filtering() || self.scheduler.in_pass() {
            return None;
        }
        self.scheduler.debounce()
    }

    /// A timer requested earlier has fired. Stale requests do nothing.
    pub fn on_timer<D: Dom + ?Sized>(&mut self, dom: &mut D, request: TimerRequest) -> Option<PassReport> {
        match request.kind {
            TimerKind::Pass => {
                if self.scheduler.fire(request.token) {
                    Some(self.run(dom, false))
                } else {
                    None
                }
            }
            TimerKind::FlickerRelease => {
                if self.scheduler.release_flicker(request.token) {
                    remove_body_class(dom, PENDING_CLASS);
                }
                None
            }
        }
    }

    /// Fold a storage change into the session. Turning filtering off reverts
    /// the page at once; any other relevant change re-runs the pass right away.
    pub fn apply_changes<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        changes: &StorageChanges,
    ) -> Result<Option<PassReport>, ConfigError> {
        let mut next = self.config.clone();
        let touched = next.apply(changes)?;
        if !touched.any() {
            return Ok(None);
        }

        let was_filtering = self.state.is_filtering();
        let old_adapters = self.state.adapters();
        let old_list = std::mem::replace(&mut self.config, next).block_list;
        self.state.sync(&self.config);

        if touched.list {
            self.reload_rules();
            let removed: Vec<String> = list::removed_lines(&old_list, &self.config.block_list)
                .into_iter()
                .map(str::to_string)
                .collect();
            if !removed.is_empty() {
                remove_words(dom, &self.state, &self.engine, &removed);
                self.recount(dom);
            }
        }

        let filtering = self.state.is_filtering();
        if was_filtering && !filtering {
            self.disable(dom);
            return Ok(None);
        }
        if !filtering {
            return Ok(None);
        }
        if was_filtering && self.state.adapters() != old_adapters {
            // Cards of adapters that were switched off must come back
            self.engine.revert_all(dom);
        }
        self.scheduler.cancel();
        Ok(Some(self.run(dom, false)))
    }

    /// Add a rule from selected text. Returns the new list text to persist,
    /// or `None` when the selection was blank.
    pub fn add_rule<D: Dom + ?Sized>(&mut self, dom: &mut D, text: &str, options: RuleOptions) -> Option<String> {
        let entry = list::format_entry(text, options)?;
        self.config.block_list = list::append_entry(&self.config.block_list, &entry);
        self.reload_rules();

        if self.state.is_filtering() || self.state.revealed {
            self.scheduler.cancel();
            let forced = self.state.revealed;
            self.run(dom, forced);
        }
        Some(self.config.block_list.clone())
    }

    /// Delete a block-list line and its word from every hidden card. Returns
    /// the new list text to persist.
    pub fn delete_word<D: Dom + ?Sized>(&mut self, dom: &mut D, raw_line: &str) -> String {
        self.config.block_list = list::remove_entry(&self.config.block_list, raw_line);
        self.reload_rules();
        remove_words(dom, &self.state, &self.engine, &[raw_line.to_string()]);
        self.recount(dom);
        self.config.block_list.clone()
    }

    pub fn set_revealed<D: Dom + ?Sized>(&mut self, dom: &mut D, revealed: bool) {
        self.state.revealed = revealed;
        if let Some(body) = dom.body() {
            if revealed {
                dom.add_class(&body, REVEALED_CLASS);
            } else {
                dom.remove_class(&body, REVEALED_CLASS);
            }
        }
    }

    /// Log a failed list write. True only for the first failure of the
    /// session, so the host surfaces it to the user once.
    pub fn report_store_failure(&mut self, error: &str) -> bool {
        if self.store_failure_reported {
            log::debug!("block list write failed again: {error}");
            return false;
        }
        self.store_failure_reported = true;
        log::warn!("block list could not be saved: {error}");
        true
    }

    /// Page is going away.
    pub fn teardown<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        self.scheduler.cancel();
        self.scheduler.end_flicker();
        remove_body_class(dom, PENDING_CLASS);
        remove_body_class(dom, REVEALED_CLASS);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn run<D: Dom + ?Sized>(&mut self, dom: &mut D, forced: bool) -> PassReport {
        if !self.scheduler.begin_pass() {
            return PassReport {
                hidden_count: self.state.hidden_count,
                ..PassReport::default()
            };
        }
        let report = run_pass(dom, &mut self.state, &self.engine, &self.notifier, forced);
        self.scheduler.end_pass();
        report
    }

    fn disable<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        self.scheduler.cancel();
        self.scheduler.end_flicker();
        remove_body_class(dom, PENDING_CLASS);
        let restored = self.engine.revert_all(dom);
        self.state.hidden_count = 0;
        publish_count(&self.notifier, 0);
        log::debug!("filtering turned off, {restored} cards restored");
    }

    fn recount<D: Dom + ?Sized>(&mut self, dom: &D) {
        self.state.hidden_count = self.engine.hidden_count(dom);
        publish_count(&self.notifier, self.state.hidden_count);
    }

    fn reload_rules(&mut self) {
        self.state.rules = RuleSet::parse(&self.config.block_list);
        self.report_diagnostics();
    }

    fn report_diagnostics(&mut self) {
        for diagnostic in self.state.rules.diagnostics() {
            if self.reported.insert(diagnostic.line.clone()) {
                log::warn!("ignoring block list entry: {}", diagnostic.error);
            }
        }
    }
}

fn remove_body_class<D: Dom + ?Sized>(dom: &mut D, class: &str) {
    if let Some(body) = dom.body() {
        dom.remove_class(&body, class);
    }
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::adapters::AdapterKind;
    use crate::config::{BING_KEY, LIST_KEY, STATUS_KEY};
    use crate::document::{Document, NodeId};
    use crate::notify::NotifyError;
    use crate::style::HIDDEN_CLASS;

    const URL: &str = "https://www.bing.com/search?q=x";

    const PAGE: &str = r#"<html><body><ol id="b_results">
        <li class="b_algo" id="a"><h2>Spam offer</h2><cite>spam.example</cite></li>
        <li class="b_algo" id="b"><h2>Useful page</h2><cite>good.example</cite><p>Ham recipe</p></li>
    </ol></body></html>"#;

    type Counts = Rc<RefCell<Vec<usize>>>;

    fn session(rules: &str) -> (FilterSession<impl CountNotifier>, Counts) {
        session_at(URL, rules)
    }

    fn session_at(url: &str, rules: &str) -> (FilterSession<impl CountNotifier>, Counts) {
        let counts: Counts = Rc::default();
        let sink = Rc::clone(&counts);
        let notifier = move |count: usize| -> Result<(), NotifyError> {
            sink.borrow_mut().push(count);
            Ok(())
        };
        let config = StoredConfig {
            block_list: rules.to_string(),
            ..StoredConfig::default()
        };
        (FilterSession::new(url, config, Tuning::default(), notifier), counts)
    }

    fn node(doc: &Document, id: &str) -> NodeId {
        doc.find_by_id(id).expect(id)
    }

    fn body_has(doc: &Document, class: &str) -> bool {
        doc.has_class(&doc.body().expect("body"), class)
    }

    #[test]
    fn start_opens_flicker_window_until_release() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, counts) = session("spam");

        let started = session.start(&mut doc);
        assert_eq!(started.report.hidden_count, 1);
        assert_eq!(*counts.borrow(), vec![1]);
        let flicker = started.flicker.expect("flicker timer");
        assert_eq!(flicker.delay_ms, 3000);
        assert!(body_has(&doc, PENDING_CLASS));

        let stale = TimerRequest {
            token: flicker.token + 100,
            ..flicker
        };
        assert_eq!(session.on_timer(&mut doc, stale), None);
        assert!(body_has(&doc, PENDING_CLASS));

        assert_eq!(session.on_timer(&mut doc, flicker), None);
        assert!(!body_has(&doc, PENDING_CLASS));
    }

    #[test]
    fn mutation_bursts_coalesce_into_one_pass() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, _) = session("spam");
        session.start(&mut doc);

        assert_eq!(session.on_mutations(0), None);
        let first = session.on_mutations(3).expect("scheduled");
        let second = session.on_mutations(1).expect("rescheduled");
        assert_eq!(second.delay_ms, 300);

        let list = node(&doc, "b_results");
        doc.append_html(list, r#"<li class="b_algo" id="late"><h2>More spam</h2></li>"#);

        assert_eq!(session.on_timer(&mut doc, first), None);
        let report = session.on_timer(&mut doc, second).expect("pass ran");
        assert_eq!(report.newly_hidden, 1);
        assert_eq!(session.hidden_count(), 2);
        assert!(doc.has_class(&node(&doc, "late"), HIDDEN_CLASS));
    }

    #[test]
    fn disabling_reverts_synchronously_and_cancels_pending() {
        let mut doc = Document::parse_html(PAGE);
        let pristine = doc.to_html();
        let (mut session, counts) = session("spam");
        session.start(&mut doc);
        let pending = session.on_mutations(1).expect("scheduled");

        let report = session
            .apply_changes(&mut doc, &StorageChanges::set(STATUS_KEY, json!(false)))
            .expect("apply");
        assert_eq!(report, None);
        assert_eq!(session.hidden_count(), 0);
        assert_eq!(counts.borrow().last(), Some(&0));
        assert_eq!(doc.to_html(), pristine);
        assert_eq!(session.on_timer(&mut doc, pending), None);
        assert_eq!(session.on_mutations(5), None);

        let report = session
            .apply_changes(&mut doc, &StorageChanges::set(STATUS_KEY, json!(true)))
            .expect("apply")
            .expect("re-ran");
        assert_eq!(report.hidden_count, 1);
    }

    #[test]
    fn site_toggle_for_this_site_reverts() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, _) = session("spam");
        session.start(&mut doc);
        session
            .apply_changes(&mut doc, &StorageChanges::set(BING_KEY, json!(false)))
            .expect("apply");
        assert!(!doc.has_class(&node(&doc, "a"), HIDDEN_CLASS));
        assert!(!session.state().is_filtering());
    }

    #[test]
    fn switching_an_adapter_off_restores_its_cards() {
        let mut doc = Document::parse_html(
            r#"<html><body><div id="rso">
                <div class="MjjYud" id="short"><span class="Yt787">Spam clip</span><span class="jSLaVc">Channel</span></div>
                <div class="MjjYud"><div class="g" id="web"><h3>Spam deals</h3><cite>deals.example</cite></div></div>
                <div class="MjjYud"><div class="g" id="clean"><h3>Useful page</h3><cite>good.example</cite></div></div>
            </div></body></html>"#,
        );
        let (mut session, counts) = session_at("https://www.google.com/search?q=x", "spam");
        let started = session.start(&mut doc);
        assert_eq!(started.report.hidden_count, 2);
        assert!(doc.has_class(&node(&doc, "short"), HIDDEN_CLASS));
        let pending = session.on_mutations(1).expect("scheduled");

        let report = session
            .apply_changes(&mut doc, &StorageChanges::set("google_shorts", json!(false)))
            .expect("apply")
            .expect("re-ran");
        assert!(session.state().is_filtering());
        assert_eq!(session.state().adapters(), vec![AdapterKind::GoogleMain]);

        let short = node(&doc, "short");
        assert!(!doc.has_class(&short, HIDDEN_CLASS));
        assert_eq!(session.engine().inspect(&doc, &short), None);
        assert!(doc.has_class(&node(&doc, "web"), HIDDEN_CLASS));
        assert_eq!(report.hidden_count, 1);
        assert_eq!(counts.borrow().last(), Some(&1));
        assert_eq!(session.on_timer(&mut doc, pending), None);

        // Turning it back on hides the clip again
        let report = session
            .apply_changes(&mut doc, &StorageChanges::set("google_shorts", json!(true)))
            .expect("apply")
            .expect("re-ran");
        assert_eq!(report.hidden_count, 2);
        assert!(doc.has_class(&node(&doc, "short"), HIDDEN_CLASS));
    }

    #[test]
    fn list_edits_apply_immediately() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, _) = session("spam");
        session.start(&mut doc);
        let pending = session.on_mutations(1).expect("scheduled");

        let report = session
            .apply_changes(&mut doc, &StorageChanges::set(LIST_KEY, json!("ham")))
            .expect("apply")
            .expect("ran");
        assert_eq!(report.hidden_count, 1);
        assert!(!doc.has_class(&node(&doc, "a"), HIDDEN_CLASS));
        assert!(doc.has_class(&node(&doc, "b"), HIDDEN_CLASS));
        // The immediate pass superseded the debounced one
        assert_eq!(session.on_timer(&mut doc, pending), None);
    }

    #[test]
    fn malformed_entry_is_reported_once() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, _) = session("([[oops[regex]\nspam");
        session.start(&mut doc);
        assert_eq!(session.diagnostics().len(), 1);
        assert_eq!(session.reported_diagnostics(), 1);

        session
            .apply_changes(
                &mut doc,
                &StorageChanges::set(LIST_KEY, json!("([[oops[regex]\nspam\nham")),
            )
            .expect("apply");
        assert_eq!(session.reported_diagnostics(), 1);
        assert_eq!(session.hidden_count(), 2);
    }

    #[test]
    fn add_rule_appends_and_runs() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, _) = session("spam");
        session.start(&mut doc);

        let list = session
            .add_rule(&mut doc, " recipe ", RuleOptions::NO_TITLE)
            .expect("entry");
        assert_eq!(list, "spam\nrecipe[notitle]");
        assert_eq!(session.hidden_count(), 2);

        assert_eq!(session.add_rule(&mut doc, "spam", RuleOptions::empty()).as_deref(), Some("spam\nrecipe[notitle]"));
        assert_eq!(session.add_rule(&mut doc, "   ", RuleOptions::empty()), None);
    }

    #[test]
    fn add_rule_in_reveal_mode_runs_even_when_disabled() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, _) = session("");
        session
            .apply_changes(&mut doc, &StorageChanges::set(STATUS_KEY, json!(false)))
            .expect("apply");
        session.set_revealed(&mut doc, true);
        assert!(body_has(&doc, REVEALED_CLASS));

        session.add_rule(&mut doc, "ham", RuleOptions::empty());
        assert!(doc.has_class(&node(&doc, "b"), HIDDEN_CLASS));
    }

    #[test]
    fn delete_word_restores_cards_and_returns_list() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, counts) = session("spam\nham");
        session.start(&mut doc);
        assert_eq!(session.hidden_count(), 2);

        let list = session.delete_word(&mut doc, "spam");
        assert_eq!(list, "ham");
        assert_eq!(session.hidden_count(), 1);
        assert_eq!(counts.borrow().last(), Some(&1));
        assert!(!doc.has_class(&node(&doc, "a"), HIDDEN_CLASS));
        assert!(!session.state().rules.contains("spam"));
    }

    #[test]
    fn store_failure_surfaces_once() {
        let (mut session, _) = session("");
        assert!(session.report_store_failure("quota exceeded"));
        assert!(!session.report_store_failure("quota exceeded"));
    }

    #[test]
    fn teardown_clears_body_classes() {
        let mut doc = Document::parse_html(PAGE);
        let (mut session, _) = session("spam");
        let started = session.start(&mut doc);
        session.set_revealed(&mut doc, true);
        session.teardown(&mut doc);
        assert!(!body_has(&doc, PENDING_CLASS));
        assert!(!body_has(&doc, REVEALED_CLASS));
        assert_eq!(session.on_timer(&mut doc, started.flicker.expect("flicker")), None);
    }

    #[test]
    fn stylesheet_targets_active_adapter_cards() {
        let (session, _) = session("");
        assert!(session.stylesheet().contains("body.ngw4b_pending li.b_algo:not([data-ngw4b-checked])"));
    }
}
