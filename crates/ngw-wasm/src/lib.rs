//! WebAssembly bindings for the NG word filter content script
//!
//! The JS side owns the MutationObserver, `setTimeout` and the storage and
//! message listeners. It forwards each event to a [`ContentFilter`] and runs
//! whatever timer requests come back.

use js_sys::{Array, Function, Object, Reflect};
use ngw_core::orchestrator::PassReport;
use ngw_core::{
    badge_text, CountNotifier, Dom, FilterSession, NotifyError, RuleOptions, StorageChanges, StoredConfig,
    TimerKind, TimerRequest, Tuning,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node};

// =============================================================================
// Live Document
// =============================================================================

/// [`Dom`] over the page the content script runs in.
pub struct BrowserDom {
    document: Document,
}

impl BrowserDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn current() -> Option<Self> {
        web_sys::window().and_then(|w| w.document()).map(Self::new)
    }
}

fn as_element(node: &Node) -> Option<&Element> {
    node.dyn_ref::<Element>()
}

impl Dom for BrowserDom {
    type Node = Node;

    fn document_element(&self) -> Option<Node> {
        self.document.document_element().map(Into::into)
    }

    fn body(&self) -> Option<Node> {
        self.document.body().map(Into::into)
    }

    fn parent_element(&self, node: &Node) -> Option<Node> {
        node.parent_element().map(Into::into)
    }

    fn child_nodes(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        as_element(node).map(|el| el.tag_name().to_ascii_lowercase())
    }

    fn text_value(&self, node: &Node) -> Option<String> {
        if node.node_type() == Node::TEXT_NODE {
            node.node_value()
        } else {
            None
        }
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        as_element(node).and_then(|el| el.get_attribute(name))
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        as_element(node).is_some_and(|el| el.class_list().contains(class))
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) {
        if let Some(el) = as_element(node) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, node: &Node, name: &str) {
        if let Some(el) = as_element(node) {
            let _ = el.remove_attribute(name);
        }
    }

    fn add_class(&mut self, node: &Node, class: &str) {
        if let Some(el) = as_element(node) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, node: &Node, class: &str) {
        if let Some(el) = as_element(node) {
            let list = el.class_list();
            let _ = list.remove_1(class);
            if list.length() == 0 {
                let _ = el.remove_attribute("class");
            }
        }
    }
}

// =============================================================================
// Host Callbacks
// =============================================================================

/// Forwards hidden counts to a JS callback, usually one that messages the
/// background page.
pub struct JsNotifier {
    callback: Option<Function>,
}

impl CountNotifier for JsNotifier {
    fn notify_hidden_count(&self, count: usize) -> Result<(), NotifyError> {
        let callback = self.callback.as_ref().ok_or(NotifyError::Disconnected)?;
        callback
            .call1(&JsValue::NULL, &JsValue::from(count as u32))
            .map(|_| ())
            .map_err(|e| NotifyError::Failed(format!("{e:?}")))
    }
}

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[ngw4b] {}", record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Route `log` output to the browser console. `level` is a `log` level name;
/// unknown names mean `warn`. Calling it twice only changes the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    let level = level.parse().unwrap_or(log::LevelFilter::Warn);
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

#[wasm_bindgen]
pub fn badge_label(enabled: bool, count: u32) -> String {
    badge_text(enabled, count as usize)
}

// =============================================================================
// Content Filter
// =============================================================================

#[wasm_bindgen]
pub struct ContentFilter {
    session: FilterSession<JsNotifier>,
    dom: BrowserDom,
}

#[wasm_bindgen]
impl ContentFilter {
    /// `config_json` is the synced storage snapshot, `tuning_json` optional
    /// timing overrides.
    #[wasm_bindgen(constructor)]
    pub fn new(
        url: &str,
        config_json: &str,
        tuning_json: Option<String>,
        on_count: Option<Function>,
    ) -> Result<ContentFilter, JsValue> {
        let config = StoredConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(|e| JsValue::from_str(&format!("Invalid tuning: {e}")))?,
            None => Tuning::default(),
        };
        let dom = BrowserDom::current().ok_or_else(|| JsValue::from_str("No document available"))?;
        let notifier = JsNotifier { callback: on_count };
        Ok(ContentFilter {
            session: FilterSession::new(url, config, tuning, notifier),
            dom,
        })
    }

    /// Stylesheet to inject before the first pass.
    pub fn stylesheet(&self) -> String {
        self.session.stylesheet()
    }

    /// Returns `{ report, flicker }`; `flicker` is a timer request or null.
    pub fn start(&mut self) -> JsValue {
        let started = self.session.start(&mut self.dom);
        let result = Object::new();
        let _ = Reflect::set(&result, &"report".into(), &report_object(&started.report));
        let _ = Reflect::set(
            &result,
            &"flicker".into(),
            &started.flicker.map(timer_object).unwrap_or(JsValue::NULL),
        );
        result.into()
    }

    /// Returns a timer request or null.
    #[wasm_bindgen(js_name = onMutations)]
    pub fn on_mutations(&mut self, added: u32) -> JsValue {
        self.session
            .on_mutations(added as usize)
            .map(timer_object)
            .unwrap_or(JsValue::NULL)
    }

    /// Returns a pass report or null.
    #[wasm_bindgen(js_name = onTimer)]
    pub fn on_timer(&mut self, kind: &str, token: f64) -> JsValue {
        let kind = match kind {
            "pass" => TimerKind::Pass,
            "flicker" => TimerKind::FlickerRelease,
            _ => return JsValue::NULL,
        };
        let request = TimerRequest {
            kind,
            token: token as u64,
            delay_ms: 0,
        };
        self.session
            .on_timer(&mut self.dom, request)
            .map(|report| report_object(&report))
            .unwrap_or(JsValue::NULL)
    }

    /// `changes_json` is the `storage.onChanged` payload.
    #[wasm_bindgen(js_name = applyChanges)]
    pub fn apply_changes(&mut self, changes_json: &str) -> Result<JsValue, JsValue> {
        let changes = StorageChanges::from_json(changes_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let report = self
            .session
            .apply_changes(&mut self.dom, &changes)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(report.map(|r| report_object(&r)).unwrap_or(JsValue::NULL))
    }

    /// Returns the list text to persist, or undefined for a blank selection.
    #[wasm_bindgen(js_name = addRule)]
    pub fn add_rule(&mut self, text: &str, regex: bool, notitle: bool, nosite: bool, nodesc: bool) -> Option<String> {
        let mut options = RuleOptions::empty();
        options.set(RuleOptions::REGEX, regex);
        options.set(RuleOptions::NO_TITLE, notitle);
        options.set(RuleOptions::NO_SITE, nosite);
        options.set(RuleOptions::NO_DESC, nodesc);
        self.session.add_rule(&mut self.dom, text, options)
    }

    #[wasm_bindgen(js_name = deleteWord)]
    pub fn delete_word(&mut self, raw_line: &str) -> String {
        self.session.delete_word(&mut self.dom, raw_line)
    }

    #[wasm_bindgen(js_name = setRevealed)]
    pub fn set_revealed(&mut self, revealed: bool) {
        self.session.set_revealed(&mut self.dom, revealed);
    }

    #[wasm_bindgen(js_name = hiddenCount)]
    pub fn hidden_count(&self) -> u32 {
        self.session.hidden_count() as u32
    }

    /// `{ words, field, collapsedBy, annotate }` for a hidden element, else null.
    pub fn inspect(&self, element: &Element) -> JsValue {
        let node: &Node = element.as_ref();
        let engine = self.session.engine();
        let inspection = match engine.inspect(&self.dom, node) {
            Some(inspection) => inspection,
            None => return JsValue::NULL,
        };
        let words = Array::new();
        for word in &inspection.words {
            words.push(&JsValue::from_str(word));
        }
        let result = Object::new();
        let _ = Reflect::set(&result, &"words".into(), &words);
        let _ = Reflect::set(
            &result,
            &"field".into(),
            &inspection.field.map(|f| JsValue::from_str(f.as_str())).unwrap_or(JsValue::NULL),
        );
        let _ = Reflect::set(
            &result,
            &"collapsedBy".into(),
            &inspection.collapsed_by.map(|w| JsValue::from_str(&w)).unwrap_or(JsValue::NULL),
        );
        let _ = Reflect::set(
            &result,
            &"annotate".into(),
            &JsValue::from(engine.should_annotate(&self.dom, node)),
        );
        result.into()
    }

    /// Malformed block-list lines as `{ line, error }`.
    pub fn diagnostics(&self) -> Array {
        let out = Array::new();
        for diagnostic in self.session.diagnostics() {
            let entry = Object::new();
            let _ = Reflect::set(&entry, &"line".into(), &JsValue::from_str(&diagnostic.line));
            let _ = Reflect::set(&entry, &"error".into(), &JsValue::from_str(&diagnostic.error.to_string()));
            out.push(&entry);
        }
        out
    }

    /// True when the host should tell the user; only the first failure is.
    #[wasm_bindgen(js_name = reportStoreFailure)]
    pub fn report_store_failure(&mut self, error: &str) -> bool {
        self.session.report_store_failure(error)
    }

    pub fn teardown(&mut self) {
        self.session.teardown(&mut self.dom);
    }
}

fn timer_object(request: TimerRequest) -> JsValue {
    let kind = match request.kind {
        TimerKind::Pass => "pass",
        TimerKind::FlickerRelease => "flicker",
    };
    let result = Object::new();
    let _ = Reflect::set(&result, &"kind".into(), &JsValue::from_str(kind));
    let _ = Reflect::set(&result, &"token".into(), &JsValue::from(request.token as f64));
    let _ = Reflect::set(&result, &"delayMs".into(), &JsValue::from(request.delay_ms as f64));
    result.into()
}

fn report_object(report: &PassReport) -> JsValue {
    let result = Object::new();
    let _ = Reflect::set(&result, &"ran".into(), &JsValue::from(report.ran));
    let _ = Reflect::set(&result, &"cards".into(), &JsValue::from(report.cards as u32));
    let _ = Reflect::set(&result, &"newlyHidden".into(), &JsValue::from(report.newly_hidden as u32));
    let _ = Reflect::set(&result, &"merged".into(), &JsValue::from(report.merged as u32));
    let _ = Reflect::set(&result, &"collapsed".into(), &JsValue::from(report.collapsed as u32));
    let _ = Reflect::set(&result, &"refused".into(), &JsValue::from(report.refused as u32));
    let _ = Reflect::set(&result, &"swept".into(), &JsValue::from(report.swept as u32));
    let _ = Reflect::set(&result, &"hiddenCount".into(), &JsValue::from(report.hidden_count as u32));
    let _ = Reflect::set(&result, &"needsRelayout".into(), &JsValue::from(report.needs_relayout));
    result.into()
}
