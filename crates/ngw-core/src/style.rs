//! Marker names and the injected stylesheet
//!
//! Hidden state lives on the page itself as classes and `data-` attributes,
//! so the stylesheet can suppress cards without the engine touching layout.

use std::fmt::Write as _;

use crate::selector::SelectorList;

/// Class marking a hidden card.
pub const HIDDEN_CLASS: &str = "ngw4b_hidden";
/// Body class enabling reveal mode.
pub const REVEALED_CLASS: &str = "ngw4b_revealed";
/// Body class active during the flicker-prevention window.
pub const PENDING_CLASS: &str = "ngw4b_pending";
/// Empty placeholder left behind by the page's own relayout.
pub const EMPTY_CLASS: &str = "ngw4b_empty";

/// Matched rule lines, newline separated.
pub const WORD_ATTR: &str = "data-ngw4b-word";
/// Field of the first match.
pub const FIELD_ATTR: &str = "data-ngw4b-field";
/// Label text shown in reveal mode.
pub const LABEL_ATTR: &str = "data-ngw4b-label";
/// Rule line that collapsed a carousel container.
pub const COLLAPSED_ATTR: &str = "data-ngw4b-collapsed";
/// Card evaluated clean.
pub const CHECKED_ATTR: &str = "data-ngw4b-checked";
/// Cached tooltip position, written by the UI layer.
pub const TIP_X_ATTR: &str = "data-ngw4b-tipx";
pub const TIP_Y_ATTR: &str = "data-ngw4b-tipy";

/// Separator between rule lines in [`WORD_ATTR`].
pub const WORD_SEPARATOR: char = '\n';

/// Stylesheet for hiding, reveal mode and the flicker window.
///
/// `candidates` are the card selectors of the active adapters; unevaluated
/// candidates stay invisible while the body carries [`PENDING_CLASS`].
pub fn stylesheet(candidates: &SelectorList) -> String {
    let mut css = String::new();
    let _ = writeln!(css, "body:not(.{REVEALED_CLASS}) .{HIDDEN_CLASS} {{ display: none !important; }}");
    let _ = writeln!(css, ".{EMPTY_CLASS} {{ display: none !important; }}");
    let _ = writeln!(
        css,
        ".{REVEALED_CLASS} .{HIDDEN_CLASS} {{ opacity: 0.8 !important; position: relative; cursor: help; min-height: 20px; }}"
    );
    let _ = writeln!(
        css,
        ".{REVEALED_CLASS} .{HIDDEN_CLASS}::after {{ content: \"\"; position: absolute; inset: 0; outline: 2px dashed #ff0000; pointer-events: none; }}"
    );
    let _ = writeln!(
        css,
        ".{REVEALED_CLASS} .{HIDDEN_CLASS}::before {{ content: attr({LABEL_ATTR}); position: absolute; top: 0; left: 0; pointer-events: none; }}"
    );
    // An ancestor containing a hidden card must not draw a second frame or label.
    let _ = writeln!(
        css,
        ".{REVEALED_CLASS} .{HIDDEN_CLASS}:has(.{HIDDEN_CLASS})::after, .{REVEALED_CLASS} .{HIDDEN_CLASS}:has(.{HIDDEN_CLASS})::before {{ display: none; }}"
    );

    if !candidates.is_empty() {
        let pending: Vec<String> = candidates
            .iter()
            .map(|sel| format!("body.{PENDING_CLASS} {sel}:not([{CHECKED_ATTR}]):not(.{HIDDEN_CLASS})"))
            .collect();
        let _ = writeln!(css, "{} {{ visibility: hidden !important; }}", pending.join(", "));
    }
    css
}
