//! Block-list parser
//!
//! Turns the persisted newline-separated block list into a [`RuleSet`].
//! Each line is `text` optionally followed by an `[opt,opt]` suffix made of
//! lowercase letters and commas.

use std::collections::HashSet;

use crate::rule::{PatternSpec, Rule, RuleError};
use crate::types::RuleOptions;

/// Parse one block-list line.
///
/// Returns the rule and, for malformed patterns, the compile error. The rule
/// is still usable: it simply never matches.
pub fn parse_line(line: &str) -> (Rule, Option<RuleError>) {
    let (text, options) = match split_option_suffix(line) {
        Some((text, suffix)) => (text, parse_options(suffix)),
        None => (line, RuleOptions::empty()),
    };

    let pattern = if options.contains(RuleOptions::REGEX) {
        PatternSpec::Regex(text.to_string())
    } else {
        PatternSpec::Literal(text.to_string())
    };

    Rule::compile(line, pattern, options)
}

/// Split `text[opts]` into `("text", "opts")`. The suffix must be anchored at
/// the very end and contain only `a-z` and `,`.
pub fn split_option_suffix(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let inner = &body[open + 1..];
    if !inner.bytes().all(|b| b.is_ascii_lowercase() || b == b',') {
        return None;
    }
    Some((&line[..open], inner))
}

fn parse_options(text: &str) -> RuleOptions {
    let mut options = RuleOptions::empty();
    for raw in text.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        if let Some(opt) = RuleOptions::from_option(name) {
            options |= opt;
        }
    }
    options
}

// =============================================================================
// Rule Set
// =============================================================================

/// A line that could not become a working rule.
#[derive(Debug, Clone)]
pub struct RuleDiagnostic {
    pub line: String,
    pub error: RuleError,
}

/// Ordered rules deduplicated by raw line.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    diagnostics: Vec<RuleDiagnostic>,
    lines_seen: usize,
}

impl RuleSet {
    /// Build the full rule set from persisted block-list text.
    pub fn parse(text: &str) -> Self {
        let mut rules = Vec::new();
        let mut diagnostics = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut lines_seen = 0usize;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            lines_seen += 1;
            if !seen.insert(line) {
                continue;
            }

            let (rule, error) = parse_line(line);
            if let Some(error) = error {
                diagnostics.push(RuleDiagnostic {
                    line: line.to_string(),
                    error,
                });
            }
            rules.push(rule);
        }

        Self {
            rules,
            diagnostics,
            lines_seen,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules that can actually match.
    pub fn active(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.is_valid())
    }

    pub fn get(&self, raw_line: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.raw_line() == raw_line)
    }

    pub fn contains(&self, raw_line: &str) -> bool {
        self.get(raw_line).is_some()
    }

    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.raw_line())
    }

    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        &self.diagnostics
    }

    /// Non-blank lines read, duplicates included.
    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
