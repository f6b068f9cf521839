//! Compiled block-list rules
//!
//! A rule keeps the exact block-list line it came from. That line is the key
//! used to merge matches on a card and to delete the word again later.

use regex::{Regex, RegexBuilder};

use crate::types::{Field, RuleOptions};

/// Error raised while compiling a rule pattern.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuleError {
    #[error("invalid regex in '{line}': {source}")]
    InvalidRegex {
        line: String,
        #[source]
        source: regex::Error,
    },
    #[error("empty pattern in '{line}'")]
    EmptyPattern { line: String },
}

impl RuleError {
    pub fn line(&self) -> &str {
        match self {
            RuleError::InvalidRegex { line, .. } | RuleError::EmptyPattern { line } => line,
        }
    }
}

/// Matchable text of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSpec {
    /// Case-insensitive substring
    Literal(String),
    /// Case-insensitive regular expression source
    Regex(String),
}

impl PatternSpec {
    pub fn text(&self) -> &str {
        match self {
            PatternSpec::Literal(text) | PatternSpec::Regex(text) => text,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, PatternSpec::Regex(_))
    }

    /// Regex source used for matching. Literals are escaped so both variants
    /// go through the same engine.
    pub fn regex_source(&self) -> String {
        match self {
            PatternSpec::Literal(text) => regex::escape(text),
            PatternSpec::Regex(source) => source.clone(),
        }
    }
}

/// One parsed block-list entry.
#[derive(Debug, Clone)]
pub struct Rule {
    raw_line: String,
    pattern: PatternSpec,
    options: RuleOptions,
    compiled: Option<Regex>,
}

impl Rule {
    /// Compile a rule. A pattern that fails to compile still produces a rule,
    /// one that never matches, together with the error.
    pub fn compile(raw_line: &str, pattern: PatternSpec, options: RuleOptions) -> (Self, Option<RuleError>) {
        let (compiled, error) = if pattern.text().is_empty() {
            (None, Some(RuleError::EmptyPattern { line: raw_line.to_string() }))
        } else {
            match RegexBuilder::new(&pattern.regex_source())
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => (Some(regex), None),
                Err(source) => (
                    None,
                    Some(RuleError::InvalidRegex {
                        line: raw_line.to_string(),
                        source,
                    }),
                ),
            }
        };

        let rule = Self {
            raw_line: raw_line.to_string(),
            pattern,
            options,
            compiled,
        };
        (rule, error)
    }

    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    pub fn pattern(&self) -> &PatternSpec {
        &self.pattern
    }

    pub fn options(&self) -> RuleOptions {
        self.options
    }

    pub fn suppresses(&self, field: Field) -> bool {
        self.options.suppresses(field)
    }

    /// False for placeholder rules built from malformed lines.
    pub fn is_valid(&self) -> bool {
        self.compiled.is_some()
    }

    #[inline]
    pub fn is_match(&self, text: &str) -> bool {
        match &self.compiled {
            Some(regex) => regex.is_match(text),
            None => false,
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.raw_line == other.raw_line
    }
}

impl Eq for Rule {}
