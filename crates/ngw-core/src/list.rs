//! Block-list text editing
//!
//! The persisted list is plain text, one entry per line. Writes collapse
//! duplicate lines while keeping first-seen order.

use std::collections::HashSet;

use crate::types::RuleOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
}

/// Build an entry from selected text and the options ticked by the user.
pub fn format_entry(text: &str, options: RuleOptions) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let names = options.names();
    if names.is_empty() {
        Some(text.to_string())
    } else {
        Some(format!("{}[{}]", text, names.join(",")))
    }
}

/// Append an entry and collapse duplicates.
pub fn append_entry(list: &str, entry: &str) -> String {
    let mut combined = String::with_capacity(list.len() + entry.len() + 1);
    combined.push_str(list);
    if !list.is_empty() {
        combined.push('\n');
    }
    combined.push_str(entry);
    dedupe_lines(&combined).0
}

/// Drop every line whose trimmed value equals the trimmed word.
pub fn remove_entry(list: &str, word: &str) -> String {
    let word = word.trim();
    list.split('\n')
        .filter(|line| line.trim() != word)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse duplicate lines, keeping the first occurrence.
pub fn dedupe_lines(list: &str) -> (String, DedupeStats) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept = Vec::new();
    let mut before = 0usize;

    for line in list.split('\n') {
        before += 1;
        if seen.insert(line) {
            kept.push(line);
        }
    }

    let after = kept.len();
    let stats = DedupeStats {
        before,
        after,
        deduped: before - after,
    };
    (kept.join("\n"), stats)
}

/// Lines of `old` that are no longer present in `new`.
pub fn removed_lines<'a>(old: &'a str, new: &str) -> Vec<&'a str> {
    let current: HashSet<&str> = new.lines().collect();
    let mut seen = HashSet::new();
    old.lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !current.contains(line))
        .filter(|line| seen.insert(*line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_entry_with_options() {
        let opts = RuleOptions::REGEX | RuleOptions::NO_DESC;
        assert_eq!(format_entry("  spam \n", opts).as_deref(), Some("spam[nodesc,regex]"));
        assert_eq!(format_entry("spam", RuleOptions::empty()).as_deref(), Some("spam"));
        assert_eq!(format_entry("   ", opts), None);
    }

    #[test]
    fn append_collapses_duplicates() {
        assert_eq!(append_entry("", "foo"), "foo");
        assert_eq!(append_entry("foo\nbar", "baz"), "foo\nbar\nbaz");
        assert_eq!(append_entry("foo\nbar", "foo"), "foo\nbar");
    }

    #[test]
    fn remove_matches_trimmed_lines() {
        assert_eq!(remove_entry("foo\n bar \nbaz", "bar"), "foo\nbaz");
        assert_eq!(remove_entry("foo[nosite]\nfoo", "foo[nosite]"), "foo");
    }

    #[test]
    fn dedupe_reports_stats() {
        let (text, stats) = dedupe_lines("a\nb\na\nc\nb");
        assert_eq!(text, "a\nb\nc");
        assert_eq!(stats.before, 5);
        assert_eq!(stats.after, 3);
        assert_eq!(stats.deduped, 2);
    }

    #[test]
    fn removed_lines_lists_dropped_entries() {
        let removed = removed_lines("a\nb\n\nc[regex]", "a\nc");
        assert_eq!(removed, vec!["b", "c[regex]"]);
    }
}
