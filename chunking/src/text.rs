//! Text-level helpers the windowing algorithm slices on: whitespace
//! normalization, word boundaries (the only points a cut is ever allowed to
//! land on), and sentence boundaries (the points a cut prefers to land on).
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?](?:\s+|$)").expect("static regex"))
}

/// Collapses runs of 3+ newlines to a single blank line and strips trailing
/// whitespace from the whole document. Inline whitespace inside a line is
/// left untouched.
pub fn normalize_whitespace(text: &str) -> String {
    blank_run_re().replace_all(text, "\n\n").trim_end().to_string()
}

/// Byte offsets where a word starts: position 0, and every position right
/// after a run of whitespace. Always includes `text.len()` as a sentinel so
/// callers can treat it as a valid cut point (end of text).
pub fn word_boundaries(text: &str) -> Vec<usize> {
    let mut offsets = vec![0usize];
    let bytes = text.as_bytes();
    let mut in_whitespace = false;
    for (i, ch) in text.char_indices() {
        let is_ws = ch.is_whitespace();
        if in_whitespace && !is_ws {
            offsets.push(i);
        }
        in_whitespace = is_ws;
        let _ = bytes;
    }
    if offsets.last() != Some(&text.len()) {
        offsets.push(text.len());
    }
    offsets.dedup();
    offsets
}

/// Subset of [`word_boundaries`] that immediately follow a sentence
/// terminator (`.`, `!`, `?`) and trailing whitespace or end-of-text.
pub fn sentence_boundaries(text: &str, boundaries: &[usize]) -> HashSet<usize> {
    let valid: HashSet<usize> = boundaries.iter().copied().collect();
    let mut out = HashSet::new();
    for m in sentence_end_re().find_iter(text) {
        let end = m.end();
        if valid.contains(&end) {
            out.insert(end);
        }
    }
    out.insert(text.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_long_blank_runs() {
        let input = "a\n\n\n\n\nb";
        assert_eq!(normalize_whitespace(input), "a\n\nb");
    }

    #[test]
    fn strips_trailing_whitespace_only() {
        let input = "a  b  \n\n";
        assert_eq!(normalize_whitespace(input), "a  b");
    }

    #[test]
    fn word_boundaries_cover_start_and_end() {
        let text = "one two  three";
        let bounds = word_boundaries(text);
        assert_eq!(bounds.first(), Some(&0));
        assert_eq!(bounds.last(), Some(&text.len()));
        assert!(bounds.contains(&4)); // "two"
        assert!(bounds.contains(&9)); // "three"
    }

    #[test]
    fn sentence_boundaries_detects_terminators() {
        let text = "First sentence. Second one? Third.";
        let bounds = word_boundaries(text);
        let sentences = sentence_boundaries(text, &bounds);
        assert!(sentences.contains(&16)); // after "First sentence. "
        assert!(sentences.contains(&text.len()));
    }
}
