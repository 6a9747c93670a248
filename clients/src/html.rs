//! HTML-to-text cleaning for Federal Register `raw_text_url` responses
//! (spec.md §6.1): strip tags, decode entities. Matches the original's
//! behavior on ordinary documents; documents whose body embeds PDF image
//! references leave HTML residue behind rather than being bit-for-bit
//! matched (see SPEC_FULL.md §11).
use scraper::Html;

pub fn clean_html(input: &str) -> String {
    let document = Html::parse_document(input);
    let text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n");
    let decoded = html_escape::decode_html_entities(&text);
    collapse_inline_whitespace(&decoded)
}

/// Collapses runs of spaces/tabs within each line but keeps line breaks
/// intact, so section-opening detection (which anchors on line starts,
/// e.g. `(?m)^Section \d+\.`) still works on cleaned text (spec.md §4.3.2).
fn collapse_inline_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_decodes_entities() {
        let html = "<html><body><p>Section 1.&nbsp;Purpose &amp; Scope.</p></body></html>";
        let cleaned = clean_html(html);
        assert!(cleaned.contains("Section 1."));
        assert!(cleaned.contains("Purpose & Scope."));
        assert!(!cleaned.contains('<'));
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "Already plain text.";
        assert_eq!(clean_html(text), "Already plain text.");
    }
}
