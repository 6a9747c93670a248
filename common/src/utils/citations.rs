//! C2: citation recognizer.
//!
//! Pure functions that scan prose for CFR / U.S. Code / Constitution
//! citations. No normalization beyond the fields documented in spec.md
//! §4.2; overlapping matches across recognizers are independent.
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfrCitation {
    pub title: String,
    pub section: String,
    pub full_citation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UscCitation {
    pub title: String,
    pub section: String,
    pub full_citation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ConstitutionCitationType {
    Article,
    Amendment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstitutionCitation {
    #[serde(rename = "type")]
    pub kind: ConstitutionCitationType,
    pub number: String,
    pub section: Option<String>,
    pub clause: Option<String>,
    pub full_citation: String,
}

fn cfr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)(\d+)\s*C\.?\s*F\.?\s*R\.?\s*(?:Part\s+(\d+[A-Za-z]*)|§+\s*([0-9][0-9A-Za-z.\-]*))")
            .unwrap()
    })
}

fn usc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)(\d+)\s*U\.?\s*S\.?\s*C\.?\s*§+\s*([0-9][0-9A-Za-z.\-]*)").unwrap()
    })
}

fn amendment_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)\b(First|Second|Third|Fourth|Fifth|Sixth|Seventh|Eighth|Ninth|Tenth|Eleventh|Twelfth|Thirteenth|Fourteenth|Fifteenth|Sixteenth|Seventeenth|Eighteenth|Nineteenth|Twentieth|Twenty-First|Twenty-Second|Twenty-Third|Twenty-Fourth|Twenty-Fifth|Twenty-Sixth|Twenty-Seventh)\s+Amendment\b").unwrap()
    })
}

fn amendment_roman_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)\bAmendment\s+([IVXLCDM]+)\b").unwrap()
    })
}

fn article_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)\bArticle\s+([IVXLCDM]+)(?:,?\s*(?:§|Section)\s*(\d+[A-Za-z]*))?(?:,?\s*Clause\s*(\d+))?").unwrap()
    })
}

/// Scans `text` for CFR citations (`<title> C.F.R. § <section>` and
/// `<title> C.F.R. Part <n>` variants). Empty/whitespace input returns an
/// empty list.
pub fn find_cfr_citations(text: &str) -> Vec<CfrCitation> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    cfr_regex()
        .captures_iter(text)
        .map(|caps| {
            #[allow(clippy::indexing_slicing)]
            let title = caps[1].to_string();
            let section = caps
                .get(3)
                .or_else(|| caps.get(2))
                .map_or_else(String::new, |m| m.as_str().to_string());
            #[allow(clippy::indexing_slicing)]
            let full_citation = caps[0].to_string();
            CfrCitation {
                title,
                section,
                full_citation,
            }
        })
        .collect()
}

/// Scans `text` for U.S. Code citations (`<title> U.S.C. § <section>`).
pub fn find_usc_citations(text: &str) -> Vec<UscCitation> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    usc_regex()
        .captures_iter(text)
        .map(|caps| {
            #[allow(clippy::indexing_slicing)]
            let title = caps[1].to_string();
            #[allow(clippy::indexing_slicing)]
            let section = caps[2].to_string();
            #[allow(clippy::indexing_slicing)]
            let full_citation = caps[0].to_string();
            UscCitation {
                title,
                section,
                full_citation,
            }
        })
        .collect()
}

const ORDINAL_WORDS: &[&str] = &[
    "zeroth", "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
    "ninth", "tenth", "eleventh", "twelfth", "thirteenth", "fourteenth", "fifteenth",
    "sixteenth", "seventeenth", "eighteenth", "nineteenth", "twentieth",
];
const ROMAN_NUMERALS: &[&str] = &[
    "", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV",
    "XV", "XVI", "XVII", "XVIII", "XIX", "XX",
];

fn ordinal_word_to_roman(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    if let Some(stripped) = lower.strip_prefix("twenty-") {
        let idx = ORDINAL_WORDS.iter().position(|w| *w == stripped)?;
        return match idx {
            1 => Some("XXI"),
            2 => Some("XXII"),
            3 => Some("XXIII"),
            4 => Some("XXIV"),
            5 => Some("XXV"),
            6 => Some("XXVI"),
            7 => Some("XXVII"),
            _ => None,
        };
    }
    let idx = ORDINAL_WORDS.iter().position(|w| *w == lower)?;
    ROMAN_NUMERALS.get(idx).copied()
}

/// Scans `text` for Constitution citations: articles (`Article III`) and
/// amendments, recognizing both Roman-numeral (`Amendment XIV`) and
/// ordinal-word (`Fourteenth Amendment`) forms.
pub fn find_constitution_citations(text: &str) -> Vec<ConstitutionCitation> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();

    for caps in amendment_word_regex().captures_iter(text) {
        #[allow(clippy::indexing_slicing)]
        let word = &caps[1];
        if let Some(roman) = ordinal_word_to_roman(word) {
            #[allow(clippy::indexing_slicing)]
            let full_citation = caps[0].to_string();
            out.push(ConstitutionCitation {
                kind: ConstitutionCitationType::Amendment,
                number: roman.to_string(),
                section: None,
                clause: None,
                full_citation,
            });
        }
    }

    for caps in amendment_roman_regex().captures_iter(text) {
        #[allow(clippy::indexing_slicing)]
        let number = caps[1].to_uppercase();
        #[allow(clippy::indexing_slicing)]
        let full_citation = caps[0].to_string();
        out.push(ConstitutionCitation {
            kind: ConstitutionCitationType::Amendment,
            number,
            section: None,
            clause: None,
            full_citation,
        });
    }

    for caps in article_regex().captures_iter(text) {
        #[allow(clippy::indexing_slicing)]
        let number = caps[1].to_uppercase();
        let section = caps.get(2).map(|m| m.as_str().to_string());
        let clause = caps.get(3).map(|m| m.as_str().to_string());
        #[allow(clippy::indexing_slicing)]
        let full_citation = caps[0].to_string();
        out.push(ConstitutionCitation {
            kind: ConstitutionCitationType::Article,
            number,
            section,
            clause,
            full_citation,
        });
    }

    out
}

/// Formats a CFR citation back into prose form; the inverse of
/// [`find_cfr_citations`] up to the `full_citation` field.
pub fn format_cfr_citation(c: &CfrCitation) -> String {
    format!("{} C.F.R. § {}", c.title, c.section)
}

/// Formats a U.S. Code citation back into prose form.
pub fn format_usc_citation(c: &UscCitation) -> String {
    format!("{} U.S.C. § {}", c.title, c.section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_lists() {
        assert!(find_cfr_citations("").is_empty());
        assert!(find_usc_citations("   ").is_empty());
        assert!(find_constitution_citations("\n\t").is_empty());
    }

    #[test]
    fn finds_cfr_section_citation() {
        let found = find_cfr_citations("as provided in 42 C.F.R. § 405.1.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "42");
        assert_eq!(found[0].section, "405.1");
    }

    #[test]
    fn finds_cfr_part_citation() {
        let found = find_cfr_citations("see 12 CFR Part 1026");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "12");
        assert_eq!(found[0].section, "1026");
    }

    #[test]
    fn finds_usc_citation() {
        let found = find_usc_citations("under 18 U.S.C. § 242");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "18");
        assert_eq!(found[0].section, "242");
    }

    #[test]
    fn finds_ordinal_word_amendment() {
        let found = find_constitution_citations("the Fourteenth Amendment guarantees");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number, "XIV");
        assert_eq!(found[0].kind, ConstitutionCitationType::Amendment);
    }

    #[test]
    fn finds_roman_amendment() {
        let found = find_constitution_citations("Amendment XIV, Section 1");
        assert!(found.iter().any(|c| c.number == "XIV"));
    }

    #[test]
    fn finds_article_with_section_and_clause() {
        let found = find_constitution_citations("Article I, Section 8, Clause 3");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ConstitutionCitationType::Article);
        assert_eq!(found[0].number, "I");
        assert_eq!(found[0].section.as_deref(), Some("8"));
        assert_eq!(found[0].clause.as_deref(), Some("3"));
    }

    #[test]
    fn format_is_inverse_of_parse_up_to_full_citation() {
        let c = CfrCitation {
            title: "42".into(),
            section: "405.1".into(),
            full_citation: String::new(),
        };
        assert_eq!(format_cfr_citation(&c), "42 C.F.R. § 405.1");
    }
}
