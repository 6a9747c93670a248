//! Section-boundary detection for the two document grammars. Each detector
//! returns a list of `(label, text)` sections that partition the input
//! exactly: concatenating the section texts in order reproduces the input.
use std::sync::OnceLock;

use regex::Regex;

pub struct Section {
    pub label: String,
    pub text: String,
}

fn scotus_opening_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^(?:Syllabus\b|(?P<justice>[A-Z][A-Z.' -]+?),?\s+(?P<role>delivered the opinion of the Court|concurring(?: in part)?(?: and dissenting in part)?(?: in the judgment)?|dissenting(?: in part)?)|(?P<per_curiam>PER CURIAM))",
        )
        .expect("static regex")
    })
}

/// Splits a SCOTUS opinion body into labeled sections per the recognized
/// openings (Syllabus, per-justice majority/concurrence/dissent, per
/// curiam). Falls back to a single `"Opinion"` section when nothing
/// matches.
pub fn detect_scotus_sections(text: &str) -> Vec<Section> {
    let re = scotus_opening_re();
    let matches: Vec<_> = re.captures_iter(text).collect();
    if matches.is_empty() {
        return vec![Section {
            label: "Opinion".to_string(),
            text: text.to_string(),
        }];
    }

    let mut sections = Vec::new();
    for (i, caps) in matches.iter().enumerate() {
        let m = caps.get(0).expect("capture group 0 always matches");
        let start = m.start();
        let end = matches
            .get(i + 1)
            .map(|c| c.get(0).expect("capture group 0 always matches").start())
            .unwrap_or(text.len());

        let label = if m.as_str().eq_ignore_ascii_case("syllabus") {
            "Syllabus".to_string()
        } else if caps.name("per_curiam").is_some() {
            "Per Curiam Opinion".to_string()
        } else {
            let justice = caps
                .name("justice")
                .map(|j| j.as_str().trim().trim_end_matches(','))
                .unwrap_or("")
                .to_string();
            let role = caps.name("role").map(|r| r.as_str()).unwrap_or("");
            if role.starts_with("delivered") {
                format!("Majority Opinion ({justice})")
            } else if role.starts_with("dissenting") {
                format!("Dissenting Opinion ({justice})")
            } else {
                format!("Concurring Opinion ({justice})")
            }
        };

        sections.push(Section {
            label,
            text: text[start..end].to_string(),
        });
    }

    // Anything before the first recognized opening belongs to no labeled
    // section in the grammar; fold it into the first section so no content
    // is silently dropped.
    let first_start = matches[0].get(0).expect("capture group 0 always matches").start();
    if first_start > 0 {
        let prefix = &text[..first_start];
        if let Some(first) = sections.first_mut() {
            first.text = format!("{prefix}{}", first.text);
        }
    }

    sections
}

fn eo_section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:Section|Sec\.)\s+(\d+)\.").expect("static regex"))
}

/// Splits an Executive Order body on `Section <n>.` / `Sec. <n>.` openings.
/// Subsections like `(a)`, `(b)` never open a new section; they stay inline
/// inside whichever section contains them. Falls back to a single
/// `"Executive Order"` section when no opening is found.
pub fn detect_eo_sections(text: &str) -> Vec<Section> {
    let re = eo_section_re();
    let matches: Vec<_> = re.find_iter(text).collect();
    if matches.is_empty() {
        return vec![Section {
            label: "Executive Order".to_string(),
            text: text.to_string(),
        }];
    }

    let mut sections = Vec::new();
    for (i, m) in matches.iter().enumerate() {
        let end = matches.get(i + 1).map(|n| n.start()).unwrap_or(text.len());
        let section_num = re
            .captures(m.as_str())
            .and_then(|c| c.get(1))
            .map(|g| g.as_str())
            .unwrap_or("?");
        sections.push(Section {
            label: format!("Sec. {section_num}."),
            text: text[m.start()..end].to_string(),
        });
    }

    let first_start = matches[0].start();
    if first_start > 0 {
        let prefix = &text[..first_start];
        if let Some(first) = sections.first_mut() {
            first.text = format!("{prefix}{}", first.text);
        }
    }

    sections
}

fn eo_subsection_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\(([a-z])\)").expect("static regex"))
}

/// Finds lettered-subsection markers (`(a)`, `(b)`, ...) within one
/// section's text, returning `(byte_offset, letter)` pairs in order of
/// appearance. Subsections never open a new section (`detect_eo_sections`
/// keeps them inline), but a chunk falling after a marker and before the
/// next one carries that letter folded into its label, e.g. `Sec. 2(a)`
/// (spec.md §4.3.3, §3 Chunk, Glossary).
pub fn detect_subsections(text: &str) -> Vec<(usize, String)> {
    eo_subsection_re()
        .captures_iter(text)
        .map(|caps| {
            let m = caps.get(0).expect("capture group 0 always matches");
            let letter = caps
                .get(1)
                .expect("letter capture always matches")
                .as_str()
                .to_string();
            (m.start(), letter)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_opening_is_a_single_opinion_section() {
        let sections = detect_scotus_sections("Just some body text with no markers.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label, "Opinion");
    }

    #[test]
    fn detects_syllabus_and_majority() {
        let text = "Syllabus\nHeld: foo.\nCHIEF JUSTICE ROBERTS delivered the opinion of the Court.\nBody text here.";
        let sections = detect_scotus_sections(text);
        assert!(sections.iter().any(|s| s.label == "Syllabus"));
        assert!(sections
            .iter()
            .any(|s| s.label.starts_with("Majority Opinion")));
    }

    #[test]
    fn detects_dissent() {
        let text = "JUSTICE THOMAS, dissenting.\nI would reverse.";
        let sections = detect_scotus_sections(text);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].label.starts_with("Dissenting Opinion"));
    }

    #[test]
    fn no_eo_sections_falls_back() {
        let sections = detect_eo_sections("By the authority vested in me, I order the following.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label, "Executive Order");
    }

    #[test]
    fn eo_sections_split_and_subsections_stay_inline() {
        let text = "Section 1. Purpose.\nThis order does X.\n(a) Detail one.\n(b) Detail two.\nSec. 2. Policy.\nThis is policy.";
        let sections = detect_eo_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label, "Sec. 1.");
        assert_eq!(sections[1].label, "Sec. 2.");
        assert!(sections[0].text.contains("(a) Detail one."));
    }

    #[test]
    fn detects_subsection_markers_in_order() {
        let text = "Policy statement.\n(a) First point.\nMore detail.\n(b) Second point.";
        let subs = detect_subsections(text);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].1, "a");
        assert_eq!(subs[1].1, "b");
        assert!(subs[0].0 < subs[1].0);
    }

    #[test]
    fn no_subsections_yields_empty_list() {
        assert!(detect_subsections("Just a plain sentence.").is_empty());
    }
}
