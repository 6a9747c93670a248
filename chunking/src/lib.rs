//! Document-type-aware hierarchical chunker (C3): section detection +
//! token-budgeted sliding window, applied per section so a chunk never
//! spans two Executive Order sections.
pub mod sections;
pub mod text;
pub mod window;

use common::storage::types::chunk::Chunk;
use common::storage::types::document::{Document, DocumentKind};
use common::utils::config::ChunkBudget;

use sections::{detect_eo_sections, detect_scotus_sections, detect_subsections};
use text::normalize_whitespace;
use window::chunk_section;

/// Chunks plus, for SCOTUS opinions, the raw Syllabus text (used by the LLM
/// extractor for holding/outcome extraction, independent of the Syllabus
/// chunk that also ends up in `chunks`).
pub struct ChunkResult {
    pub chunks: Vec<Chunk>,
    pub syllabus: Option<String>,
}

pub fn chunk_document(document: &Document, budget: &ChunkBudget) -> ChunkResult {
    let normalized = normalize_whitespace(&document.content);
    if normalized.is_empty() {
        return ChunkResult {
            chunks: Vec::new(),
            syllabus: None,
        };
    }

    let raw_sections = match document.kind {
        DocumentKind::ScotusOpinion => detect_scotus_sections(&normalized),
        DocumentKind::ExecutiveOrder => detect_eo_sections(&normalized),
    };

    let syllabus = raw_sections
        .iter()
        .find(|s| s.label == "Syllabus")
        .map(|s| s.text.clone());

    let mut chunks = Vec::new();
    for section in &raw_sections {
        let subsections = match document.kind {
            DocumentKind::ExecutiveOrder => detect_subsections(&section.text),
            DocumentKind::ScotusOpinion => Vec::new(),
        };
        let section_chunks = chunk_section(&section.text, &section.label, budget, chunks.len(), &subsections);
        chunks.extend(section_chunks);
    }

    ChunkResult { chunks, syllabus }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> ChunkBudget {
        ChunkBudget::scotus_default()
    }

    fn long_body(label_word: &str, sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("{label_word} sentence number {i} has a handful of words in it."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        let doc = Document::new("1", "t", "2024-01-01", DocumentKind::ScotusOpinion, "", "url");
        let result = chunk_document(&doc, &budget());
        assert!(result.chunks.is_empty());
        assert!(result.syllabus.is_none());
    }

    #[test]
    fn scotus_happy_path_produces_labeled_chunks_with_deterministic_indices() {
        let content = format!(
            "Syllabus\nHeld: {}\nCHIEF JUSTICE ROBERTS delivered the opinion of the Court.\n{}",
            long_body("Holding", 20),
            long_body("Majority", 200)
        );
        let doc = Document::new(
            "123456",
            "Example v. Test",
            "2024-05-23",
            DocumentKind::ScotusOpinion,
            content,
            "https://example.com",
        );
        let result = chunk_document(&doc, &budget());

        assert!(result.syllabus.is_some());
        assert!(result.chunks.len() >= 4);
        assert!(result.chunks.iter().any(|c| c.section_label == "Syllabus"));
        assert!(result
            .chunks
            .iter()
            .any(|c| c.section_label.starts_with("Majority Opinion")));

        for (i, chunk) in result.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn eo_sections_never_share_a_chunk() {
        let content = format!(
            "Section 1. Purpose.\n{}\nSec. 2. Policy.\n{}",
            long_body("First", 120),
            long_body("Second", 120)
        );
        let doc = Document::new(
            "eo-1",
            "Example Order",
            "2024-01-01",
            DocumentKind::ExecutiveOrder,
            content,
            "https://example.com",
        );
        let result = chunk_document(&doc, &ChunkBudget::eo_default());

        for chunk in &result.chunks {
            let has_sec1 = chunk.text.contains("Sec. 1.") || chunk.text.contains("Section 1.");
            let has_sec2 = chunk.text.contains("Sec. 2.");
            assert!(!(has_sec1 && has_sec2), "chunk spans both sections: {}", chunk.text);
        }
    }

    #[test]
    fn eo_chunk_label_carries_subsection_letter() {
        // A tiny budget plus long per-subsection bodies forces several
        // windows inside each subsection's span, regardless of exact token
        // counts, so some window is guaranteed to start after "(a)" and
        // before "(b)", and another after "(b)".
        let tiny_budget = ChunkBudget {
            min_tokens: 10,
            target_tokens: 15,
            max_tokens: 20,
            overlap_ratio: 0.0,
        };
        let content = format!(
            "Section 1. Purpose.\n(a) {}\n(b) {}\nSec. 2. Policy.\n{}",
            long_body("First", 60),
            long_body("Second", 60),
            long_body("Third", 10),
        );
        let doc = Document::new(
            "eo-2",
            "Example Order",
            "2024-01-01",
            DocumentKind::ExecutiveOrder,
            content,
            "https://example.com",
        );
        let result = chunk_document(&doc, &tiny_budget);

        assert!(
            result
                .chunks
                .iter()
                .any(|c| c.section_label == "Sec. 1(a)"),
            "expected a chunk labeled Sec. 1(a), got labels: {:?}",
            result.chunks.iter().map(|c| &c.section_label).collect::<Vec<_>>()
        );
        assert!(
            result
                .chunks
                .iter()
                .any(|c| c.section_label == "Sec. 1(b)"),
            "expected a chunk labeled Sec. 1(b), got labels: {:?}",
            result.chunks.iter().map(|c| &c.section_label).collect::<Vec<_>>()
        );
        assert!(result
            .chunks
            .iter()
            .all(|c| c.section_label.starts_with("Sec. 1") || c.section_label == "Sec. 2."));
    }
}
