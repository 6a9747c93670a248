use serde::{Deserialize, Serialize};

/// A contiguous slice of a [`Document`](super::document::Document)'s
/// content, produced by the chunking engine (C3). Invariants are enforced by
/// the chunker, not by this type: see `chunking::chunk_document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub section_label: String,
    pub token_count: usize,
    pub chunk_index: usize,
}

impl Chunk {
    pub fn new(
        text: impl Into<String>,
        section_label: impl Into<String>,
        token_count: usize,
        chunk_index: usize,
    ) -> Self {
        Self {
            text: text.into(),
            section_label: section_label.into(),
            token_count,
            chunk_index,
        }
    }
}
