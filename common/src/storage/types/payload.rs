use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stored record per chunk: the vector-store wire format (spec.md §3,
/// §6.2). `metadata` uses a `BTreeMap` so serialized output is stable, which
/// keeps round-trip tests and fixtures deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, Value>,
}

impl Payload {
    /// `<doc_id>_chunk_<index>`, so re-ingesting a document overwrites its
    /// existing chunks in place (spec.md §3, testable property 5).
    pub fn chunk_id(document_id: &str, chunk_index: usize) -> String {
        format!("{document_id}_chunk_{chunk_index}")
    }

    /// Every payload must have a non-empty `id`, non-empty `text`, and a map
    /// `metadata` (spec.md §4.6 step 4). Invalid payloads are dropped with a
    /// warning by the caller, not raised.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        assert_eq!(Payload::chunk_id("123456", 0), "123456_chunk_0");
        assert_eq!(Payload::chunk_id("123456", 0), Payload::chunk_id("123456", 0));
    }

    #[test]
    fn invalid_without_id_or_text() {
        let mut p = Payload {
            id: String::new(),
            text: "x".into(),
            metadata: BTreeMap::new(),
        };
        assert!(!p.is_valid());
        p.id = "a_chunk_0".into();
        p.text = String::new();
        assert!(!p.is_valid());
        p.text = "x".into();
        assert!(p.is_valid());
    }
}
