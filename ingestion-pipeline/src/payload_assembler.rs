//! C6: payload assembler. Merges a document's metadata, its LLM-extracted
//! fields, and each chunk into the vector store's wire format.
use std::collections::BTreeMap;

use chrono::Datelike;
use common::storage::types::chunk::Chunk;
use common::storage::types::document::{Document, DocumentKind};
use common::storage::types::llm_fields::LlmFields;
use common::storage::types::payload::Payload;
use serde_json::{json, Value};
use tracing::warn;

fn document_metadata(document: &Document) -> BTreeMap<String, Value> {
    let mut meta = BTreeMap::new();
    meta.insert("document_id".to_string(), json!(document.id));
    meta.insert("title".to_string(), json!(document.title));
    meta.insert("publication_date".to_string(), json!(document.date));
    meta.insert("year".to_string(), json!(extract_year(&document.id, &document.date)));
    meta.insert(
        "source".to_string(),
        json!(document.kind.source().label()),
    );
    meta.insert(
        "type".to_string(),
        json!(match document.kind {
            DocumentKind::ScotusOpinion => "supreme_court_opinion",
            DocumentKind::ExecutiveOrder => "executive_order",
        }),
    );
    meta.insert("url".to_string(), json!(document.url));

    let type_specific_keys: &[&str] = match document.kind {
        DocumentKind::ScotusOpinion => &[
            "docket_number",
            "majority_author",
            "vote_majority",
            "vote_minority",
            "case_name_short",
        ],
        DocumentKind::ExecutiveOrder => &[
            "executive_order_number",
            "president",
            "signing_date",
            "agencies_or_entities",
            "effective_date",
        ],
    };
    for key in type_specific_keys {
        if let Some(value) = document.metadata.get(*key) {
            if !is_empty_value(value) {
                meta.insert((*key).to_string(), value.clone());
            }
        }
    }
    meta
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

/// Parses `YYYY-MM-DD` or `YYYY/MM/DD`; on failure, falls back to
/// `document.id`'s year if embedded, else logs a warning and uses the
/// current year (spec.md §4.6 step 2).
fn extract_year(document_id: &str, date: &str) -> i32 {
    let digits: String = date.chars().take(4).filter(char::is_ascii_digit).collect();
    if digits.len() == 4 {
        if let Ok(year) = digits.parse::<i32>() {
            if (1700..=2200).contains(&year) {
                return year;
            }
        }
    }
    warn!(document_id, date, "could not parse year from date, falling back to current year");
    chrono::Utc::now().year()
}

/// Builds one [`Payload`] per chunk. Invalid payloads (missing id/text) are
/// dropped with a warning rather than raised, per spec.md §4.6 step 4.
pub fn assemble_payloads(document: &Document, chunks: &[Chunk], llm_fields: &LlmFields) -> Vec<Payload> {
    let document_meta = document_metadata(document);
    let llm_pairs = llm_fields.clone().into_metadata_pairs();

    let mut payloads = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let mut metadata = document_meta.clone();
        for (key, value) in &llm_pairs {
            metadata.insert(key.clone(), value.clone());
        }
        metadata.insert("chunk_index".to_string(), json!(chunk.chunk_index));
        metadata.insert("section_label".to_string(), json!(chunk.section_label));
        metadata.insert("chunk_token_count".to_string(), json!(chunk.token_count));

        let payload = Payload {
            id: Payload::chunk_id(&document.id, chunk.chunk_index),
            text: chunk.text.clone(),
            metadata,
        };

        if payload.is_valid() {
            payloads.push(payload);
        } else {
            warn!(payload_id = %payload.id, "dropping invalid payload");
        }
    }
    payloads
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::llm_fields::ScotusLlmFields;

    fn topics(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("topic-{i}")).collect()
    }

    #[test]
    fn extracts_year_from_iso_date() {
        assert_eq!(extract_year("1", "2024-05-23"), 2024);
        assert_eq!(extract_year("1", "2024/05/23"), 2024);
    }

    #[test]
    fn falls_back_to_current_year_on_unparsable_date() {
        let year = extract_year("1", "not-a-date");
        assert_eq!(year, chrono::Utc::now().year());
    }

    #[test]
    fn assembles_payload_with_merged_metadata() {
        let doc = Document::new("123456", "Example v. Test", "2024-05-23", DocumentKind::ScotusOpinion, "body", "https://example.com");
        let chunk = Chunk::new("some text", "Majority Opinion (Roberts)", 650, 0);
        let fields = LlmFields::Scotus(ScotusLlmFields {
            holding_plain: "the court held X".into(),
            topics_or_policy_areas: topics(5),
            ..Default::default()
        });

        let payloads = assemble_payloads(&doc, std::slice::from_ref(&chunk), &fields);
        assert_eq!(payloads.len(), 1);
        let payload = &payloads[0];
        assert_eq!(payload.id, "123456_chunk_0");
        assert_eq!(payload.metadata["document_id"], json!("123456"));
        assert_eq!(payload.metadata["year"], json!(2024));
        assert_eq!(payload.metadata["holding_plain"], json!("the court held X"));
        assert_eq!(payload.metadata["chunk_index"], json!(0));
    }

    #[test]
    fn empty_type_specific_values_are_omitted() {
        let doc = Document::new("1", "t", "2024-01-01", DocumentKind::ScotusOpinion, "b", "u");
        let meta = document_metadata(&doc);
        assert!(!meta.contains_key("docket_number"));
    }
}
