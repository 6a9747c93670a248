use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Structured metadata extracted by the LLM for one SCOTUS opinion
/// (spec.md §3). All list fields default to an empty list when the model
/// omits them; all string fields default to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScotusLlmFields {
    #[serde(default)]
    pub plain_language_summary: String,
    #[serde(default)]
    pub holding_plain: String,
    #[serde(default)]
    pub outcome_simple: String,
    #[serde(default)]
    pub issue_plain: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub constitution_cited: Vec<String>,
    #[serde(default)]
    pub federal_statutes_cited: Vec<String>,
    #[serde(default)]
    pub federal_regulations_cited: Vec<String>,
    #[serde(default)]
    pub cases_cited: Vec<String>,
    #[serde(default)]
    pub topics_or_policy_areas: Vec<String>,
}

/// Structured metadata extracted by the LLM for one Executive Order
/// (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EoLlmFields {
    #[serde(default)]
    pub plain_summary: String,
    #[serde(default)]
    pub action_plain: String,
    #[serde(default)]
    pub impact_simple: String,
    #[serde(default)]
    pub implementation_requirements: String,
    #[serde(default)]
    pub federal_statutes_referenced: Vec<String>,
    #[serde(default)]
    pub federal_regulations_referenced: Vec<String>,
    #[serde(default)]
    pub agencies_or_entities: Vec<String>,
    #[serde(default)]
    pub topics_or_policy_areas: Vec<String>,
}

/// Document-type-tagged LLM extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmFields {
    Scotus(ScotusLlmFields),
    Eo(EoLlmFields),
}

const MIN_TOPICS: usize = 5;
const MAX_TOPICS: usize = 8;

impl LlmFields {
    pub fn topics(&self) -> &[String] {
        match self {
            LlmFields::Scotus(f) => &f.topics_or_policy_areas,
            LlmFields::Eo(f) => &f.topics_or_policy_areas,
        }
    }

    /// `topics_or_policy_areas` length must be in `[5, 8]`; a violation is
    /// `llm_schema_violation` per spec.md §4.4, a hard validation, not a
    /// truncation.
    pub fn validate(&self) -> Result<(), AppError> {
        let n = self.topics().len();
        if !(MIN_TOPICS..=MAX_TOPICS).contains(&n) {
            return Err(AppError::LlmSchemaViolation(format!(
                "topics_or_policy_areas must have between {MIN_TOPICS} and {MAX_TOPICS} items, got {n}"
            )));
        }
        Ok(())
    }

    /// Flattens into the key/value pairs a [`Payload`](super::payload::Payload)
    /// merges into its metadata map. Empty string/list values are omitted
    /// (spec.md §4.6 step 4, §3 "Unknown/empty keys are omitted").
    pub fn into_metadata_pairs(self) -> Vec<(String, serde_json::Value)> {
        fn push_str(out: &mut Vec<(String, serde_json::Value)>, key: &str, value: String) {
            if !value.is_empty() {
                out.push((key.to_string(), serde_json::Value::String(value)));
            }
        }
        fn push_list(out: &mut Vec<(String, serde_json::Value)>, key: &str, value: Vec<String>) {
            if !value.is_empty() {
                out.push((
                    key.to_string(),
                    serde_json::Value::Array(
                        value.into_iter().map(serde_json::Value::String).collect(),
                    ),
                ));
            }
        }

        let mut out = Vec::new();
        match self {
            LlmFields::Scotus(f) => {
                push_str(&mut out, "plain_language_summary", f.plain_language_summary);
                push_str(&mut out, "holding_plain", f.holding_plain);
                push_str(&mut out, "outcome_simple", f.outcome_simple);
                push_str(&mut out, "issue_plain", f.issue_plain);
                push_str(&mut out, "reasoning", f.reasoning);
                push_list(&mut out, "constitution_cited", f.constitution_cited);
                push_list(
                    &mut out,
                    "federal_statutes_cited",
                    f.federal_statutes_cited,
                );
                push_list(
                    &mut out,
                    "federal_regulations_cited",
                    f.federal_regulations_cited,
                );
                push_list(&mut out, "cases_cited", f.cases_cited);
                push_list(
                    &mut out,
                    "topics_or_policy_areas",
                    f.topics_or_policy_areas,
                );
            }
            LlmFields::Eo(f) => {
                push_str(&mut out, "plain_summary", f.plain_summary);
                push_str(&mut out, "action_plain", f.action_plain);
                push_str(&mut out, "impact_simple", f.impact_simple);
                push_str(
                    &mut out,
                    "implementation_requirements",
                    f.implementation_requirements,
                );
                push_list(
                    &mut out,
                    "federal_statutes_referenced",
                    f.federal_statutes_referenced,
                );
                push_list(
                    &mut out,
                    "federal_regulations_referenced",
                    f.federal_regulations_referenced,
                );
                push_list(&mut out, "agencies_or_entities", f.agencies_or_entities);
                push_list(
                    &mut out,
                    "topics_or_policy_areas",
                    f.topics_or_policy_areas,
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("topic-{i}")).collect()
    }

    #[test]
    fn rejects_too_few_topics() {
        let fields = LlmFields::Scotus(ScotusLlmFields {
            topics_or_policy_areas: topics(4),
            ..Default::default()
        });
        assert!(matches!(
            fields.validate(),
            Err(AppError::LlmSchemaViolation(_))
        ));
    }

    #[test]
    fn rejects_too_many_topics() {
        let fields = LlmFields::Eo(EoLlmFields {
            topics_or_policy_areas: topics(9),
            ..Default::default()
        });
        assert!(matches!(
            fields.validate(),
            Err(AppError::LlmSchemaViolation(_))
        ));
    }

    #[test]
    fn accepts_boundary_counts() {
        let low = LlmFields::Scotus(ScotusLlmFields {
            topics_or_policy_areas: topics(5),
            ..Default::default()
        });
        let high = LlmFields::Scotus(ScotusLlmFields {
            topics_or_policy_areas: topics(8),
            ..Default::default()
        });
        assert!(low.validate().is_ok());
        assert!(high.validate().is_ok());
    }

    #[test]
    fn empty_string_and_list_fields_are_omitted_from_metadata() {
        let fields = LlmFields::Scotus(ScotusLlmFields {
            holding_plain: "the court held X".into(),
            topics_or_policy_areas: topics(5),
            ..Default::default()
        });
        let pairs = fields.into_metadata_pairs();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"holding_plain"));
        assert!(keys.contains(&"topics_or_policy_areas"));
        assert!(!keys.contains(&"plain_language_summary"));
        assert!(!keys.contains(&"cases_cited"));
    }
}
