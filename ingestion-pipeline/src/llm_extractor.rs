//! C4: LLM metadata extractor. One structured-output call per document,
//! JSON-schema mode (`strict: true`) the same way the teacher's pipeline
//! drives its own content-analysis call.
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::Client;
use common::error::AppError;
use common::storage::types::document::{Document, DocumentKind};
use common::storage::types::llm_fields::{EoLlmFields, LlmFields, ScotusLlmFields};
use common::utils::retry::with_backoff;
use serde_json::json;
use tracing::instrument;

const SCOTUS_SYSTEM_PROMPT: &str = "You are a legal analyst who explains Supreme Court opinions \
in plain, accurate language for a non-lawyer audience. Extract only what the text supports.";

const EO_SYSTEM_PROMPT: &str = "You are a policy analyst who explains presidential Executive \
Orders in plain, accurate language for a non-lawyer audience. Extract only what the text supports.";

fn scotus_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "plain_language_summary": { "type": "string" },
            "holding_plain": { "type": "string" },
            "outcome_simple": { "type": "string" },
            "issue_plain": { "type": "string" },
            "reasoning": { "type": "string" },
            "constitution_cited": { "type": "array", "items": { "type": "string" } },
            "federal_statutes_cited": { "type": "array", "items": { "type": "string" } },
            "federal_regulations_cited": { "type": "array", "items": { "type": "string" } },
            "cases_cited": { "type": "array", "items": { "type": "string" } },
            "topics_or_policy_areas": { "type": "array", "items": { "type": "string" } }
        },
        "required": [
            "plain_language_summary", "holding_plain", "outcome_simple", "issue_plain",
            "reasoning", "constitution_cited", "federal_statutes_cited",
            "federal_regulations_cited", "cases_cited", "topics_or_policy_areas"
        ],
        "additionalProperties": false
    })
}

fn eo_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "plain_summary": { "type": "string" },
            "action_plain": { "type": "string" },
            "impact_simple": { "type": "string" },
            "implementation_requirements": { "type": "string" },
            "federal_statutes_referenced": { "type": "array", "items": { "type": "string" } },
            "federal_regulations_referenced": { "type": "array", "items": { "type": "string" } },
            "agencies_or_entities": { "type": "array", "items": { "type": "string" } },
            "topics_or_policy_areas": { "type": "array", "items": { "type": "string" } }
        },
        "required": [
            "plain_summary", "action_plain", "impact_simple", "implementation_requirements",
            "federal_statutes_referenced", "federal_regulations_referenced",
            "agencies_or_entities", "topics_or_policy_areas"
        ],
        "additionalProperties": false
    })
}

pub struct LlmExtractor {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmExtractor {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Extracts structured fields for `document`. `preferred_text` is the
    /// Syllabus when one was returned by the chunker, otherwise the full
    /// document content (spec.md §4.4: "the Syllabus is preferred for
    /// holding/outcome fields").
    #[instrument(skip(self, preferred_text))]
    pub async fn extract(
        &self,
        document: &Document,
        preferred_text: &str,
    ) -> Result<LlmFields, AppError> {
        let fields = match document.kind {
            DocumentKind::ScotusOpinion => {
                let raw = self.call(SCOTUS_SYSTEM_PROMPT, preferred_text, "scotus_opinion_analysis", scotus_schema()).await?;
                let parsed: ScotusLlmFields = serde_json::from_str(&raw)
                    .map_err(|e| AppError::LlmInvalidResponse(e.to_string()))?;
                LlmFields::Scotus(parsed)
            }
            DocumentKind::ExecutiveOrder => {
                let raw = self.call(EO_SYSTEM_PROMPT, preferred_text, "executive_order_analysis", eo_schema()).await?;
                let parsed: EoLlmFields = serde_json::from_str(&raw)
                    .map_err(|e| AppError::LlmInvalidResponse(e.to_string()))?;
                LlmFields::Eo(parsed)
            }
        };
        fields.validate()?;
        Ok(fields)
    }

    async fn call(
        &self,
        system_prompt: &str,
        text: &str,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> Result<String, AppError> {
        with_backoff(|| async {
            let response_format = ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: Some("Structured metadata extracted from a federal document".into()),
                    name: schema_name.to_string(),
                    schema: Some(schema.clone()),
                    strict: Some(true),
                },
            };

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages([
                    ChatCompletionRequestSystemMessage::from(system_prompt).into(),
                    ChatCompletionRequestUserMessage::from(text).into(),
                ])
                .response_format(response_format)
                .build()
                .map_err(AppError::from)?;

            let response = self.client.chat().create(request).await?;
            response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| AppError::LlmInvalidResponse("no content in LLM response".into()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scotus_schema_requires_all_fields() {
        let schema = scotus_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "topics_or_policy_areas"));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn eo_schema_requires_all_fields() {
        let schema = eo_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "agencies_or_entities"));
    }
}
