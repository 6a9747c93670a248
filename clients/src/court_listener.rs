//! Thin Court Listener client (spec.md §6.1). Wraps `GET /opinions`,
//! `/clusters`, `/dockets`; response shapes are fixed by the upstream API,
//! not designed here. Court-id validation is left to the caller: this
//! client surfaces `court_id` in the returned [`Document`]'s metadata
//! rather than rejecting non-SCOTUS opinions itself.
use std::collections::HashMap;

use common::error::AppError;
use common::storage::types::document::{Document, DocumentKind};
use common::utils::retry::{provider_delay, with_backoff, Provider};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

const DEFAULT_BASE_URL: &str = "https://www.courtlistener.com/api/rest/v4";

pub struct CourtListenerClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OpinionResponse {
    id: u64,
    cluster: String,
    #[serde(default)]
    plain_text: String,
    #[serde(default)]
    author_id: Option<u64>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(rename = "type", default)]
    opinion_type: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterResponse {
    #[serde(default)]
    case_name: String,
    #[serde(default)]
    citations: Vec<CitationResponse>,
    #[serde(default)]
    date_filed: Option<String>,
    docket: String,
}

#[derive(Debug, Deserialize)]
struct CitationResponse {
    #[serde(default)]
    volume: Option<u32>,
    #[serde(default)]
    reporter: Option<String>,
    #[serde(default)]
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocketResponse {
    #[serde(default)]
    court_id: String,
    #[serde(default)]
    case_name: String,
    #[serde(default)]
    docket_number: String,
}

#[derive(Debug, Deserialize)]
struct OpinionListResponse {
    next: Option<String>,
    results: Vec<OpinionSummary>,
}

#[derive(Debug, Deserialize)]
struct OpinionSummary {
    id: u64,
}

impl CourtListenerClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, AppError> {
        tokio::time::sleep(provider_delay(Provider::CourtListener)).await;
        with_backoff(|| async {
            let response = self
                .http
                .get(url)
                .header("Authorization", self.auth_header())
                .send()
                .await
                .map_err(|e| AppError::UpstreamNetwork(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(AppError::UpstreamHttp {
                    status: status.as_u16(),
                    message,
                });
            }
            response
                .json::<T>()
                .await
                .map_err(|e| AppError::UpstreamNetwork(e.to_string()))
        })
        .await
    }

    /// Walks `opinion -> cluster -> docket` and returns the full document,
    /// tagged SCOTUS regardless of the actual `court_id` found (see module
    /// docs): validation is the orchestrator's job.
    #[instrument(skip(self))]
    pub async fn fetch_document(&self, opinion_id: &str) -> Result<Document, AppError> {
        let opinion: OpinionResponse = self
            .get_json(&format!("{}/opinions/{opinion_id}/", self.base_url))
            .await?;
        let cluster: ClusterResponse = self.get_json(&opinion.cluster).await?;
        let docket: DocketResponse = self.get_json(&cluster.docket).await?;

        let mut metadata: HashMap<String, Value> = HashMap::new();
        metadata.insert("court_id".to_string(), json!(docket.court_id));
        metadata.insert("docket_number".to_string(), json!(docket.docket_number));
        metadata.insert(
            "case_name_short".to_string(),
            json!(if cluster.case_name.is_empty() {
                docket.case_name.clone()
            } else {
                cluster.case_name.clone()
            }),
        );
        if let Some(author_id) = opinion.author_id {
            metadata.insert("majority_author_id".to_string(), json!(author_id));
        }
        if let Some(opinion_type) = &opinion.opinion_type {
            metadata.insert("opinion_type".to_string(), json!(opinion_type));
        }
        if !cluster.citations.is_empty() {
            metadata.insert(
                "citations".to_string(),
                json!(cluster
                    .citations
                    .iter()
                    .map(|c| format!(
                        "{} {} {}",
                        c.volume.map(|v| v.to_string()).unwrap_or_default(),
                        c.reporter.clone().unwrap_or_default(),
                        c.page.clone().unwrap_or_default()
                    ))
                    .collect::<Vec<_>>()),
            );
        }

        let date = cluster
            .date_filed
            .or(opinion.date_created)
            .unwrap_or_default();
        let title = if cluster.case_name.is_empty() {
            docket.case_name
        } else {
            cluster.case_name
        };

        let mut document = Document::new(
            opinion.id.to_string(),
            title,
            date,
            DocumentKind::ScotusOpinion,
            opinion.plain_text,
            opinion
                .download_url
                .unwrap_or_else(|| format!("{}/opinions/{}/", self.base_url, opinion.id)),
        );
        document.metadata = metadata;
        Ok(document)
    }

    /// Lists SCOTUS opinion ids filed within `[start_date, end_date]`
    /// (`YYYY-MM-DD`), following `next` pagination links until exhausted.
    #[instrument(skip(self))]
    pub async fn list_opinion_ids(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<String>, AppError> {
        let mut url = format!(
            "{}/opinions/?cluster__docket__court__id=scotus&cluster__date_filed__gte={start_date}&cluster__date_filed__lte={end_date}&order_by=date_created",
            self.base_url
        );
        let mut ids = Vec::new();
        loop {
            let page: OpinionListResponse = self.get_json(&url).await?;
            ids.extend(page.results.into_iter().map(|o| o.id.to_string()));
            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_header_format() {
        let client = CourtListenerClient::new("abc123");
        assert_eq!(client.auth_header(), "Token abc123");
    }
}
