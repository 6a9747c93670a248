//! Thin Federal Register client (spec.md §6.1). `GET /documents/{number}`
//! plus a follow-up fetch of `raw_text_url`, cleaned via [`crate::html`].
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::error::AppError;
use common::storage::types::document::{Document, DocumentKind};
use common::utils::retry::{provider_delay, with_backoff, Provider};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

const DEFAULT_BASE_URL: &str = "https://www.federalregister.gov/api/v1";

/// In-memory `url -> cleaned text` cache shared across a single ingestion
/// run (spec.md §4.9 "text-fetch cache"). Duplicate fetches for the same
/// key under concurrent workers are tolerated, not locked out.
#[derive(Clone, Default)]
pub struct TextCache(Arc<Mutex<HashMap<String, String>>>);

impl TextCache {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct FederalRegisterClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AgencyResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    document_number: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    executive_order_number: Option<u32>,
    #[serde(default)]
    signing_date: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    president: Option<PresidentResponse>,
    #[serde(default)]
    raw_text_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    agencies: Vec<AgencyResponse>,
    #[serde(default)]
    citation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PresidentResponse {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    #[serde(default)]
    next_page_url: Option<String>,
    results: Vec<DocumentSummary>,
}

#[derive(Debug, Deserialize)]
struct DocumentSummary {
    document_number: String,
}

impl FederalRegisterClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, AppError> {
        tokio::time::sleep(provider_delay(Provider::FederalRegister)).await;
        with_backoff(|| async {
            let response = self
                .http
                .get(url)
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

    /// Fetches raw body text, retrying once on network error (a quirk of
    /// the original Federal Register client rather than the uniform
    /// backoff policy the other calls use).
    async fn fetch_raw_text(&self, raw_text_url: &str, cache: &TextCache) -> Result<String, AppError> {
        if let Some(cached) = cache.0.lock().expect("text cache mutex poisoned").get(raw_text_url) {
            return Ok(cached.clone());
        }

        let mut attempts = 0;
        let cleaned = loop {
            attempts += 1;
            match self.http.get(raw_text_url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(AppError::UpstreamHttp {
                            status: status.as_u16(),
                            message: format!("fetching raw text from {raw_text_url}"),
                        });
                    }
                    let body = response
                        .text()
                        .await
                        .map_err(|e| AppError::UpstreamNetwork(e.to_string()))?;
                    break crate::html::clean_html(&body);
                }
                Err(_) if attempts < 2 => continue,
                Err(e) => return Err(AppError::UpstreamNetwork(e.to_string())),
            }
        };

        cache
            .0
            .lock()
            .expect("text cache mutex poisoned")
            .insert(raw_text_url.to_string(), cleaned.clone());
        Ok(cleaned)
    }

    #[instrument(skip(self, cache))]
    pub async fn fetch_document(&self, document_number: &str, cache: &TextCache) -> Result<Document, AppError> {
        let doc: DocumentResponse = self
            .get_json(&format!("{}/documents/{document_number}", self.base_url))
            .await?;

        let content = match &doc.raw_text_url {
            Some(url) => self.fetch_raw_text(url, cache).await?,
            None => String::new(),
        };

        let mut metadata: HashMap<String, Value> = HashMap::new();
        if let Some(n) = doc.executive_order_number {
            metadata.insert("executive_order_number".to_string(), json!(n));
        }
        if let Some(president) = &doc.president {
            metadata.insert("president".to_string(), json!(president.name));
        }
        if let Some(signing_date) = &doc.signing_date {
            metadata.insert("signing_date".to_string(), json!(signing_date));
        }
        if !doc.agencies.is_empty() {
            metadata.insert(
                "agencies_or_entities".to_string(),
                json!(doc.agencies.iter().map(|a| a.name.clone()).collect::<Vec<_>>()),
            );
        }
        if let Some(citation) = &doc.citation {
            metadata.insert("citation".to_string(), json!(citation));
        }

        let date = doc
            .signing_date
            .clone()
            .or(doc.publication_date.clone())
            .unwrap_or_default();

        let mut document = Document::new(
            doc.document_number.clone(),
            doc.title,
            date,
            DocumentKind::ExecutiveOrder,
            content,
            doc.html_url.unwrap_or_default(),
        );
        document.metadata = metadata;
        Ok(document)
    }

    /// Lists Executive Order document numbers signed within
    /// `[start_date, end_date]`, following `next_page_url` pagination.
    #[instrument(skip(self))]
    pub async fn list_document_numbers(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<String>, AppError> {
        let mut url = format!(
            "{}/documents.json?conditions[type][]=PRESDOCU&conditions[presidential_document_type][]=executive_order&conditions[signing_date][gte]={start_date}&conditions[signing_date][lte]={end_date}",
            self.base_url
        );
        let mut ids = Vec::new();
        loop {
            let page: DocumentListResponse = self.get_json(&url).await?;
            ids.extend(page.results.into_iter().map(|d| d.document_number));
            match page.next_page_url {
                Some(next) => url = next,
                None => break,
            }
        }
        Ok(ids)
    }
}

impl Default for FederalRegisterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_federal_register_v1() {
        let client = FederalRegisterClient::new();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }
}
