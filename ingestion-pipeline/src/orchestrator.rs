//! C9: ingestion orchestrator. Drives list -> dedupe -> per-document
//! fetch/validate/chunk/extract/embed -> batch upsert -> statistics.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use chunking::chunk_document;
use clients::{CourtListenerClient, FederalRegisterClient, TextCache};
use common::error::AppError;
use common::storage::tracker::Tracker;
use common::storage::types::document::{Document, DocumentKind};
use common::storage::types::payload::Payload;
use common::storage::types::progress_record::RunOutcome;
use common::storage::vector_store::VectorStore;
use common::utils::config::ChunkBudget;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::embedding::EmbeddingGenerator;
use crate::llm_extractor::LlmExtractor;
use crate::payload_assembler::assemble_payloads;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub batch_size: usize,
    pub worker_concurrency: usize,
    pub dry_run: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            worker_concurrency: 1,
            dry_run: false,
        }
    }
}

/// Final run summary, printed by the CLI after `run` returns (spec.md §8).
#[derive(Debug, Clone)]
pub struct IngestionStats {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl IngestionStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }

    pub fn rate_per_minute(&self) -> f64 {
        let minutes = self.elapsed.as_secs_f64() / 60.0;
        if minutes <= 0.0 {
            0.0
        } else {
            self.processed as f64 / minutes
        }
    }
}

/// Unifies the two thin upstream clients behind one interface so the
/// orchestrator's document loop is written once.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn list_ids(&self, start_date: &str, end_date: &str) -> Result<Vec<String>, AppError>;
    async fn fetch_document(&self, id: &str) -> Result<Document, AppError>;
}

#[async_trait]
impl SourceClient for CourtListenerClient {
    async fn list_ids(&self, start_date: &str, end_date: &str) -> Result<Vec<String>, AppError> {
        self.list_opinion_ids(start_date, end_date).await
    }

    async fn fetch_document(&self, id: &str) -> Result<Document, AppError> {
        CourtListenerClient::fetch_document(self, id).await
    }
}

/// Wraps [`FederalRegisterClient`] with the run's shared text cache so it
/// satisfies [`SourceClient`]'s single-argument `fetch_document`.
pub struct FederalRegisterSource {
    pub client: FederalRegisterClient,
    pub cache: TextCache,
}

#[async_trait]
impl SourceClient for FederalRegisterSource {
    async fn list_ids(&self, start_date: &str, end_date: &str) -> Result<Vec<String>, AppError> {
        self.client.list_document_numbers(start_date, end_date).await
    }

    async fn fetch_document(&self, id: &str) -> Result<Document, AppError> {
        self.client.fetch_document(id, &self.cache).await
    }
}

/// Document-type-specific validation applied after fetch (spec.md §4.9
/// step 5a, §7 testable property 8): SCOTUS opinions must resolve to the
/// Supreme Court's own docket.
fn validate_document(document: &Document) -> Result<(), AppError> {
    if document.kind != DocumentKind::ScotusOpinion {
        return Ok(());
    }
    let court_id = document
        .metadata
        .get("court_id")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if court_id != "scotus" {
        return Err(AppError::Validation(format!(
            "document {} has court_id '{court_id}', not scotus",
            document.id
        )));
    }
    Ok(())
}

pub struct Orchestrator<'a> {
    pub client: &'a dyn SourceClient,
    pub tracker: &'a Tracker,
    pub vector_store: &'a VectorStore,
    pub llm_extractor: &'a LlmExtractor,
    pub embedder: &'a EmbeddingGenerator,
    pub kind: DocumentKind,
    pub budget: ChunkBudget,
}

impl<'a> Orchestrator<'a> {
    #[instrument(skip(self), fields(document_type = %self.kind.type_label(), start_date, end_date))]
    pub async fn run(
        &self,
        start_date: &str,
        end_date: &str,
        config: OrchestratorConfig,
    ) -> Result<IngestionStats, AppError> {
        let started = Instant::now();

        self.tracker.reset_processing_status().await?;
        let run_id = self
            .tracker
            .start_run(
                self.kind.type_label(),
                start_date,
                end_date,
                json!({"batch_size": config.batch_size, "dry_run": config.dry_run}),
            )
            .await?;

        let ids = self.client.list_ids(start_date, end_date).await?;
        for id in &ids {
            self.tracker.add_document(id, None).await?;
        }

        self.vector_store
            .create_collection_if_absent(self.kind.vector_collection())
            .await?;

        let pending = self.tracker.get_pending_documents().await?;
        let total = pending.len();
        let mut processed = 0usize;
        let mut failed = 0usize;
        let mut skipped = 0usize;

        for batch in pending.chunks(config.batch_size.max(1)) {
            let results = stream::iter(batch.iter())
                .map(|id| self.process_one(id))
                .buffer_unordered(config.worker_concurrency.max(1))
                .collect::<Vec<_>>()
                .await;

            let mut batch_points = Vec::new();
            for outcome in results {
                match outcome {
                    DocumentOutcome::Completed(points) => {
                        processed += 1;
                        batch_points.extend(points);
                    }
                    DocumentOutcome::Skipped => skipped += 1,
                    DocumentOutcome::Failed => failed += 1,
                    // embedding dimension mismatch indicates model
                    // misconfiguration, not a per-document problem; abort
                    // the whole run rather than keep failing every
                    // remaining document one at a time (spec.md §7, §4.5).
                    DocumentOutcome::Fatal(err) => {
                        self.tracker.end_run(run_id, RunOutcome::Aborted).await.ok();
                        return Err(err);
                    }
                }
            }

            if !config.dry_run && !batch_points.is_empty() {
                let errors = self
                    .vector_store
                    .store_batch(self.kind.vector_collection(), batch_points)
                    .await?;
                for err in errors {
                    warn!("vector store rejected a point in this batch: {err}");
                }
            }
        }

        self.tracker.end_run(run_id, RunOutcome::Completed).await?;

        let stats = IngestionStats {
            processed,
            failed,
            skipped,
            total,
            elapsed: started.elapsed(),
        };
        info!(
            processed = stats.processed,
            failed = stats.failed,
            skipped = stats.skipped,
            success_rate = stats.success_rate(),
            "ingestion run complete"
        );
        Ok(stats)
    }

    async fn process_one(&self, id: &str) -> DocumentOutcome {
        let start = Instant::now();
        self.tracker.mark_processing(id).await.ok();

        match self.process_one_inner(id).await {
            Ok(points) => {
                let elapsed_ms = start.elapsed().as_millis() as i64;
                if self.tracker.mark_completed(id, elapsed_ms).await.is_err() {
                    warn!(id, "failed to record completion in tracker");
                }
                DocumentOutcome::Completed(points)
            }
            Err(AppError::Validation(msg)) => {
                self.tracker.mark_failed(id, &msg).await.ok();
                DocumentOutcome::Skipped
            }
            Err(err @ AppError::EmbeddingDimensionMismatch { .. }) => {
                self.tracker.mark_failed(id, &err.to_string()).await.ok();
                DocumentOutcome::Fatal(err)
            }
            Err(err) => {
                self.tracker.mark_failed(id, &err.to_string()).await.ok();
                DocumentOutcome::Failed
            }
        }
    }

    async fn process_one_inner(&self, id: &str) -> Result<Vec<(String, Vec<f32>, Payload)>, AppError> {
        let document = self.client.fetch_document(id).await?;
        validate_document(&document)?;

        let chunk_result = chunk_document(&document, &self.budget);
        if chunk_result.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let extraction_text = chunk_result
            .syllabus
            .as_deref()
            .unwrap_or(document.content.as_str());
        let llm_fields = self.llm_extractor.extract(&document, extraction_text).await?;

        let mut payloads = assemble_payloads(&document, &chunk_result.chunks, &llm_fields);
        let ingested_at = Utc::now().to_rfc3339();
        for payload in &mut payloads {
            payload
                .metadata
                .insert("ingested_at".to_string(), json!(ingested_at));
        }

        let texts: Vec<String> = payloads.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        Ok(payloads
            .into_iter()
            .zip(embeddings)
            .map(|(payload, embedding)| (payload.id.clone(), embedding, payload))
            .collect())
    }
}

enum DocumentOutcome {
    Completed(Vec<(String, Vec<f32>, Payload)>),
    Skipped,
    Failed,
    /// Aborts the whole run (spec.md §7: only `config_missing` and
    /// `embedding_dim_mismatch` are fatal).
    Fatal(AppError),
}
