//! C7: progress tracker.
//!
//! One embedded SurrealDB file per document type (spec.md §4.7, §6.3), the
//! same "single-file store per concern" shape as the teacher's
//! `SurrealDbClient`, just pointed at `surrealkv://` instead of a shared
//! remote instance. `documents` holds one row per `(document_type, id)`;
//! `runs` holds one row per orchestrator invocation.
use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::storage::db::SurrealDbClient;
use crate::storage::types::document::DocumentKind;
use crate::storage::types::progress_record::{
    FailedDocument, IngestionRun, ProgressRecord, ProgressState, RunOutcome, Statistics,
};

const DOCUMENTS_TABLE: &str = "documents";
const RUNS_TABLE: &str = "runs";

pub struct Tracker {
    db: SurrealDbClient,
    document_type: &'static str,
}

impl Tracker {
    /// `data_dir/<tracker_file_stem>.db`, matching the original's
    /// one-sqlite-file-per-type convention (spec.md §6.3).
    pub fn file_name_for(kind: DocumentKind) -> String {
        format!("{}.db", kind.tracker_file_stem())
    }

    #[instrument(skip_all, fields(document_type = %kind.type_label()))]
    pub async fn open(kind: DocumentKind, data_dir: &str) -> Result<Self, AppError> {
        let path = format!("{data_dir}/{}", Self::file_name_for(kind));
        let address = format!("surrealkv://{path}");
        let db = SurrealDbClient::connect(&address, "governmentreporter", "tracker").await?;
        let tracker = Self {
            db,
            document_type: kind.type_label(),
        };
        tracker.define_schema().await?;
        Ok(tracker)
    }

    pub async fn open_in_memory(kind: DocumentKind) -> Result<Self, AppError> {
        let db = SurrealDbClient::memory("governmentreporter", "tracker").await?;
        let tracker = Self {
            db,
            document_type: kind.type_label(),
        };
        tracker.define_schema().await?;
        Ok(tracker)
    }

    async fn define_schema(&self) -> Result<(), AppError> {
        self.db
            .client
            .query(
                "DEFINE TABLE IF NOT EXISTS documents SCHEMALESS;
                 DEFINE TABLE IF NOT EXISTS runs SCHEMALESS;",
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, metadata))]
    pub async fn add_document(
        &self,
        id: &str,
        metadata: Option<Value>,
    ) -> Result<(), AppError> {
        let record = ProgressRecord::new(id, self.document_type, metadata);
        let _: Option<ProgressRecord> = self
            .db
            .client
            .upsert((DOCUMENTS_TABLE, id))
            .content(record)
            .await?;
        Ok(())
    }

    pub async fn mark_processing(&self, id: &str) -> Result<(), AppError> {
        self.transition(id, ProgressState::Processing, None, None)
            .await
    }

    pub async fn mark_completed(&self, id: &str, processing_time_ms: i64) -> Result<(), AppError> {
        self.transition(
            id,
            ProgressState::Completed,
            None,
            Some(processing_time_ms),
        )
        .await
    }

    pub async fn mark_failed(&self, id: &str, error: &str) -> Result<(), AppError> {
        self.transition(id, ProgressState::Failed, Some(error.to_string()), None)
            .await
    }

    async fn transition(
        &self,
        id: &str,
        state: ProgressState,
        error: Option<String>,
        processing_time_ms: Option<i64>,
    ) -> Result<(), AppError> {
        let existing: Option<ProgressRecord> =
            self.db.client.select((DOCUMENTS_TABLE, id)).await?;
        if let Some(record) = &existing {
            if record.state == ProgressState::Completed {
                return Err(AppError::Validation(format!(
                    "document {id} is already completed; transition to {state:?} rejected"
                )));
            }
        }
        let mut record = existing.unwrap_or_else(|| ProgressRecord::new(id, self.document_type, None));
        let now = Utc::now();
        record.state = state;
        record.updated_at = now;
        if let Some(ms) = processing_time_ms {
            record.processing_time_ms = Some(ms);
        }
        if state == ProgressState::Failed {
            record.last_error = error;
            record.failed_at = Some(now);
        }
        let _: Option<ProgressRecord> = self
            .db
            .client
            .upsert((DOCUMENTS_TABLE, id))
            .content(record)
            .await?;
        Ok(())
    }

    /// Flips every `processing` row back to `pending` (spec.md §4.7, §11):
    /// a crash mid-document leaves no row stuck in `processing` forever.
    /// Unconditional by design — see SPEC_FULL.md §11 for the caveat this
    /// also resets rows from a *concurrently running* process, which the
    /// CLI avoids by not running two ingestions against one tracker file.
    #[instrument(skip(self))]
    pub async fn reset_processing_status(&self) -> Result<usize, AppError> {
        let mut response = self
            .db
            .client
            .query(
                "UPDATE documents SET state = 'pending', updated_at = time::now() \
                 WHERE state = 'processing' RETURN BEFORE",
            )
            .await?;
        let reset: Vec<ProgressRecord> = response.take(0)?;
        Ok(reset.len())
    }

    pub async fn get_pending_documents(&self) -> Result<Vec<String>, AppError> {
        let mut response = self
            .db
            .client
            .query("SELECT id FROM documents WHERE state = 'pending' ORDER BY created_at ASC")
            .await?;
        let rows: Vec<ProgressRecord> = response.take(0)?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    pub async fn is_completed(&self, id: &str) -> Result<bool, AppError> {
        let record: Option<ProgressRecord> = self.db.client.select((DOCUMENTS_TABLE, id)).await?;
        Ok(matches!(
            record,
            Some(ProgressRecord {
                state: ProgressState::Completed,
                ..
            })
        ))
    }

    #[instrument(skip(self))]
    pub async fn get_statistics(&self) -> Result<Statistics, AppError> {
        let mut response = self.db.client.query("SELECT * FROM documents").await?;
        let rows: Vec<ProgressRecord> = response.take(0)?;

        let total = rows.len();
        let completed = rows
            .iter()
            .filter(|r| r.state == ProgressState::Completed)
            .count();
        let failed_rows: Vec<_> = rows
            .iter()
            .filter(|r| r.state == ProgressState::Failed)
            .collect();
        let failed = failed_rows.len();
        let pending = rows
            .iter()
            .filter(|r| matches!(r.state, ProgressState::Pending | ProgressState::Processing))
            .count();

        let success_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };

        let timed: Vec<i64> = rows.iter().filter_map(|r| r.processing_time_ms).collect();
        let avg_processing_time_ms = if timed.is_empty() {
            None
        } else {
            Some(timed.iter().sum::<i64>() as f64 / timed.len() as f64)
        };

        let failed_documents = failed_rows
            .into_iter()
            .map(|r| FailedDocument {
                id: r.id.clone(),
                error: r.last_error.clone().unwrap_or_default(),
                failed_at: r.failed_at,
            })
            .collect();

        Ok(Statistics {
            total,
            completed,
            failed,
            pending,
            success_rate,
            avg_processing_time_ms,
            failed_documents,
        })
    }

    #[instrument(skip(self, params))]
    pub async fn start_run(
        &self,
        document_type: &str,
        start_date: &str,
        end_date: &str,
        params: Value,
    ) -> Result<i64, AppError> {
        let mut response = self.db.client.query("SELECT * FROM runs").await?;
        let existing: Vec<IngestionRun> = response.take(0)?;
        let run_id = existing.len() as i64 + 1;

        let run = IngestionRun {
            run_id,
            document_type: document_type.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            params,
            started_at: Utc::now(),
            ended_at: None,
            outcome: None,
        };
        let _: Option<IngestionRun> = self
            .db
            .client
            .create((RUNS_TABLE, run_id as i64))
            .content(run)
            .await?;
        Ok(run_id)
    }

    pub async fn end_run(&self, run_id: i64, outcome: RunOutcome) -> Result<(), AppError> {
        let existing: Option<IngestionRun> = self.db.client.select((RUNS_TABLE, run_id)).await?;
        let Some(mut run) = existing else {
            return Err(AppError::NotFound(format!("run {run_id}")));
        };
        run.ended_at = Some(Utc::now());
        run.outcome = Some(outcome);
        let _: Option<IngestionRun> = self
            .db
            .client
            .update((RUNS_TABLE, run_id))
            .content(run)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_complete_document_updates_statistics() {
        let tracker = Tracker::open_in_memory(DocumentKind::ScotusOpinion)
            .await
            .unwrap();
        tracker.add_document("doc-1", None).await.unwrap();
        tracker.mark_processing("doc-1").await.unwrap();
        tracker.mark_completed("doc-1", 120).await.unwrap();

        let stats = tracker.get_statistics().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 0);
        assert!(tracker.is_completed("doc-1").await.unwrap());
    }

    #[tokio::test]
    async fn transition_out_of_completed_is_rejected() {
        let tracker = Tracker::open_in_memory(DocumentKind::ScotusOpinion)
            .await
            .unwrap();
        tracker.add_document("doc-done", None).await.unwrap();
        tracker.mark_processing("doc-done").await.unwrap();
        tracker.mark_completed("doc-done", 50).await.unwrap();

        let result = tracker.mark_failed("doc-done", "late retry").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(tracker.is_completed("doc-done").await.unwrap());
    }

    #[tokio::test]
    async fn failed_document_is_tracked_with_error() {
        let tracker = Tracker::open_in_memory(DocumentKind::ExecutiveOrder)
            .await
            .unwrap();
        tracker.add_document("doc-2", None).await.unwrap();
        tracker.mark_processing("doc-2").await.unwrap();
        tracker.mark_failed("doc-2", "upstream timeout").await.unwrap();

        let stats = tracker.get_statistics().await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.failed_documents[0].error, "upstream timeout");
    }

    #[tokio::test]
    async fn reset_processing_status_moves_rows_back_to_pending() {
        let tracker = Tracker::open_in_memory(DocumentKind::ScotusOpinion)
            .await
            .unwrap();
        tracker.add_document("doc-3", None).await.unwrap();
        tracker.mark_processing("doc-3").await.unwrap();

        let reset = tracker.reset_processing_status().await.unwrap();
        assert_eq!(reset, 1);

        let pending = tracker.get_pending_documents().await.unwrap();
        assert_eq!(pending, vec!["doc-3".to_string()]);
    }

    #[tokio::test]
    async fn run_lifecycle_records_outcome() {
        let tracker = Tracker::open_in_memory(DocumentKind::ScotusOpinion)
            .await
            .unwrap();
        let run_id = tracker
            .start_run("scotus_opinion", "2024-01-01", "2024-01-31", Value::Null)
            .await
            .unwrap();
        assert_eq!(run_id, 1);
        tracker.end_run(run_id, RunOutcome::Completed).await.unwrap();
    }
}
