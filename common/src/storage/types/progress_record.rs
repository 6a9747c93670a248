use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::flexible_id::{deserialize_numeric_id, deserialize_string_id};

/// `documents` table row (spec.md §3, §4.7): one row per
/// `(document_type, document_id)`. `state` transitions form the DAG
/// `Pending -> Processing -> {Completed, Failed}`; `Failed -> Pending` is
/// permitted as an explicit retry; `Completed -> *` is forbidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(deserialize_with = "deserialize_string_id")]
    pub id: String,
    pub document_type: String,
    pub state: ProgressState,
    pub last_error: Option<String>,
    pub processing_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub failed_at: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProgressRecord {
    pub fn new(id: impl Into<String>, document_type: &str, metadata: Option<Value>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            document_type: document_type.to_string(),
            state: ProgressState::Pending,
            last_error: None,
            processing_time_ms: None,
            created_at: now,
            updated_at: now,
            failed_at: None,
            metadata,
        }
    }
}

/// `runs` table row (spec.md §3, §4.7): one row per orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRun {
    #[serde(deserialize_with = "deserialize_numeric_id")]
    pub run_id: i64,
    pub document_type: String,
    pub start_date: String,
    pub end_date: String,
    pub params: Value,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub outcome: Option<RunOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Aborted,
}

/// Aggregate produced by `Tracker::get_statistics` (spec.md §4.7).
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub pending: usize,
    pub success_rate: f64,
    pub avg_processing_time_ms: Option<f64>,
    pub failed_documents: Vec<FailedDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub id: String,
    pub error: String,
    pub failed_at: Option<DateTime<Utc>>,
}
