use thiserror::Error;

/// Error taxonomy shared by every crate in the workspace.
///
/// Variant names follow the taxonomy in the ingestion specification: most
/// variants are per-document and are caught at the orchestrator's document
/// loop; `Config` and `EmbeddingDimensionMismatch` are the only two that are
/// meant to abort a whole run.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Configuration error: missing or invalid {0}")]
    Config(String),
    #[error("Upstream HTTP error ({status}): {message}")]
    UpstreamHttp { status: u16, message: String },
    #[error("Upstream network error: {0}")]
    UpstreamNetwork(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("LLM response was not valid JSON: {0}")]
    LlmInvalidResponse(String),
    #[error("LLM response violated its schema: {0}")]
    LlmSchemaViolation(String),
    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },
    #[error("Vector store error: {0}")]
    Store(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors the retry harness (C10) should treat as transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::UpstreamHttp { status, .. } => *status == 429 || *status >= 500,
            AppError::UpstreamNetwork(_) => true,
            AppError::OpenAi(_) => true,
            _ => false,
        }
    }
}
