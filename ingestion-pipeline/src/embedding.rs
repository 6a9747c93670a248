//! C5: embedding generator, grounded in the teacher's
//! `generate_embedding` helper, generalized to batch + per-text fallback.
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_openai::Client;
use common::error::AppError;
use common::storage::vector_store::EMBEDDING_DIMENSION;
use common::utils::retry::with_backoff;
use tracing::{instrument, warn};

const DEFAULT_MODEL: &str = "text-embedding-3-small";

pub struct EmbeddingGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl EmbeddingGenerator {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, AppError> {
        with_backoff(|| async {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input([text])
                .build()
                .map_err(AppError::from)?;
            let response = self.client.embeddings().create(request).await?;
            let embedding = response
                .data
                .into_iter()
                .next()
                .ok_or_else(|| AppError::Internal("no embedding data received".into()))?
                .embedding;
            validate_dimension(&embedding)?;
            Ok(embedding)
        })
        .await
    }

    /// Attempts all `texts` in one call; on transient failure, falls back to
    /// one call per text so a single poison input cannot sink the batch
    /// (spec.md §4.5).
    #[instrument(skip(self, texts), fields(batch_len = texts.len()))]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch_result = with_backoff(|| async {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(texts.to_vec())
                .build()
                .map_err(AppError::from)?;
            let response = self.client.embeddings().create(request).await?;
            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);
            let vectors: Vec<Vec<f32>> = embeddings.into_iter().map(|e| e.embedding).collect();
            for v in &vectors {
                validate_dimension(v)?;
            }
            Ok(vectors)
        })
        .await;

        match batch_result {
            Ok(vectors) if vectors.len() == texts.len() => Ok(vectors),
            _ => {
                warn!("embedding batch call failed or returned a mismatched count, falling back to per-text calls");
                let mut vectors = Vec::with_capacity(texts.len());
                for text in texts {
                    vectors.push(self.embed_one(text).await?);
                }
                Ok(vectors)
            }
        }
    }
}

fn validate_dimension(embedding: &[f32]) -> Result<(), AppError> {
    if embedding.len() != EMBEDDING_DIMENSION {
        return Err(AppError::EmbeddingDimensionMismatch {
            expected: EMBEDDING_DIMENSION,
            actual: embedding.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_dimension_rejects_mismatch() {
        let short = vec![0.0f32; 10];
        assert!(matches!(
            validate_dimension(&short),
            Err(AppError::EmbeddingDimensionMismatch { .. })
        ));
        let correct = vec![0.0f32; EMBEDDING_DIMENSION];
        assert!(validate_dimension(&correct).is_ok());
    }
}
