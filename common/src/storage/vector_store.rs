//! C8: vector-store adapter.
//!
//! Generalizes the teacher's `SurrealDbClient` connection pattern onto
//! SurrealDB's native HNSW vector index (`DEFINE INDEX ... HNSW DIMENSION`,
//! `<|k,ef|>` KNN operator) instead of introducing a separate vector-database
//! client crate. One table per collection; `VECTOR_STORE_URL` selects the
//! backing engine (local `surrealkv://` file by default, per spec.md §11).
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::db::SurrealDbClient;
use crate::storage::types::payload::Payload;

pub const EMBEDDING_DIMENSION: usize = 1536;
const HNSW_M: usize = 16;
const HNSW_EF_CONSTRUCTION: usize = 200;
const DEFAULT_EF_SEARCH: usize = 40;

/// A single retrieval hit (spec.md §4.8 search).
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPoint {
    id: surrealdb::sql::Thing,
    original_id: String,
    embedding: Vec<f32>,
    text: String,
    metadata: BTreeMap<String, Value>,
}

pub struct VectorStore {
    db: SurrealDbClient,
}

impl VectorStore {
    pub async fn connect(address: &str) -> Result<Self, AppError> {
        let db = SurrealDbClient::connect(address, "governmentreporter", "vectors").await?;
        Ok(Self { db })
    }

    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let db = SurrealDbClient::memory("governmentreporter", "vectors").await?;
        Ok(Self { db })
    }

    /// `uuidv5(DNS_NAMESPACE, original_id)`: stable across re-ingestion runs,
    /// so re-upserting a chunk overwrites its existing point (spec.md §4.8,
    /// testable property 5). `original_id` travels into the point so lookups
    /// by domain id don't need to recompute the UUID.
    pub fn point_id(original_id: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, original_id.as_bytes())
    }

    #[instrument(skip(self))]
    pub async fn create_collection_if_absent(&self, collection: &str) -> Result<(), AppError> {
        let query = format!(
            "DEFINE TABLE IF NOT EXISTS {collection} SCHEMALESS;
             DEFINE INDEX IF NOT EXISTS {collection}_embedding_idx ON {collection}
               FIELDS embedding HNSW DIMENSION {EMBEDDING_DIMENSION} DIST COSINE
               M {HNSW_M} EFC {HNSW_EF_CONSTRUCTION};"
        );
        self.db.client.query(query).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_collection(&self, collection: &str) -> Result<(), AppError> {
        self.db
            .client
            .query(format!("REMOVE TABLE IF EXISTS {collection}"))
            .await?;
        Ok(())
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        let mut response = self.db.client.query("INFO FOR DB").await?;
        let info: Option<Value> = response.take(0)?;
        let tables = info
            .and_then(|v| v.get("tables").cloned())
            .and_then(|v| v.as_object().cloned())
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();
        Ok(tables)
    }

    pub async fn collection_exists(&self, collection: &str) -> Result<bool, AppError> {
        Ok(self.list_collections().await?.contains(&collection.to_string()))
    }

    pub async fn collection_info(&self, collection: &str) -> Result<usize, AppError> {
        let mut response = self
            .db
            .client
            .query(format!("SELECT * FROM {collection}"))
            .await?;
        let rows: Vec<StoredPoint> = response.take(0)?;
        Ok(rows.len())
    }

    /// Upserts a batch of `(original_id, embedding, payload)` points.
    /// Per-item failures (dimension mismatch, invalid payload) are collected
    /// and do not abort the rest of the batch, matching spec.md §4.8's
    /// per-batch isolation requirement.
    #[instrument(skip(self, points), fields(collection, batch_len = points.len()))]
    pub async fn store_batch(
        &self,
        collection: &str,
        points: Vec<(String, Vec<f32>, Payload)>,
    ) -> Result<Vec<AppError>, AppError> {
        let mut errors = Vec::new();
        for (original_id, embedding, payload) in points {
            if embedding.len() != EMBEDDING_DIMENSION {
                let err = AppError::EmbeddingDimensionMismatch {
                    expected: EMBEDDING_DIMENSION,
                    actual: embedding.len(),
                };
                warn!(original_id, "skipping point: {err}");
                errors.push(err);
                continue;
            }
            if !payload.is_valid() {
                let err = AppError::Validation(format!("invalid payload for {original_id}"));
                warn!(original_id, "skipping point: {err}");
                errors.push(err);
                continue;
            }
            let point_id = Self::point_id(&original_id);
            let point = StoredPoint {
                id: surrealdb::sql::Thing::from((collection, point_id.to_string().as_str())),
                original_id,
                embedding,
                text: payload.text,
                metadata: payload.metadata,
            };
            let result: Result<Option<StoredPoint>, _> = self
                .db
                .client
                .upsert((collection, point_id.to_string()))
                .content(point)
                .await;
            if let Err(e) = result {
                errors.push(AppError::Store(e.to_string()));
            }
        }
        Ok(errors)
    }

    pub async fn get(&self, collection: &str, original_id: &str) -> Result<Option<Payload>, AppError> {
        let point_id = Self::point_id(original_id);
        let stored: Option<StoredPoint> = self
            .db
            .client
            .select((collection, point_id.to_string()))
            .await?;
        Ok(stored.map(|p| Payload {
            id: p.original_id,
            text: p.text,
            metadata: p.metadata,
        }))
    }

    pub async fn exists(&self, collection: &str, original_id: &str) -> Result<bool, AppError> {
        Ok(self.get(collection, original_id).await?.is_some())
    }

    /// KNN search via SurrealDB's `<|k,ef|>` vector index operator, with an
    /// optional post-filter on `score_threshold` (spec.md §4.8 search).
    #[instrument(skip(self, query_embedding))]
    pub async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, AppError> {
        if query_embedding.len() != EMBEDDING_DIMENSION {
            return Err(AppError::EmbeddingDimensionMismatch {
                expected: EMBEDDING_DIMENSION,
                actual: query_embedding.len(),
            });
        }
        let query = format!(
            "SELECT *, vector::similarity::cosine(embedding, $query_embedding) AS score \
             FROM {collection} WHERE embedding <|{top_k},{DEFAULT_EF_SEARCH}|> $query_embedding \
             ORDER BY score DESC"
        );
        let mut response = self
            .db
            .client
            .query(query)
            .bind(("query_embedding", query_embedding.to_vec()))
            .await?;

        #[derive(Deserialize)]
        struct ScoredPoint {
            #[serde(flatten)]
            point: StoredPoint,
            score: f32,
        }
        let rows: Vec<ScoredPoint> = response.take(0)?;

        let hits = rows
            .into_iter()
            .filter(|row| score_threshold.map(|t| row.score >= t).unwrap_or(true))
            .map(|row| SearchHit {
                id: row.point.original_id.clone(),
                score: row.score,
                payload: Payload {
                    id: row.point.original_id,
                    text: row.point.text,
                    metadata: row.point.metadata,
                },
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(seed: f32) -> Vec<f32> {
        let mut v = vec![0.0f32; EMBEDDING_DIMENSION];
        v[0] = seed;
        v
    }

    fn payload(id: &str) -> Payload {
        Payload {
            id: id.to_string(),
            text: format!("text for {id}"),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn point_id_is_deterministic() {
        assert_eq!(VectorStore::point_id("doc-1_chunk_0"), VectorStore::point_id("doc-1_chunk_0"));
        assert_ne!(VectorStore::point_id("doc-1_chunk_0"), VectorStore::point_id("doc-1_chunk_1"));
    }

    #[tokio::test]
    async fn store_and_get_round_trips_payload() {
        let store = VectorStore::connect_in_memory().await.unwrap();
        store.create_collection_if_absent("test_collection").await.unwrap();

        let errors = store
            .store_batch(
                "test_collection",
                vec![("doc-1_chunk_0".to_string(), embedding(1.0), payload("doc-1_chunk_0"))],
            )
            .await
            .unwrap();
        assert!(errors.is_empty());

        let got = store.get("test_collection", "doc-1_chunk_0").await.unwrap();
        assert_eq!(got.unwrap().id, "doc-1_chunk_0");
        assert!(store.exists("test_collection", "doc-1_chunk_0").await.unwrap());
        assert!(!store.exists("test_collection", "missing").await.unwrap());
    }

    #[tokio::test]
    async fn store_batch_isolates_dimension_mismatch() {
        let store = VectorStore::connect_in_memory().await.unwrap();
        store.create_collection_if_absent("test_collection").await.unwrap();

        let errors = store
            .store_batch(
                "test_collection",
                vec![
                    ("good".to_string(), embedding(1.0), payload("good")),
                    ("bad".to_string(), vec![0.0; 10], payload("bad")),
                ],
            )
            .await
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AppError::EmbeddingDimensionMismatch { .. }));
        assert!(store.exists("test_collection", "good").await.unwrap());
        assert!(!store.exists("test_collection", "bad").await.unwrap());
    }

    #[tokio::test]
    async fn collection_lifecycle() {
        let store = VectorStore::connect_in_memory().await.unwrap();
        assert!(!store.collection_exists("scotus").await.unwrap());
        store.create_collection_if_absent("scotus").await.unwrap();
        assert!(store.collection_exists("scotus").await.unwrap());
        store.delete_collection("scotus").await.unwrap();
    }
}
