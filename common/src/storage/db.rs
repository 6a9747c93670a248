use surrealdb::engine::any::{connect, Any};
use surrealdb::Surreal;

use crate::error::AppError;

/// Thin wrapper over a `surrealdb::engine::any` connection, the same shape
/// as the teacher's `SurrealDbClient`. The `any` engine lets the same code
/// path open an in-memory store for tests (`mem://`), a single embedded
/// file for the tracker (`surrealkv://path`), or a remote instance for the
/// vector store (`ws://host:port`).
#[derive(Clone)]
pub struct SurrealDbClient {
    pub client: Surreal<Any>,
}

impl SurrealDbClient {
    pub async fn connect(address: &str, namespace: &str, database: &str) -> Result<Self, AppError> {
        let db = connect(address).await?;
        db.use_ns(namespace).use_db(database).await?;
        Ok(Self { client: db })
    }

    pub async fn memory(namespace: &str, database: &str) -> Result<Self, AppError> {
        Self::connect("mem://", namespace, database).await
    }
}
