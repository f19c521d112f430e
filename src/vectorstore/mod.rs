//! Vector index abstraction.
//!
//! The vector index is the single source of truth for retrievable chunk
//! embeddings; the pipeline holds no separate authoritative copy. All
//! operations are namespace-scoped so one index can back multiple
//! deployments. Backends implement a common trait:
//!
//! - [`memory::InMemoryVectorStore`] - embedded, cosine similarity; the
//!   local default and the test backend.
//! - [`rest::RestVectorStore`] - a managed remote index reached over HTTP.

pub mod memory;
pub mod rest;

use crate::config::IndexConfig;
use crate::types::{IndexedChunk, RetrievalResult, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Abstract trait for vector index operations.
///
/// Index failures surface as `AppError::Retrieval`; an empty query result
/// only ever means "no matches", never a swallowed failure.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of this backend, for logs and diagnostics.
    fn provider_name(&self) -> &'static str;

    /// Insert or overwrite chunks by id. Re-upserting an unchanged chunk
    /// id replaces the entry rather than duplicating it.
    ///
    /// Returns the number of chunks written.
    async fn upsert(&self, namespace: &str, chunks: &[IndexedChunk]) -> Result<usize>;

    /// Find the `k` nearest chunks to `embedding`, ordered by similarity
    /// score descending. Fewer than `k` matches is a valid outcome.
    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalResult>>;

    /// Delete chunks by id. Returns the number actually removed.
    async fn delete(&self, namespace: &str, ids: &[String]) -> Result<usize>;

    /// Number of chunks stored in the namespace.
    async fn count(&self, namespace: &str) -> Result<usize>;
}

/// Build a vector store from configuration: remote when an index URL is
/// set, the embedded in-memory store otherwise.
pub fn create_store(config: &IndexConfig, timeout: Duration) -> Result<Arc<dyn VectorStore>> {
    match &config.url {
        Some(url) => Ok(Arc::new(rest::RestVectorStore::new(
            url.clone(),
            config.api_key.clone(),
            timeout,
        )?)),
        None => Ok(Arc::new(memory::InMemoryVectorStore::new())),
    }
}
