//! Query-time retrieval: embed the query, search the vector index.

use crate::embedding::Embedder;
use crate::types::{AppError, Result, RetrievalResult};
use crate::vectorstore::VectorStore;
use std::sync::Arc;

/// Orchestrates the embedder and vector index for the query path.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    namespace: String,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, namespace: String) -> Self {
        Self {
            embedder,
            store,
            namespace,
        }
    }

    /// Fetch the top-`k` candidate chunks for a query.
    ///
    /// The query is embedded exactly once per call. Returns at most `k`
    /// results ordered by similarity score descending; fewer than `k`
    /// matches returns whatever is available. An unreachable index is a
    /// `RetrievalError` -- an empty result only ever means "no matches".
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if query.trim().is_empty() {
            return Err(AppError::Validation("Query must not be empty".into()));
        }

        let embeddings = self.embedder.embed_batch(&[query.to_string()]).await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("Embedder returned no vector for query".into()))?;

        let mut results = self.store.query(&self.namespace, &query_embedding, k).await?;

        // Backends are expected to return score-descending order already;
        // enforce it so downstream tie-breaking stays deterministic.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        tracing::debug!(
            namespace = %self.namespace,
            k = k,
            matches = results.len(),
            "Retrieval completed"
        );

        Ok(results)
    }
}
