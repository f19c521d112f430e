//! Embedded in-memory vector store.
//!
//! Cosine similarity over a namespace → chunk map. Data is not persisted;
//! this backend serves local development and the test suite. Namespaces
//! are created implicitly on first upsert, matching the behavior of
//! managed indexes.

use super::VectorStore;
use crate::types::{AppError, IndexedChunk, RetrievalResult, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

pub struct InMemoryVectorStore {
    namespaces: RwLock<HashMap<String, HashMap<String, IndexedChunk>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn upsert(&self, namespace: &str, chunks: &[IndexedChunk]) -> Result<usize> {
        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(AppError::Retrieval(format!(
                    "Chunk '{}' has an empty embedding",
                    chunk.id
                )));
            }
        }

        let mut namespaces = self.namespaces.write();
        let ns = namespaces.entry(namespace.to_string()).or_default();
        for chunk in chunks {
            ns.insert(chunk.id.clone(), chunk.clone());
        }

        Ok(chunks.len())
    }

    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let namespaces = self.namespaces.read();
        let Some(ns) = namespaces.get(namespace) else {
            // Unknown namespace means nothing was ingested yet; that is
            // "no matches", not an index failure.
            return Ok(Vec::new());
        };

        let mut results: Vec<RetrievalResult> = ns
            .values()
            .map(|chunk| RetrievalResult {
                chunk_id: chunk.id.clone(),
                score: Self::cosine_similarity(embedding, &chunk.embedding),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        results.truncate(k);

        Ok(results)
    }

    async fn delete(&self, namespace: &str, ids: &[String]) -> Result<usize> {
        let mut namespaces = self.namespaces.write();
        let Some(ns) = namespaces.get_mut(namespace) else {
            return Ok(0);
        };

        let mut removed = 0;
        for id in ids {
            if ns.remove(id).is_some() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn count(&self, namespace: &str) -> Result<usize> {
        let namespaces = self.namespaces.read();
        Ok(namespaces.get(namespace).map_or(0, |ns| ns.len()))
    }
}
