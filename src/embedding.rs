//! Embedding service client.
//!
//! Maps chunk and query strings to fixed-dimension vectors via an external
//! embedding service. The capability is behind a trait so tests can
//! substitute deterministic fakes without network access.

use crate::config::EmbeddingConfig;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capability interface for text embedding.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in the same
    /// order. No side effects beyond the external call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output dimension of the configured model.
    fn dimensions(&self) -> usize;
}

// ============================================================================
// REST Embedder (OpenAI-compatible /embeddings endpoint)
// ============================================================================

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

/// HTTP client for an OpenAI-compatible embedding endpoint.
pub struct RestEmbedder {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl RestEmbedder {
    /// Build a client with the configured request timeout. A timed-out
    /// call surfaces as an embedding service error like any other upstream
    /// failure.
    pub fn new(config: &EmbeddingConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl Embedder for RestEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.http.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Embedding service returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Malformed embedding response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Embedding service returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // The service reports an index per vector; order by it rather than
        // trusting response order.
        let mut entries = parsed.data;
        entries.sort_by_key(|e| e.index);

        let mut vectors = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.embedding.len() != self.dimensions {
                return Err(AppError::Embedding(format!(
                    "Expected {}-dimensional embedding, got {}",
                    self.dimensions,
                    entry.embedding.len()
                )));
            }
            vectors.push(entry.embedding);
        }

        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
