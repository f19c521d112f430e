//! Cross-encoder reranking.
//!
//! Refines the retrieval candidate set by scoring (query, candidate) pairs
//! against an external cross-encoder service. Output is deterministic for
//! identical inputs: exact score ties keep their original retrieval order.

use crate::config::{RerankConfig, RerankFallback};
use crate::types::{AppError, RerankedResult, Result, RetrievalResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Capability interface for pairwise relevance scoring.
#[async_trait]
pub trait RerankService: Send + Sync {
    /// Score each text against the query. Returns one score per input,
    /// in input order.
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>>;
}

// ============================================================================
// REST Rerank Service
// ============================================================================

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
}

#[derive(Deserialize)]
struct RerankResponse {
    scores: Vec<f32>,
}

/// HTTP client for a hosted cross-encoder scoring endpoint.
pub struct RestReranker {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl RestReranker {
    pub fn new(endpoint: String, config: &RerankConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl RerankService for RestReranker {
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        let mut request = self.http.post(&self.endpoint).json(&RerankRequest {
            model: &self.model,
            query,
            documents: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Rerank(format!("Rerank request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Rerank(format!(
                "Rerank service returned {}: {}",
                status, body
            )));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| AppError::Rerank(format!("Malformed rerank response: {}", e)))?;

        if parsed.scores.len() != texts.len() {
            return Err(AppError::Rerank(format!(
                "Rerank service returned {} scores for {} documents",
                parsed.scores.len(),
                texts.len()
            )));
        }

        Ok(parsed.scores)
    }
}

// ============================================================================
// Reranker Orchestration
// ============================================================================

/// Applies cross-encoder scores to a candidate set.
pub struct Reranker {
    service: Arc<dyn RerankService>,
    fallback: RerankFallback,
}

impl Reranker {
    pub fn new(service: Arc<dyn RerankService>, fallback: RerankFallback) -> Self {
        Self { service, fallback }
    }

    /// Rerank `candidates` and keep the best `top_n`.
    ///
    /// Output length is always `min(top_n, candidates.len())`, ordered by
    /// rerank score descending with original retrieval order breaking
    /// exact ties. On service failure the configured fallback applies:
    /// `Error` propagates the failure, `Passthrough` answers from the
    /// unreranked top-N (logged at WARN, never silent).
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievalResult>,
        top_n: usize,
    ) -> Result<Vec<RerankedResult>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();

        let scores = match self.service.score(query, &texts).await {
            Ok(scores) => scores,
            Err(err) => match self.fallback {
                RerankFallback::Error => return Err(err),
                RerankFallback::Passthrough => {
                    tracing::warn!(
                        error = %err,
                        "Rerank service failed; falling back to retrieval order"
                    );
                    return Ok(candidates
                        .into_iter()
                        .enumerate()
                        .take(top_n)
                        .map(|(rank, c)| RerankedResult::from_retrieval(rank, c))
                        .collect());
                }
            },
        };

        let mut reranked: Vec<RerankedResult> = candidates
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(rank, (c, rerank_score))| RerankedResult {
                chunk_id: c.chunk_id,
                retrieval_score: c.score,
                rerank_score,
                original_rank: rank,
                text: c.text,
                metadata: c.metadata,
            })
            .collect();

        reranked.sort_by(|a, b| {
            b.rerank_score
                .partial_cmp(&a.rerank_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.original_rank.cmp(&b.original_rank))
        });
        reranked.truncate(top_n);

        Ok(reranked)
    }
}
