//! Remote vector index over HTTP.
//!
//! Speaks a small JSON protocol against a managed index:
//!
//! - `POST {base}/namespaces/{ns}/upsert`  `{ "vectors": [..] }`
//! - `POST {base}/namespaces/{ns}/query`   `{ "vector": [..], "top_k": k }`
//! - `POST {base}/namespaces/{ns}/delete`  `{ "ids": [..] }`
//! - `GET  {base}/namespaces/{ns}/stats`
//!
//! Any transport or non-2xx failure maps to `AppError::Retrieval`; the
//! request timeout bounds every call.

use super::VectorStore;
use crate::types::{AppError, ChunkMetadata, IndexedChunk, RetrievalResult, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    text: &'a str,
    metadata: &'a ChunkMetadata,
}

#[derive(Deserialize)]
struct UpsertResponse {
    upserted: usize,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    text: String,
    metadata: ChunkMetadata,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted: usize,
}

#[derive(Deserialize)]
struct StatsResponse {
    count: usize,
}

pub struct RestVectorStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestVectorStore {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, namespace: &str, op: &str) -> String {
        format!("{}/namespaces/{}/{}", self.base_url, namespace, op)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Retrieval(format!(
            "Vector index returned {}: {}",
            status, body
        )))
    }
}

#[async_trait]
impl VectorStore for RestVectorStore {
    fn provider_name(&self) -> &'static str {
        "rest"
    }

    async fn upsert(&self, namespace: &str, chunks: &[IndexedChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let body = UpsertRequest {
            vectors: chunks
                .iter()
                .map(|c| UpsertVector {
                    id: &c.id,
                    values: &c.embedding,
                    text: &c.text,
                    metadata: &c.metadata,
                })
                .collect(),
        };

        let response = self
            .authorize(self.http.post(self.url(namespace, "upsert")).json(&body))
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Vector index unreachable: {}", e)))?;

        let parsed: UpsertResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Malformed upsert response: {}", e)))?;

        Ok(parsed.upserted)
    }

    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let body = QueryRequest {
            vector: embedding,
            top_k: k,
        };

        let response = self
            .authorize(self.http.post(self.url(namespace, "query")).json(&body))
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Vector index unreachable: {}", e)))?;

        let parsed: QueryResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Malformed query response: {}", e)))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| RetrievalResult {
                chunk_id: m.id,
                score: m.score,
                text: m.text,
                metadata: m.metadata,
            })
            .collect())
    }

    async fn delete(&self, namespace: &str, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let response = self
            .authorize(
                self.http
                    .post(self.url(namespace, "delete"))
                    .json(&DeleteRequest { ids }),
            )
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Vector index unreachable: {}", e)))?;

        let parsed: DeleteResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Malformed delete response: {}", e)))?;

        Ok(parsed.deleted)
    }

    async fn count(&self, namespace: &str) -> Result<usize> {
        let response = self
            .authorize(self.http.get(self.url(namespace, "stats")))
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Vector index unreachable: {}", e)))?;

        let parsed: StatsResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Malformed stats response: {}", e)))?;

        Ok(parsed.count)
    }
}
