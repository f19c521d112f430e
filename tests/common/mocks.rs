//! Mock implementations for testing.
//!
//! Deterministic fakes for every external service the pipeline talks to,
//! shared across the integration test files.

use async_trait::async_trait;
use grail::embedding::Embedder;
use grail::llm::LLMClient;
use grail::rerank::RerankService;
use grail::types::{AppError, IndexedChunk, Result, RetrievalResult};
use grail::vectorstore::VectorStore;

// ============================================================================
// Embedder
// ============================================================================

/// Deterministic embedder: each vector component counts occurrences of a
/// keyword in the text, with a constant bias component so no vector is
/// ever zero. Texts sharing keywords with a query score higher under
/// cosine similarity, which is enough to drive realistic retrieval in
/// tests without a model.
pub struct FakeEmbedder {
    keywords: Vec<String>,
}

impl FakeEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut vector: Vec<f32> = self
                    .keywords
                    .iter()
                    .map(|kw| lower.matches(kw.as_str()).count() as f32)
                    .collect();
                vector.push(1.0);
                vector
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.keywords.len() + 1
    }
}

/// Embedder that always fails, for error propagation tests.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(AppError::Embedding("embedding service down".into()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

// ============================================================================
// Vector Store
// ============================================================================

/// Vector store where every operation fails, simulating an unreachable
/// index.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    async fn upsert(&self, _namespace: &str, _chunks: &[IndexedChunk]) -> Result<usize> {
        Err(AppError::Retrieval("vector index unreachable".into()))
    }

    async fn query(
        &self,
        _namespace: &str,
        _embedding: &[f32],
        _k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        Err(AppError::Retrieval("vector index unreachable".into()))
    }

    async fn delete(&self, _namespace: &str, _ids: &[String]) -> Result<usize> {
        Err(AppError::Retrieval("vector index unreachable".into()))
    }

    async fn count(&self, _namespace: &str) -> Result<usize> {
        Err(AppError::Retrieval("vector index unreachable".into()))
    }
}

// ============================================================================
// LLM
// ============================================================================

/// Mock LLM client with a canned response, or configured to always fail.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
}

impl MockLLMClient {
    /// Create a mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if self.should_fail {
            return Err(AppError::Generation("mock LLM failure".into()));
        }
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.generate("").await
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Rerank
// ============================================================================

/// Rerank service returning a fixed score sequence, cycled over the input.
pub struct StaticRerank(pub Vec<f32>);

#[async_trait]
impl RerankService for StaticRerank {
    async fn score(&self, _query: &str, texts: &[String]) -> Result<Vec<f32>> {
        Ok((0..texts.len())
            .map(|i| self.0[i % self.0.len()])
            .collect())
    }
}

/// Rerank service that always fails.
pub struct FailingRerank;

#[async_trait]
impl RerankService for FailingRerank {
    async fn score(&self, _query: &str, _texts: &[String]) -> Result<Vec<f32>> {
        Err(AppError::Rerank("rerank service down".into()))
    }
}
