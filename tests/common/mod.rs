//! Shared helpers for integration tests.

pub mod mocks;

use grail::config::{
    Config, EmbeddingConfig, IndexConfig, LlmConfig, PipelineConfig, RerankConfig, RerankFallback,
    ServerConfig,
};
use std::time::Duration;

/// Configuration pointing every external service at nothing; tests
/// substitute fakes through `Pipeline::new`.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        embedding: EmbeddingConfig {
            endpoint: "http://localhost:1/embeddings".into(),
            api_key: None,
            model: "test-embed".into(),
            dimensions: 4,
        },
        index: IndexConfig {
            url: None,
            api_key: None,
            namespace: "test".into(),
        },
        rerank: RerankConfig {
            endpoint: None,
            api_key: None,
            model: "test-rerank".into(),
            fallback: RerankFallback::Error,
        },
        llm: LlmConfig {
            api_base: "http://localhost:1/v1".into(),
            api_key: "test".into(),
            model: "test-llm".into(),
        },
        pipeline: PipelineConfig {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 10,
            top_n: 3,
            request_timeout: Duration::from_secs(5),
            ingest_concurrency: 2,
        },
    }
}
