//! Environment-driven configuration.
//!
//! All external collaborators (embedding service, vector index, reranker,
//! LLM) and pipeline tuning knobs are configured here, loaded once at
//! startup and passed explicitly to each component. Invalid configuration
//! is fatal at startup (`AppError::Config`).

use crate::types::{AppError, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub rerank: RerankConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible `/embeddings` endpoint.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Output dimension of the configured model. Responses with a
    /// different dimension are rejected.
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Remote vector index base URL. When unset, the embedded in-memory
    /// store is used (local development and tests).
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Namespace identifying this deployment inside the index.
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct RerankConfig {
    /// Cross-encoder scoring endpoint. When unset, `ask` runs without
    /// reranking (retrieval order passes through).
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    /// What to do when the rerank service fails: surface the error, or
    /// fall back to the unreranked top-N. Explicit, never a hidden default.
    pub fallback: RerankFallback,
}

/// Policy applied when the rerank service fails mid-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RerankFallback {
    /// Propagate the rerank error to the caller (default: fail loudly).
    #[default]
    Error,
    /// Log a warning and answer from the unreranked top-N candidates.
    Passthrough,
}

impl std::str::FromStr for RerankFallback {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "passthrough" => Ok(Self::Passthrough),
            _ => Err(AppError::Config(format!(
                "Unknown rerank fallback policy: {}. Use 'error' or 'passthrough'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters of duplication between consecutive chunks.
    pub chunk_overlap: usize,
    /// Candidates fetched from the vector index per query.
    pub top_k: usize,
    /// Candidates kept after reranking.
    pub top_n: usize,
    /// Bound on every external service call.
    pub request_timeout: Duration,
    /// Documents processed concurrently during ingestion.
    pub ingest_concurrency: usize,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| AppError::Config(format!("Invalid value for {}: '{}'", key, raw)))
}

impl Config {
    /// Load configuration from the environment (and `.env` if present),
    /// then validate it.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env::var("GRAIL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env_parse("GRAIL_PORT", "3000")?,
            },
            embedding: EmbeddingConfig {
                endpoint: env::var("EMBEDDING_ENDPOINT")
                    .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string()),
                api_key: env::var("EMBEDDING_API_KEY").ok(),
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                dimensions: env_parse("EMBEDDING_DIMENSIONS", "1536")?,
            },
            index: IndexConfig {
                url: env::var("VECTOR_INDEX_URL").ok(),
                api_key: env::var("VECTOR_INDEX_API_KEY").ok(),
                namespace: env::var("VECTOR_NAMESPACE").unwrap_or_else(|_| "grail".to_string()),
            },
            rerank: RerankConfig {
                endpoint: env::var("RERANK_ENDPOINT").ok(),
                api_key: env::var("RERANK_API_KEY").ok(),
                model: env::var("RERANK_MODEL")
                    .unwrap_or_else(|_| "bge-reranker-v2-m3".to_string()),
                fallback: env::var("RERANK_FALLBACK")
                    .unwrap_or_else(|_| "error".to_string())
                    .parse()?,
            },
            llm: LlmConfig {
                api_base: env::var("LLM_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: env::var("LLM_API_KEY").unwrap_or_default(),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            },
            pipeline: PipelineConfig {
                chunk_size: env_parse("CHUNK_SIZE", "500")?,
                chunk_overlap: env_parse("CHUNK_OVERLAP", "50")?,
                top_k: env_parse("TOP_K", "10")?,
                top_n: env_parse("TOP_N", "3")?,
                request_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", "30")?),
                ingest_concurrency: env_parse("INGEST_CONCURRENCY", "4")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants. Violations are fatal.
    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;

        if p.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be > 0".into()));
        }
        if p.chunk_overlap >= p.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                p.chunk_overlap, p.chunk_size
            )));
        }
        if p.top_k == 0 {
            return Err(AppError::Config("top_k must be > 0".into()));
        }
        if p.top_n > p.top_k {
            return Err(AppError::Config(format!(
                "top_n ({}) must not exceed top_k ({})",
                p.top_n, p.top_k
            )));
        }
        if p.ingest_concurrency == 0 {
            return Err(AppError::Config("ingest_concurrency must be > 0".into()));
        }
        if p.request_timeout.is_zero() {
            return Err(AppError::Config("request_timeout must be > 0".into()));
        }
        if self.embedding.dimensions == 0 {
            return Err(AppError::Config("embedding dimensions must be > 0".into()));
        }

        Ok(())
    }
}
