//! # G.R.A.I.L - Grounded Retrieval And Inference Layer
//!
//! A retrieval-augmented question answering pipeline. Documents are
//! chunked, embedded, and indexed; questions are answered by retrieving
//! the most relevant chunks, reranking them with a cross-encoder, and
//! generating a response grounded in (and cited against) those chunks.
//!
//! ## Overview
//!
//! G.R.A.I.L can be used two ways:
//!
//! 1. **As a binary** - `grail ingest`, `grail ask`, and `grail serve`
//! 2. **As a library** - assemble a [`pipeline::Pipeline`] from your own
//!    component implementations
//!
//! ## Modules
//!
//! - [`ingest`] - Document loading, text extraction, and chunking
//! - [`embedding`] - Embedding service client
//! - [`vectorstore`] - Vector index backends (in-memory, REST)
//! - [`retrieval`] - Query-time vector search
//! - [`rerank`] - Cross-encoder reranking
//! - [`generation`] - Cited answer generation
//! - [`pipeline`] - Orchestration of the ingest and query paths
//! - [`api`] - HTTP API (Axum)
//! - [`cli`] - Command-line interface
//!
//! ## Pipeline Shape
//!
//! ```text
//! ingest:  load -> chunk -> embed -> upsert
//! ask:     embed -> retrieve (top-k) -> rerank (top-n) -> generate
//! ```
//!
//! Every stage failure carries the stage it occurred in; the pipeline
//! halts at the first failing stage rather than degrading silently.

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Environment-driven configuration.
pub mod config;
/// Embedding service client.
pub mod embedding;
/// Grounded answer generation.
pub mod generation;
/// Document loading and chunking.
pub mod ingest;
/// LLM provider clients.
pub mod llm;
/// Pipeline orchestration.
pub mod pipeline;
/// Cross-encoder reranking.
pub mod rerank;
/// Query-time retrieval.
pub mod retrieval;
/// Core types and error handling.
pub mod types;
/// Vector index backends.
pub mod vectorstore;

pub use config::Config;
pub use pipeline::{AskOptions, Pipeline};
pub use types::{Answer, AppError, Citation, Result};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state shared across API handlers
#[derive(Clone)]
pub struct AppState {
    /// The assembled ingest/query pipeline
    pub pipeline: Arc<Pipeline>,
    /// Cancelled on shutdown; in-flight requests stop between pipeline
    /// stages and the server stops accepting connections.
    pub shutdown: CancellationToken,
}
