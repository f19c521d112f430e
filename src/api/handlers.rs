//! Request handlers for the query and ingestion endpoints.

use crate::ingest::IngestReport;
use crate::pipeline::{AskOptions, SearchResults};
use crate::types::{Answer, AppError, Result};
use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

fn default_true() -> bool {
    true
}

// ============================================================================
// Health
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub indexed_chunks: usize,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let namespace = &state.pipeline.config().index.namespace;
    let indexed_chunks = state.pipeline.store().count(namespace).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        store: state.pipeline.store().provider_name(),
        indexed_chunks,
    }))
}

// ============================================================================
// Ingest
// ============================================================================

#[derive(Deserialize)]
pub struct IngestRequest {
    /// Directory of documents on the server's filesystem.
    pub path: PathBuf,
}

#[derive(Serialize)]
pub struct IngestResponse {
    #[serde(flatten)]
    pub report: IngestReport,
    pub duration_ms: u64,
}

pub async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();

    if !payload.path.is_dir() {
        return Err(AppError::Validation(format!(
            "Not a directory: {}",
            payload.path.display()
        )));
    }

    let report = state.pipeline.ingest_dir(&payload.path).await?;

    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        chunks = report.total_chunks(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Ingestion completed"
    );

    Ok(Json(IngestResponse {
        report,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}

// ============================================================================
// Search
// ============================================================================

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub k: Option<usize>,
    pub top_n: Option<usize>,
    #[serde(default = "default_true")]
    pub use_reranker: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub results: SearchResults,
    pub duration_ms: u64,
}

/// Retrieval and ranking without generation; returns both the raw
/// retrieval candidates and the ranked top-n.
pub async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    let options = AskOptions {
        k: payload.k,
        top_n: payload.top_n,
        use_reranker: payload.use_reranker,
    };

    let results = state
        .pipeline
        .search(&payload.query, &options, &state.shutdown)
        .await?;

    Ok(Json(SearchResponse {
        results,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}

// ============================================================================
// Ask
// ============================================================================

#[derive(Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub k: Option<usize>,
    pub top_n: Option<usize>,
    #[serde(default = "default_true")]
    pub use_reranker: bool,
    /// Include the retrieval and ranking candidate lists in the response.
    #[serde(default)]
    pub debug: bool,
}

#[derive(Serialize)]
pub struct AskResponse {
    #[serde(flatten)]
    pub answer: Answer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<SearchResults>,
    pub duration_ms: u64,
}

pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let start = Instant::now();

    let options = AskOptions {
        k: payload.k,
        top_n: payload.top_n,
        use_reranker: payload.use_reranker,
    };

    let (answer, debug) = if payload.debug {
        let (answer, results) = state
            .pipeline
            .ask_debug(&payload.query, &options, &state.shutdown)
            .await?;
        (answer, Some(results))
    } else {
        let answer = state
            .pipeline
            .ask(&payload.query, &options, &state.shutdown)
            .await?;
        (answer, None)
    };

    Ok(Json(AskResponse {
        answer,
        debug,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}
