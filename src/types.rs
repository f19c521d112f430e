use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Document Model =============

/// A source document as it enters the ingestion pipeline.
///
/// Documents are immutable after creation; re-ingesting the same file
/// supersedes the previous version rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, derived from the source file name.
    pub id: String,
    /// URI or path the document was loaded from.
    pub source_uri: String,
    /// Full extracted text (whitespace-normalized).
    pub raw_text: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub page_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Position of a chunk inside its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// Pages the chunk spans (1-based, sorted).
    pub pages: Vec<u32>,
    /// Character offset into the normalized document text.
    pub offset: usize,
    /// Length of the chunk in characters.
    pub length: usize,
}

impl Locator {
    /// Human-readable page label, e.g. "3" or "3,4".
    pub fn page_label(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A bounded text segment derived from a document, the unit of embedding
/// and retrieval.
///
/// Chunk ids are content-derived and stable: re-ingesting unchanged text
/// produces identical ids, so upserts overwrite rather than duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub text: String,
    pub locator: Locator,
}

/// Metadata payload stored alongside each vector in the index.
///
/// Everything needed to build a citation without fetching the source
/// document again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: String,
    /// Source file name or URI, for display in citations.
    pub source: String,
    pub locator: Locator,
}

/// A chunk ready for the vector index: embedded, with its metadata payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

// ============= Query-Time Results =============

/// A candidate returned by vector search. Ephemeral, produced per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk_id: String,
    /// Similarity score from the vector index (higher is better).
    pub score: f32,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A retrieval candidate after cross-encoder reranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedResult {
    pub chunk_id: String,
    /// Original similarity score from retrieval.
    pub retrieval_score: f32,
    /// Cross-encoder relevance score (ordering key).
    pub rerank_score: f32,
    /// Rank in the retrieval ordering (0-based), used as tie-break.
    pub original_rank: usize,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl RerankedResult {
    /// Passthrough conversion preserving retrieval order, used when
    /// reranking is disabled or the fallback policy applies.
    pub fn from_retrieval(rank: usize, r: RetrievalResult) -> Self {
        Self {
            chunk_id: r.chunk_id,
            retrieval_score: r.score,
            rerank_score: r.score,
            original_rank: rank,
            text: r.text,
            metadata: r.metadata,
        }
    }
}

// ============= Answers and Citations =============

/// A marker in a generated answer linking a claim to the chunk it was
/// grounded on. Citations only ever reference chunks that were supplied
/// to the generator for that query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based index of the chunk in the prompt context block.
    pub marker: usize,
    pub chunk_id: String,
    pub document_id: String,
    pub source: String,
    pub locator: Locator,
}

/// The final output of the query pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Citations ordered by first appearance in the answer.
    pub citations: Vec<Citation>,
}

// ============= Error Types =============

/// Stage-tagged error taxonomy for the pipeline.
///
/// Every failure carries the stage it occurred in; the orchestration layer
/// halts at the first failing stage and surfaces it to the caller. Errors
/// are never silently converted to empty results -- an empty retrieval
/// match list is the only valid empty outcome, and it is not an error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid configuration; fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input document or query.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Embedding service failure (including timeouts).
    #[error("Embedding service error: {0}")]
    Embedding(String),

    /// Vector index unreachable or query/upsert failure.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Reranker service failure (including timeouts).
    #[error("Rerank service error: {0}")]
    Rerank(String),

    /// LLM generation failure, or an attempt to generate without context.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Local file handling failure during ingestion.
    #[error("I/O error: {0}")]
    Io(String),

    /// The request was cancelled between pipeline stages.
    #[error("Request cancelled")]
    Cancelled,
}

impl AppError {
    /// Name of the pipeline stage this error belongs to, used in CLI
    /// output and API responses.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Validation(_) => "validation",
            AppError::Embedding(_) => "embedding",
            AppError::Retrieval(_) => "retrieval",
            AppError::Rerank(_) => "rerank",
            AppError::Generation(_) => "generation",
            AppError::Io(_) => "io",
            AppError::Cancelled => "cancelled",
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match self {
            AppError::Config(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Embedding(_)
            | AppError::Retrieval(_)
            | AppError::Rerank(_)
            | AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "stage": self.stage(),
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(AppError::Config("x".into()).stage(), "config");
        assert_eq!(AppError::Embedding("x".into()).stage(), "embedding");
        assert_eq!(AppError::Retrieval("x".into()).stage(), "retrieval");
        assert_eq!(AppError::Rerank("x".into()).stage(), "rerank");
        assert_eq!(AppError::Generation("x".into()).stage(), "generation");
        assert_eq!(AppError::Cancelled.stage(), "cancelled");
    }

    #[test]
    fn test_page_label() {
        let locator = Locator {
            pages: vec![3, 4],
            offset: 0,
            length: 10,
        };
        assert_eq!(locator.page_label(), "3,4");

        let single = Locator {
            pages: vec![7],
            offset: 0,
            length: 10,
        };
        assert_eq!(single.page_label(), "7");
    }
}
