//! Document ingestion: load → chunk → embed → upsert.
//!
//! Ingestion is per-document and failure-isolated: one document's error is
//! recorded and skipped, never aborting documents that already succeeded.
//! The run produces an [`IngestReport`] summarizing both outcomes.

pub mod chunker;
pub mod loader;

use serde::{Deserialize, Serialize};

/// Successful ingestion of a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedDocument {
    pub document_id: String,
    pub source: String,
    pub pages: usize,
    pub chunks: usize,
}

/// A document that failed to ingest, with the stage that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDocument {
    pub source: String,
    pub stage: String,
    pub error: String,
}

/// Summary of an ingestion run over a directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub succeeded: Vec<IngestedDocument>,
    pub failed: Vec<FailedDocument>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Every document failed (distinct from a partial failure).
    pub fn is_total_failure(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    pub fn is_partial_failure(&self) -> bool {
        !self.succeeded.is_empty() && !self.failed.is_empty()
    }

    pub fn total_chunks(&self) -> usize {
        self.succeeded.iter().map(|d| d.chunks).sum()
    }
}
