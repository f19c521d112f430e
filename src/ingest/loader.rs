//! Document loading and text extraction.
//!
//! Each file under the documents directory becomes one [`Document`].
//! Plain text and Markdown files load as a single page; PDFs are extracted
//! page by page so chunk locators can carry page provenance.

use crate::ingest::chunker::TextChunker;
use crate::types::{AppError, Document, DocumentMetadata, Result};
use chrono::Utc;
use std::path::Path;

/// One page of extracted text. Text files are a single page.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
}

/// Load a document from disk and extract its pages.
///
/// The document id is the file name, which keeps ids stable across
/// re-ingestion runs of the same directory.
pub async fn load_document(path: &Path) -> Result<(Document, Vec<Page>)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Validation(format!("Invalid file name: {}", path.display())))?
        .to_string();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let pages = match extension.as_str() {
        "txt" | "md" => extract_text_pages(path).await?,
        "pdf" => extract_pdf_pages(path).await?,
        other => {
            return Err(AppError::Validation(format!(
                "Unsupported file type '.{}' for {}",
                other, file_name
            )));
        }
    };

    // Empty pages are dropped during extraction; a document with no
    // remaining text cannot be ingested.
    if pages.iter().all(|p| p.text.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "Document '{}' contains no extractable text",
            file_name
        )));
    }

    let raw_text: String = pages
        .iter()
        .map(|p| TextChunker::clean_text(&p.text))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&file_name)
        .to_string();

    let document = Document {
        id: file_name.clone(),
        source_uri: path.display().to_string(),
        raw_text,
        metadata: DocumentMetadata {
            title,
            page_count: pages.len(),
            ingested_at: Utc::now(),
        },
    };

    Ok((document, pages))
}

async fn extract_text_pages(path: &Path) -> Result<Vec<Page>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

    Ok(vec![Page { number: 1, text }])
}

/// PDF extraction is CPU-bound, so it runs on the blocking pool.
async fn extract_pdf_pages(path: &Path) -> Result<Vec<Page>> {
    let path = path.to_path_buf();
    let display = path.display().to_string();

    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&path))
        .await
        .map_err(|e| AppError::Io(format!("PDF extraction task failed: {}", e)))?
        .map_err(|e| AppError::Validation(format!("Failed to parse PDF {}: {}", display, e)))?;

    Ok(pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Page {
            number: (i + 1) as u32,
            text,
        })
        .collect())
}
