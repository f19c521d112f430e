//! Deterministic text chunking.
//!
//! Splits normalized document text into bounded, overlapping windows while
//! tracking which source pages each window spans. Identical input text and
//! configuration always produce identical chunk boundaries and ids, which
//! is what makes re-ingestion idempotent.

use crate::ingest::loader::Page;
use crate::types::{AppError, Chunk, Locator, Result};
use sha2::{Digest, Sha256};

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker. `chunk_size` must be greater than `chunk_overlap`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk_size ({}) must be greater than chunk_overlap ({})",
                chunk_size, chunk_overlap
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Collapse runs of whitespace to single spaces.
    pub fn clean_text(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Flatten pages into one normalized text with a per-character page map.
    ///
    /// Pages are joined with a single space; the joining space is attributed
    /// to the earlier page.
    fn flatten_pages(pages: &[Page]) -> (String, Vec<u32>) {
        let mut full_text = String::new();
        let mut char_pages: Vec<u32> = Vec::new();

        for page in pages {
            let cleaned = Self::clean_text(&page.text);
            if cleaned.is_empty() {
                continue;
            }
            if !full_text.is_empty() {
                full_text.push(' ');
                char_pages.push(*char_pages.last().unwrap_or(&page.number));
            }
            char_pages.extend(std::iter::repeat(page.number).take(cleaned.chars().count()));
            full_text.push_str(&cleaned);
        }

        (full_text, char_pages)
    }

    /// Chunk a document's pages into overlapping windows.
    ///
    /// Windows cover the full text with no gaps and `chunk_overlap`
    /// characters of duplication between consecutive chunks. The final
    /// window ends exactly at the end of the text; a trailing window that
    /// would fall entirely inside the previous one is never emitted.
    pub fn chunk(&self, document_id: &str, pages: &[Page]) -> Vec<Chunk> {
        let (full_text, char_pages) = Self::flatten_pages(pages);
        let chars: Vec<char> = full_text.chars().collect();

        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();

            let mut chunk_pages: Vec<u32> = char_pages[start..end].to_vec();
            chunk_pages.sort_unstable();
            chunk_pages.dedup();

            let index = chunks.len();
            chunks.push(Chunk {
                id: chunk_id(document_id, index, &text),
                document_id: document_id.to_string(),
                text,
                locator: Locator {
                    pages: chunk_pages,
                    offset: start,
                    length: end - start,
                },
            });

            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Stable, content-derived chunk id: SHA-256 over document id, chunk index,
/// and chunk text, truncated to 32 hex characters.
fn chunk_id(document_id: &str, index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(b":");
    hasher.update(index.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}
