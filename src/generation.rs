//! Grounded answer generation.
//!
//! Builds a numbered context block from the reranked chunks, instructs the
//! model to cite sources by number, and maps the `[n]` markers in the
//! response back to the chunks they reference. Citations in the returned
//! [`Answer`] always point at chunks that were actually in the context.

use crate::llm::LLMClient;
use crate::types::{Answer, AppError, Citation, RerankedResult, Result};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "\
You are a careful research assistant. Answer the user's question using ONLY \
the numbered context passages provided. Rules:

1. Cite every claim with the number of the passage that supports it, like [1] \
   or [2][3].
2. Use only the passages given. Do not draw on outside knowledge.
3. If the context does not contain enough information to answer, say so \
   plainly instead of guessing.
4. Do not invent passage numbers. Only cite numbers that appear in the context.";

/// Turns a ranked context set and a question into a cited answer.
pub struct Generator {
    llm: Arc<dyn LLMClient>,
}

impl Generator {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Generate an answer grounded in `context`.
    ///
    /// An empty context is a `GenerationError`: the caller decides what
    /// "no relevant material" means, generation never answers from nothing.
    pub async fn generate(&self, query: &str, context: &[RerankedResult]) -> Result<Answer> {
        if context.is_empty() {
            return Err(AppError::Generation(
                "Cannot generate an answer with no context chunks".to_string(),
            ));
        }

        let context_block = build_context_block(context);
        let prompt = format!("Context:\n{}\n\n---\nQuestion: {}", context_block, query);

        tracing::debug!(
            model = %self.llm.model_name(),
            context_chunks = context.len(),
            "Generating answer"
        );

        let text = self.llm.generate_with_system(SYSTEM_PROMPT, &prompt).await?;
        let citations = extract_citations(&text, context);

        Ok(Answer { text, citations })
    }
}

/// Render the context chunks as numbered passages with provenance.
fn build_context_block(context: &[RerankedResult]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[{}] (source: {}, p. {})\n{}",
                i + 1,
                chunk.metadata.source,
                chunk.metadata.locator.page_label(),
                chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Collect the `[n]` markers the model used, in order of first appearance.
///
/// Markers that do not map to a context passage are dropped and logged;
/// they indicate the model cited a number it was never given.
fn extract_citations(text: &str, context: &[RerankedResult]) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();
    let mut seen: Vec<usize> = Vec::new();

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }
        let Some(close) = text[i + 1..].find(']').map(|off| i + 1 + off) else {
            break;
        };
        let inner = &text[i + 1..close];
        if let Ok(marker) = inner.parse::<usize>() {
            if marker >= 1 && marker <= context.len() {
                if !seen.contains(&marker) {
                    seen.push(marker);
                    let chunk = &context[marker - 1];
                    citations.push(Citation {
                        marker,
                        chunk_id: chunk.chunk_id.clone(),
                        document_id: chunk.metadata.document_id.clone(),
                        source: chunk.metadata.source.clone(),
                        locator: chunk.metadata.locator.clone(),
                    });
                }
            } else {
                tracing::warn!(
                    marker = marker,
                    context_chunks = context.len(),
                    "Model cited a passage number outside the context; dropping"
                );
            }
        }
        i = close + 1;
    }

    citations
}
