//! Pipeline orchestration.
//!
//! Wires the stage components together behind two entry points: `ingest`
//! (load → chunk → embed → upsert) and `ask` (retrieve → rerank →
//! generate). The orchestrator sequences stages, halts at the first
//! failing stage, and checks for cancellation between stages; it contains
//! no stage logic of its own.

use crate::config::Config;
use crate::embedding::{Embedder, RestEmbedder};
use crate::generation::Generator;
use crate::ingest::chunker::TextChunker;
use crate::ingest::loader;
use crate::ingest::{FailedDocument, IngestReport, IngestedDocument};
use crate::llm::{LLMClient, OpenAIClient};
use crate::rerank::{Reranker, RestReranker};
use crate::retrieval::Retriever;
use crate::types::{
    Answer, AppError, ChunkMetadata, IndexedChunk, RerankedResult, Result, RetrievalResult,
};
use crate::vectorstore::{create_store, VectorStore};
use futures::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Chunks embedded per embedding service call.
const EMBED_BATCH_SIZE: usize = 64;

/// Per-request overrides for the query path.
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Candidates fetched from the index; defaults to the configured top-k.
    pub k: Option<usize>,
    /// Candidates kept for generation; defaults to the configured top-n.
    pub top_n: Option<usize>,
    /// Skip the rerank stage and answer from retrieval order.
    pub use_reranker: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            k: None,
            top_n: None,
            use_reranker: true,
        }
    }
}

/// Output of the retrieval and ranking stages, before generation.
///
/// Carries both the raw retrieval candidates and the ranked top-n so
/// callers can compare the two orderings.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Raw candidates from the vector index, score-descending.
    pub retrieved: Vec<RetrievalResult>,
    /// The top-n kept for generation, in final order.
    pub ranked: Vec<RerankedResult>,
}

pub struct Pipeline {
    config: Config,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    retriever: Retriever,
    reranker: Option<Reranker>,
    generator: Generator,
}

impl Pipeline {
    /// Assemble a pipeline from pre-built components. Tests use this to
    /// substitute fakes for the external services.
    pub fn new(
        config: Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LLMClient>,
        reranker: Option<Reranker>,
    ) -> Self {
        let retriever = Retriever::new(
            embedder.clone(),
            store.clone(),
            config.index.namespace.clone(),
        );

        Self {
            config,
            embedder,
            store,
            retriever,
            reranker,
            generator: Generator::new(llm),
        }
    }

    /// Build the production pipeline from configuration: REST clients for
    /// every configured external service, the embedded store otherwise.
    pub fn from_config(config: Config) -> Result<Self> {
        let timeout = config.pipeline.request_timeout;

        let embedder: Arc<dyn Embedder> = Arc::new(RestEmbedder::new(&config.embedding, timeout)?);
        let store = create_store(&config.index, timeout)?;

        let reranker = match &config.rerank.endpoint {
            Some(endpoint) => {
                let service = RestReranker::new(endpoint.clone(), &config.rerank, timeout)?;
                Some(Reranker::new(Arc::new(service), config.rerank.fallback))
            }
            None => None,
        };

        let llm: Arc<dyn LLMClient> = Arc::new(OpenAIClient::new(
            config.llm.api_key.clone(),
            config.llm.api_base.clone(),
            config.llm.model.clone(),
            timeout,
        ));

        tracing::info!(
            store = store.provider_name(),
            namespace = %config.index.namespace,
            reranker = reranker.is_some(),
            model = %config.llm.model,
            "Pipeline assembled"
        );

        Ok(Self::new(config, embedder, store, llm, reranker))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    // ========================================================================
    // Query path
    // ========================================================================

    /// Run the retrieval and ranking stages only.
    ///
    /// Returns both the raw retrieval candidates and the ranked top-n.
    /// An empty index yields empty lists, not an error. The cancellation
    /// token is checked before each stage.
    pub async fn search(
        &self,
        query: &str,
        options: &AskOptions,
        cancel: &CancellationToken,
    ) -> Result<SearchResults> {
        let k = options.k.unwrap_or(self.config.pipeline.top_k);
        let top_n = options.top_n.unwrap_or(self.config.pipeline.top_n);

        if k == 0 || top_n == 0 {
            return Err(AppError::Validation("k and top_n must be > 0".into()));
        }
        if top_n > k {
            return Err(AppError::Validation(format!(
                "top_n ({}) must not exceed k ({})",
                top_n, k
            )));
        }

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let retrieved = self.retriever.retrieve(query, k).await?;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let ranked = if retrieved.is_empty() {
            Vec::new()
        } else {
            self.rank(query, retrieved.clone(), top_n, options.use_reranker)
                .await?
        };

        Ok(SearchResults { retrieved, ranked })
    }

    /// Answer a question from the indexed corpus.
    ///
    /// Stages run strictly in order: retrieve, rerank, generate. The first
    /// failing stage aborts the request with its stage-tagged error. The
    /// cancellation token is checked between stages; a cancelled request
    /// stops before starting the next stage.
    pub async fn ask(
        &self,
        query: &str,
        options: &AskOptions,
        cancel: &CancellationToken,
    ) -> Result<Answer> {
        Ok(self.ask_debug(query, options, cancel).await?.0)
    }

    /// Like [`Pipeline::ask`], additionally returning the retrieval and
    /// ranking candidate lists so callers can inspect what the answer was
    /// grounded on.
    pub async fn ask_debug(
        &self,
        query: &str,
        options: &AskOptions,
        cancel: &CancellationToken,
    ) -> Result<(Answer, SearchResults)> {
        let results = self.search(query, options, cancel).await?;

        if results.ranked.is_empty() {
            // No matches is a valid retrieval outcome, but there is nothing
            // to ground an answer on.
            return Err(AppError::Generation(
                "No relevant material found in the index for this query".to_string(),
            ));
        }

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let answer = self.generator.generate(query, &results.ranked).await?;

        tracing::info!(
            context_chunks = results.ranked.len(),
            citations = answer.citations.len(),
            "Query answered"
        );

        Ok((answer, results))
    }

    async fn rank(
        &self,
        query: &str,
        candidates: Vec<RetrievalResult>,
        top_n: usize,
        use_reranker: bool,
    ) -> Result<Vec<RerankedResult>> {
        match (&self.reranker, use_reranker) {
            (Some(reranker), true) => reranker.rerank(query, candidates, top_n).await,
            _ => Ok(candidates
                .into_iter()
                .enumerate()
                .take(top_n)
                .map(|(rank, c)| RerankedResult::from_retrieval(rank, c))
                .collect()),
        }
    }

    // ========================================================================
    // Ingestion path
    // ========================================================================

    /// Ingest every file in `dir` (non-recursive).
    ///
    /// Documents are processed concurrently, bounded by the configured
    /// concurrency. One document's failure never aborts the others; each
    /// failure is recorded with the stage it occurred in.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| AppError::Io(format!("Failed to read {}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Io(format!("Failed to read {}: {}", dir.display(), e)))?
        {
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(AppError::Validation(format!(
                "No documents found in {}",
                dir.display()
            )));
        }

        files.sort();
        tracing::info!(
            documents = files.len(),
            concurrency = self.config.pipeline.ingest_concurrency,
            "Starting ingestion"
        );

        let outcomes: Vec<(PathBuf, Result<IngestedDocument>)> = futures::stream::iter(
            files.into_iter().map(|path| async move {
                let outcome = self.ingest_file(&path).await;
                (path, outcome)
            }),
        )
        .buffer_unordered(self.config.pipeline.ingest_concurrency)
        .collect()
        .await;

        let mut report = IngestReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(doc) => report.succeeded.push(doc),
                Err(err) => {
                    tracing::warn!(
                        source = %path.display(),
                        stage = err.stage(),
                        error = %err,
                        "Document failed to ingest"
                    );
                    report.failed.push(FailedDocument {
                        source: path.display().to_string(),
                        stage: err.stage().to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        report.succeeded.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(report)
    }

    /// Ingest a single document: load, chunk, embed, upsert.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestedDocument> {
        let (document, pages) = loader::load_document(path).await?;

        let chunker = TextChunker::new(
            self.config.pipeline.chunk_size,
            self.config.pipeline.chunk_overlap,
        )?;
        let chunks = chunker.chunk(&document.id, &pages);

        if chunks.is_empty() {
            return Err(AppError::Validation(format!(
                "Document '{}' produced no chunks",
                document.id
            )));
        }

        let mut indexed: Vec<IndexedChunk> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                indexed.push(IndexedChunk {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    embedding,
                    metadata: ChunkMetadata {
                        document_id: chunk.document_id.clone(),
                        source: document.id.clone(),
                        locator: chunk.locator.clone(),
                    },
                });
            }
        }

        let upserted = self
            .store
            .upsert(&self.config.index.namespace, &indexed)
            .await?;

        tracing::info!(
            document = %document.id,
            pages = document.metadata.page_count,
            chunks = upserted,
            "Document ingested"
        );

        Ok(IngestedDocument {
            document_id: document.id,
            source: document.source_uri,
            pages: document.metadata.page_count,
            chunks: indexed.len(),
        })
    }
}
