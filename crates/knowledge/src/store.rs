//! Knowledge store: the long-lived owner of the vector index.
//!
//! Readers clone an `Arc` snapshot of the current index and search it without
//! holding any lock. Ingestion is serialized by a writer mutex: it builds the
//! next index beside the current one, persists it, and only then publishes it.

use crate::chunker::{Chunker, ChunkerConfig};
use crate::embeddings::EmbeddingProvider;
use crate::types::{
    derive_title, Chunk, Document, IngestReport, KnowledgeStats, RetrievedChunk, PLACEHOLDER_SOURCE,
};
use crate::vector_index::VectorIndex;
use ragline_core::config::KnowledgeSettings;
use ragline_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Minimum characters of trimmed content accepted for ingestion.
pub const MIN_CONTENT_CHARS: usize = 10;

/// Where the store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Only the placeholder entry is stored
    Bootstrapped,
    /// Real content was loaded from disk
    Loaded,
    /// Content was ingested by this process
    Populated,
}

#[derive(Debug)]
struct IndexState {
    index: VectorIndex,
    lifecycle: LifecycleState,
}

pub struct KnowledgeStore {
    index_dir: PathBuf,
    chunker: Chunker,
    provider: Arc<dyn EmbeddingProvider>,
    embed_timeout: Duration,
    default_top_k: usize,
    current: RwLock<Arc<IndexState>>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("index_dir", &self.index_dir)
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

impl KnowledgeStore {
    /// Open the knowledge base in `index_dir`, bootstrapping it when it is
    /// missing, corrupt, or was built with a different embedding dimension.
    pub async fn open(
        settings: &KnowledgeSettings,
        index_dir: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let index_dir = index_dir.into();
        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        })?;

        let mut store = Self {
            index_dir,
            chunker,
            provider,
            embed_timeout: Duration::from_secs(settings.embedding.timeout_secs),
            default_top_k: settings.default_top_k,
            current: RwLock::new(Arc::new(IndexState {
                index: VectorIndex::create(0),
                lifecycle: LifecycleState::Bootstrapped,
            })),
            writer: Mutex::new(()),
        };

        let state = match store.load_existing() {
            Some(state) => state,
            None => store.bootstrap().await?,
        };

        tracing::info!(
            "Knowledge store ready: {} entries, dimension {}, state {:?}",
            state.index.len(),
            state.index.dimension(),
            state.lifecycle
        );

        store.current = RwLock::new(Arc::new(state));
        Ok(store)
    }

    fn load_existing(&self) -> Option<IndexState> {
        if !VectorIndex::exists(&self.index_dir) {
            tracing::info!(
                "No knowledge base at {:?}, creating a new one",
                self.index_dir
            );
            return None;
        }

        let index = match VectorIndex::load(&self.index_dir) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!("Failed to load knowledge base, rebuilding: {}", e);
                return None;
            }
        };

        if index.dimension() != self.provider.dimensions() {
            tracing::warn!(
                "Knowledge base dimension {} does not match embedder dimension {}, rebuilding",
                index.dimension(),
                self.provider.dimensions()
            );
            return None;
        }

        let lifecycle = if index.contains_only_placeholder() {
            LifecycleState::Bootstrapped
        } else {
            LifecycleState::Loaded
        };

        tracing::info!(
            "Loaded knowledge base from {:?} ({} entries)",
            self.index_dir,
            index.len()
        );

        Some(IndexState { index, lifecycle })
    }

    async fn bootstrap(&self) -> AppResult<IndexState> {
        let placeholder = Chunk::placeholder();
        let vectors = self.embed_texts(&[placeholder.text.clone()]).await?;

        let mut index = VectorIndex::create(self.provider.dimensions());
        index.add_entries(vec![placeholder], vectors)?;
        index.save(&self.index_dir)?;

        Ok(IndexState {
            index,
            lifecycle: LifecycleState::Bootstrapped,
        })
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub async fn lifecycle(&self) -> LifecycleState {
        self.snapshot().await.lifecycle
    }

    async fn snapshot(&self) -> Arc<IndexState> {
        Arc::clone(&*self.current.read().await)
    }

    /// Chunk, embed and store documents.
    ///
    /// The first successful ingestion after bootstrap replaces the
    /// placeholder. On any error, memory and disk keep the previous index.
    pub async fn ingest(&self, documents: Vec<Document>) -> AppResult<IngestReport> {
        if documents.is_empty() {
            return Ok(IngestReport::default());
        }

        let documents = documents
            .into_iter()
            .map(prepare_document)
            .collect::<AppResult<Vec<_>>>()?;

        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| self.chunker.split(doc))
            .collect();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embed_texts(&texts).await?;

        let _guard = self.writer.lock().await;
        let current = self.snapshot().await;

        let replaced_placeholder = current.lifecycle == LifecycleState::Bootstrapped;
        let mut next = if replaced_placeholder {
            VectorIndex::create(current.index.dimension())
        } else {
            current.index.clone()
        };

        let chunk_count = chunks.len();
        next.add_entries(chunks, vectors)?;
        next.save(&self.index_dir)?;

        *self.current.write().await = Arc::new(IndexState {
            index: next,
            lifecycle: LifecycleState::Populated,
        });

        tracing::info!(
            "Ingested {} documents ({} chunks){}",
            documents.len(),
            chunk_count,
            if replaced_placeholder {
                ", replacing placeholder"
            } else {
                ""
            }
        );

        Ok(IngestReport {
            documents: documents.len(),
            chunks: chunk_count,
            replaced_placeholder,
        })
    }

    /// Up to `k` chunks relevant to `query`. Failures yield an empty result.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<RetrievedChunk> {
        match self.retrieve_scored(query, k).await {
            Ok(hits) => hits.into_iter().map(|(chunk, _)| chunk.into()).collect(),
            Err(e) => {
                tracing::warn!("Retrieval failed, continuing without context: {}", e);
                Vec::new()
            }
        }
    }

    /// Like [`KnowledgeStore::retrieve`] but with scores, and errors surfaced.
    pub async fn retrieve_scored(&self, query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut vectors = self.embed_texts(&[query.to_string()]).await?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("No query embedding returned".to_string()))?;

        let state = self.snapshot().await;
        let hits = state.index.search(&query_vector, k)?;

        if hits.len() == 1 && hits[0].0.is_placeholder() {
            return Ok(Vec::new());
        }

        tracing::debug!("Retrieved {} chunks for query", hits.len());
        Ok(hits)
    }

    pub async fn stats(&self) -> KnowledgeStats {
        let state = self.snapshot().await;
        KnowledgeStats {
            total_documents: state.index.len(),
            dimension: Some(state.index.dimension()),
        }
    }

    async fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let vectors = tokio::time::timeout(self.embed_timeout, self.provider.embed_batch(texts))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "Embedding {} texts took longer than {}s",
                    texts.len(),
                    self.embed_timeout.as_secs()
                ))
            })??;

        if vectors.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        Ok(vectors)
    }
}

/// Trim content, enforce the minimum length, reject the reserved placeholder
/// source, and derive a missing title.
fn prepare_document(mut document: Document) -> AppResult<Document> {
    document.content = document.content.trim().to_string();

    if document.content.chars().count() < MIN_CONTENT_CHARS {
        return Err(AppError::Validation(format!(
            "Document content must be at least {} characters long",
            MIN_CONTENT_CHARS
        )));
    }

    if document.source.trim() == PLACEHOLDER_SOURCE {
        return Err(AppError::Validation(format!(
            "Document source '{}' is reserved",
            PLACEHOLDER_SOURCE
        )));
    }

    if document.title.trim().is_empty() {
        document.title = derive_title(&document.content);
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_document_trims_and_titles() {
        let doc = prepare_document(Document::new("   Refunds take five business days.  ")).unwrap();
        assert_eq!(doc.content, "Refunds take five business days.");
        assert_eq!(doc.title, "Refunds take five business days.");
    }

    #[test]
    fn test_prepare_document_keeps_title() {
        let doc = prepare_document(Document::new("Refunds take five days.").with_title("Refunds"))
            .unwrap();
        assert_eq!(doc.title, "Refunds");
    }

    #[test]
    fn test_prepare_document_rejects_reserved_source() {
        let doc = Document::new("This is a placeholder document.")
            .with_source("system")
            .with_title("Placeholder");
        assert!(matches!(prepare_document(doc), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_prepare_document_rejects_short() {
        assert!(matches!(
            prepare_document(Document::new("   short   ")),
            Err(AppError::Validation(_))
        ));
    }
}
