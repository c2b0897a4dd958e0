//! Cross-component tests for the knowledge store.

mod persistence;
mod rag_ranking;

use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::store::KnowledgeStore;
use crate::types::Document;
use ragline_core::config::{EmbeddingSettings, KnowledgeSettings};
use ragline_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trigram embeddings with switches for failure modes.
#[derive(Debug)]
pub(crate) struct TestProvider {
    inner: TrigramProvider,
    pub skew: AtomicBool,
    pub stall: AtomicBool,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl TestProvider {
    pub fn new(dimensions: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: TrigramProvider::new(dimensions),
            skew: AtomicBool::new(false),
            stall: AtomicBool::new(false),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TestProvider {
    fn provider_name(&self) -> &str {
        "test"
    }

    fn model_name(&self) -> &str {
        "trigram-test"
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("embedding service unavailable".into()));
        }

        let mut vectors = self.inner.embed_batch(texts).await?;
        if self.skew.load(Ordering::SeqCst) {
            for v in &mut vectors {
                v.pop();
            }
        }
        Ok(vectors)
    }
}

pub(crate) fn settings() -> KnowledgeSettings {
    KnowledgeSettings {
        embedding: EmbeddingSettings {
            timeout_secs: 1,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) fn index_dir(root: &Path) -> PathBuf {
    root.join("knowledge_base").join("vector_index")
}

pub(crate) async fn open_store(root: &Path, provider: Arc<TestProvider>) -> KnowledgeStore {
    KnowledgeStore::open(&settings(), index_dir(root), provider)
        .await
        .unwrap()
}

pub(crate) fn faq(content: &str, title: &str) -> Document {
    Document::new(content)
        .with_source("faq.md")
        .with_title(title)
        .with_type(crate::types::DocumentType::Faq)
}
