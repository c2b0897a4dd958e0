//! Knowledge base for ragline.
//!
//! Ingests documents into a persistent semantic index and retrieves the
//! chunks most relevant to a query, for grounding chat replies.
//!
//! - [`chunker`]: overlapping, boundary-aware document splitting
//! - [`embeddings`]: embedding providers (trigram, Ollama)
//! - [`vector_index`]: flat inner-product index with atomic persistence
//! - [`store`]: the long-lived [`KnowledgeStore`] orchestrator
//! - [`rag`]: the [`ResponseComposer`] that turns context into replies

pub mod chunker;
pub mod embeddings;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunker::{Chunker, ChunkerConfig};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use rag::{ChatReply, ResponseComposer};
pub use store::{KnowledgeStore, LifecycleState};
pub use types::{
    derive_title, Chunk, ChunkMetadata, Document, DocumentType, IngestReport, KnowledgeStats,
    RetrievedChunk,
};
pub use vector_index::VectorIndex;
