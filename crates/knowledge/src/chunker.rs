//! Text chunking with configurable size and overlap.
//!
//! Splitting is delegated to the `text-splitter` crate, which prefers the
//! coarsest semantic boundary that fits the window: blank lines, then line
//! breaks, sentences, words and finally single characters. Trimming is off,
//! so every chunk is an exact slice of the source text.

use crate::types::{Chunk, Document};
use ragline_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk size and overlap, both counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Splits documents into overlapping chunks.
pub struct Chunker {
    config: ChunkerConfig,
    splitter: TextSplitter<text_splitter::Characters>,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker").field("config", &self.config).finish()
    }
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> AppResult<Self> {
        if config.chunk_size == 0 {
            return Err(AppError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if config.chunk_overlap >= config.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunk configuration: {}", e)))?
            .with_trim(false);

        Ok(Self {
            config,
            splitter: TextSplitter::new(chunk_config),
        })
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Split a document into chunks that inherit its metadata.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let metadata = document.chunk_metadata();
        let chunks: Vec<Chunk> = self
            .split_spans(&document.content)
            .into_iter()
            .map(|(_, text)| Chunk {
                text: text.to_string(),
                metadata: metadata.clone(),
            })
            .collect();

        tracing::debug!(
            "Chunked '{}' into {} chunks (size: {}, overlap: {})",
            document.title,
            chunks.len(),
            self.config.chunk_size,
            self.config.chunk_overlap
        );

        chunks
    }

    /// Chunk spans as `(byte_offset, slice)` pairs, in document order.
    ///
    /// Whitespace-only spans are kept so the spans always cover the text.
    pub fn split_spans<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        if text.chars().count() <= self.config.chunk_size {
            if text.is_empty() {
                return Vec::new();
            }
            return vec![(0, text)];
        }

        self.splitter.chunk_indices(text).collect()
    }
}
