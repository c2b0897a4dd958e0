//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use ragline_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source tag carried by the bootstrap placeholder.
pub const PLACEHOLDER_SOURCE: &str = "system";

/// Title carried by the bootstrap placeholder.
pub const PLACEHOLDER_TITLE: &str = "Placeholder";

/// Text of the bootstrap placeholder.
pub const PLACEHOLDER_TEXT: &str = "This is a placeholder document.";

/// Maximum characters kept by [`derive_title`].
const TITLE_CHARS: usize = 100;

/// Kind of document being ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Faq,
    #[default]
    Article,
    Manual,
    KnowledgeBase,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Faq => "faq",
            DocumentType::Article => "article",
            DocumentType::Manual => "manual",
            DocumentType::KnowledgeBase => "knowledge_base",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faq" => Ok(DocumentType::Faq),
            "article" => Ok(DocumentType::Article),
            "manual" => Ok(DocumentType::Manual),
            "knowledge_base" => Ok(DocumentType::KnowledgeBase),
            "other" => Ok(DocumentType::Other),
            other => Err(AppError::Validation(format!(
                "Unknown document type '{}'. Expected one of: faq, article, manual, knowledge_base, other",
                other
            ))),
        }
    }
}

/// A document submitted for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document body
    pub content: String,

    /// Where the document came from
    #[serde(default = "default_source")]
    pub source: String,

    /// Display title; derived from the content when empty
    #[serde(default)]
    pub title: String,

    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,

    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

fn default_source() -> String {
    "unknown".to_string()
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: default_source(),
            title: String::new(),
            doc_type: DocumentType::default(),
            added_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_type(mut self, doc_type: DocumentType) -> Self {
        self.doc_type = doc_type;
        self
    }

    /// Metadata inherited by every chunk of this document.
    pub fn chunk_metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            source: self.source.clone(),
            title: self.title.clone(),
            doc_type: self.doc_type,
            added_at: self.added_at,
        }
    }
}

/// Metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub added_at: DateTime<Utc>,
}

/// A contiguous span of a document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// The sentinel entry a freshly bootstrapped index holds.
    pub fn placeholder() -> Self {
        Self {
            text: PLACEHOLDER_TEXT.to_string(),
            metadata: ChunkMetadata {
                source: PLACEHOLDER_SOURCE.to_string(),
                title: PLACEHOLDER_TITLE.to_string(),
                doc_type: DocumentType::Other,
                added_at: Utc::now(),
            },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.metadata.source == PLACEHOLDER_SOURCE && self.metadata.title == PLACEHOLDER_TITLE
    }
}

/// Retrieval result handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub source: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
}

impl From<Chunk> for RetrievedChunk {
    fn from(chunk: Chunk) -> Self {
        Self {
            content: chunk.text,
            source: chunk.metadata.source,
            title: chunk.metadata.title,
            doc_type: chunk.metadata.doc_type,
        }
    }
}

/// Knowledge base statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    /// Stored entries, placeholder included
    #[serde(rename = "totalDocuments")]
    pub total_documents: usize,

    pub dimension: Option<usize>,
}

/// Outcome of an ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    #[serde(rename = "replacedPlaceholder")]
    pub replaced_placeholder: bool,
}

/// Derive a display title from document content.
///
/// Takes the first 100 characters, trims them, and appends `...` when the
/// content is longer than that.
pub fn derive_title(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_CHARS).collect();
    title = title.trim().to_string();
    if content.chars().count() > TITLE_CHARS {
        title.push_str("...");
    }
    title
}
