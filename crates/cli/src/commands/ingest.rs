//! Ingest command handler.
//!
//! Adds documents from a JSON file, a directory of text files, or the command
//! line to the knowledge base.

use super::{open_store, print_json};
use clap::Args;
use ragline_core::{config::AppConfig, AppError, AppResult};
use ragline_knowledge::{Document, DocumentType};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Add documents to the knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// JSON file holding one document or an array of documents
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Directory of text files to ingest, one document per file
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// File extensions picked up by --dir
    #[arg(long, value_delimiter = ',', default_value = "md,txt")]
    pub ext: Vec<String>,

    /// Content of a single document
    #[arg(long)]
    pub content: Option<String>,

    /// Title of the single document (derived from content when omitted)
    #[arg(long)]
    pub title: Option<String>,

    /// Source of the single document
    #[arg(long, default_value = "cli")]
    pub source: String,

    /// Type of the documents: faq, article, manual, knowledge_base, other
    #[arg(long = "type", default_value = "article")]
    pub doc_type: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let documents = self.collect_documents()?;
        if documents.is_empty() {
            return Err(AppError::Validation(
                "Nothing to ingest: pass --file, --dir or --content".to_string(),
            ));
        }

        let store = open_store(config).await?;
        let report = store.ingest(documents).await?;

        if self.json {
            print_json(&report)?;
        } else {
            println!(
                "Ingested {} documents ({} chunks){}",
                report.documents,
                report.chunks,
                if report.replaced_placeholder {
                    "; knowledge base initialized"
                } else {
                    ""
                }
            );
        }

        Ok(())
    }

    fn collect_documents(&self) -> AppResult<Vec<Document>> {
        let doc_type: DocumentType = self.doc_type.parse()?;
        let mut documents = Vec::new();

        if let Some(file) = &self.file {
            documents.extend(read_document_file(file)?);
        }

        if let Some(dir) = &self.dir {
            documents.extend(read_document_dir(dir, &self.ext, doc_type)?);
        }

        if let Some(content) = &self.content {
            let mut doc = Document::new(content.clone())
                .with_source(self.source.clone())
                .with_type(doc_type);
            if let Some(title) = &self.title {
                doc = doc.with_title(title.clone());
            }
            documents.push(doc);
        }

        Ok(documents)
    }
}

/// Parse a JSON file holding a document or an array of documents.
fn read_document_file(path: &Path) -> AppResult<Vec<Document>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Validation(format!("Failed to read {:?}: {}", path, e))
    })?;

    let value: serde_json::Value = serde_json::from_str(&contents)?;
    let documents = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };

    tracing::debug!("Read {} documents from {:?}", documents.len(), path);
    Ok(documents)
}

/// One document per matching file, titled by file stem, sourced by relative path.
fn read_document_dir(dir: &Path, extensions: &[String], doc_type: DocumentType) -> AppResult<Vec<Document>> {
    if !dir.is_dir() {
        return Err(AppError::Validation(format!("Not a directory: {:?}", dir)));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if !path.is_file() || !matches {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        if content.trim().is_empty() {
            tracing::debug!("Skipping empty file {:?}", path);
            continue;
        }

        let source = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        documents.push(
            Document::new(content)
                .with_source(source)
                .with_title(title)
                .with_type(doc_type),
        );
    }

    tracing::debug!("Collected {} documents from {:?}", documents.len(), dir);
    Ok(documents)
}
