//! Command handlers for the ragline CLI.

pub mod chat;
pub mod ingest;
pub mod retrieve;
pub mod stats;

pub use chat::ChatCommand;
pub use ingest::IngestCommand;
pub use retrieve::RetrieveCommand;
pub use stats::StatsCommand;

use ragline_core::{config::AppConfig, AppError, AppResult};
use ragline_knowledge::{create_provider, KnowledgeStore};
use serde::Serialize;

/// Create the embedder and open the knowledge store under the data directory.
pub async fn open_store(config: &AppConfig) -> AppResult<KnowledgeStore> {
    let provider = create_provider(&config.knowledge.embedding).await?;
    KnowledgeStore::open(&config.knowledge, config.index_dir(), provider).await
}

pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(format!("JSON serialization failed: {}", e)))?;
    println!("{}", output);
    Ok(())
}
