//! Retrieve command handler.

use super::{open_store, print_json};
use clap::Args;
use ragline_core::{config::AppConfig, AppResult};
use ragline_knowledge::RetrievedChunk;
use serde::Serialize;

/// Show the chunks most relevant to a query
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ScoredChunk {
    #[serde(flatten)]
    chunk: RetrievedChunk,
    score: f32,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let top_k = self.top_k.unwrap_or(config.knowledge.default_top_k);
        tracing::info!("Executing retrieve command (k = {})", top_k);

        let store = open_store(config).await?;
        let results: Vec<ScoredChunk> = store
            .retrieve_scored(&self.query, top_k)
            .await?
            .into_iter()
            .map(|(chunk, score)| ScoredChunk {
                chunk: chunk.into(),
                score,
            })
            .collect();

        if self.json {
            return print_json(&results);
        }

        if results.is_empty() {
            println!("No relevant documents found.");
            return Ok(());
        }

        for (i, result) in results.iter().enumerate() {
            println!(
                "[{}] {} ({}, {}) score {:.3}",
                i + 1,
                result.chunk.title,
                result.chunk.source,
                result.chunk.doc_type,
                result.score
            );
            println!("{}", result.chunk.content);
            println!();
        }

        Ok(())
    }
}
