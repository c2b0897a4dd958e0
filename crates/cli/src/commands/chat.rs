//! Chat command handler.
//!
//! Answers one message grounded on the knowledge base, optionally continuing
//! a conversation read from a JSON history file.

use super::{open_store, print_json};
use clap::Args;
use ragline_core::{config::AppConfig, AppError, AppResult};
use ragline_knowledge::ResponseComposer;
use ragline_llm::create_client;
use ragline_prompt::{resolve_prompt, ConversationTurn, GROUNDING_PROMPT_ID};
use std::path::{Path, PathBuf};

/// Answer a message grounded on the knowledge base
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The user message
    pub query: String,

    /// JSON array of prior turns: [{"role": "user"|"assistant", "content": "..."}]
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let history = match &self.history {
            Some(path) => read_history(path)?,
            None => Vec::new(),
        };

        let store = open_store(config).await?;

        let endpoint = config.provider_endpoint(&config.provider);
        let api_key = config.resolve_api_key(&config.provider);
        let client = create_client(&config.provider, endpoint.as_deref(), api_key.as_deref())?;

        let prompt = resolve_prompt(&config.prompts_dir(), GROUNDING_PROMPT_ID)?;
        tracing::debug!("Using prompt '{}' ({})", prompt.id, prompt.title);

        let composer = ResponseComposer::new(
            client,
            prompt,
            config.model.clone(),
            config.generation.clone(),
        );
        let reply = composer.respond(&store, &history, &self.query).await;

        if self.json {
            return print_json(&reply);
        }

        println!("{}", reply.text);
        if !reply.metadata.retrieved_docs.is_empty() {
            println!();
            println!("Sources:");
            for doc in &reply.metadata.retrieved_docs {
                println!("  - {} ({})", doc.title, doc.source);
            }
        }

        Ok(())
    }
}

fn read_history(path: &Path) -> AppResult<Vec<ConversationTurn>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Validation(format!("Failed to read history {:?}: {}", path, e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}
