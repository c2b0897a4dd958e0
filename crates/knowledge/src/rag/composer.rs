//! Response composer: retrieved context + history + query -> reply.

use super::types::{reply_text, ChatReply, ChatReplyMetadata, RetrievedDocPreview};
use crate::store::KnowledgeStore;
use crate::types::RetrievedChunk;
use ragline_core::config::GenerationSettings;
use ragline_core::AppResult;
use ragline_llm::{Completion, LlmClient, LlmRequest};
use ragline_prompt::{build_prompt, BuiltPrompt, ContextBlock, ConversationTurn, PromptDefinition};
use std::sync::Arc;
use std::time::Duration;

pub struct ResponseComposer {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    settings: GenerationSettings,
}

impl ResponseComposer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
            settings,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render the grounding prompt.
    ///
    /// Only the most recent `max_history_turns` turns of `history` are used.
    pub fn compose(
        &self,
        chunks: &[RetrievedChunk],
        history: &[ConversationTurn],
        query: &str,
    ) -> AppResult<BuiltPrompt> {
        let blocks: Vec<ContextBlock> = chunks
            .iter()
            .map(|chunk| ContextBlock {
                title: chunk.title.clone(),
                source: chunk.source.clone(),
                content: chunk.content.clone(),
            })
            .collect();

        let skip = history.len().saturating_sub(self.settings.max_history_turns);
        build_prompt(&self.prompt, &blocks, &history[skip..], query)
    }

    /// Send a prompt to the completion service.
    pub async fn complete(&self, prompt: &BuiltPrompt) -> Completion {
        let mut request = LlmRequest::new(prompt.user.clone(), self.model.clone())
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature)
            .with_top_p(self.settings.top_p);
        if let Some(system) = &prompt.system {
            request = request.with_system(system.clone());
        }

        let timeout = Duration::from_secs(self.settings.timeout_secs);
        match tokio::time::timeout(timeout, self.client.complete(&request)).await {
            Ok(result) => Completion::from_result(result),
            Err(_) => {
                tracing::warn!(
                    "Completion via {} timed out after {}s",
                    self.client.provider_name(),
                    timeout.as_secs()
                );
                Completion::OtherError(format!(
                    "completion timed out after {}s",
                    timeout.as_secs()
                ))
            }
        }
    }

    /// Answer `query` grounded on the store's knowledge.
    ///
    /// Never fails: generation problems become a fallback text plus an error
    /// marker in the metadata.
    pub async fn respond(
        &self,
        store: &KnowledgeStore,
        history: &[ConversationTurn],
        query: &str,
    ) -> ChatReply {
        let retrieved = store.retrieve(query, store.default_top_k()).await;

        let completion = match self.compose(&retrieved, history, query) {
            Ok(prompt) => self.complete(&prompt).await,
            Err(e) => {
                tracing::warn!("Failed to build prompt: {}", e);
                Completion::OtherError(e.to_string())
            }
        };

        tracing::info!(
            "Reply composed with {} context chunks (success: {})",
            retrieved.len(),
            completion.is_success()
        );

        ChatReply {
            text: reply_text(&completion),
            metadata: ChatReplyMetadata {
                retrieved_docs: retrieved.iter().map(RetrievedDocPreview::from).collect(),
                context_used: !retrieved.is_empty(),
                model: self.model.clone(),
                error: completion.error_marker().map(str::to_string),
            },
        }
    }
}
