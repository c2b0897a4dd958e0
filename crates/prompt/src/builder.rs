//! Prompt builder for rendering the grounding templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, ContextBlock, ConversationTurn, PromptDefinition};
use handlebars::Handlebars;
use ragline_core::{AppError, AppResult};
use serde_json::json;

/// Build a grounding prompt.
///
/// Renders the definition's system template with the enumerated context
/// blocks (each truncated to `preview_chars`) and its user template with the
/// conversation history followed by the current query.
///
/// # Example
/// ```no_run
/// use ragline_prompt::{build_prompt, loader::builtin_grounding_prompt, ContextBlock};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let blocks = vec![ContextBlock {
///     title: "Opening hours".into(),
///     source: "faq".into(),
///     content: "We are open 9-5 on weekdays.".into(),
/// }];
/// let built = build_prompt(&builtin_grounding_prompt(), &blocks, &[], "When do you open?")?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    blocks: &[ContextBlock],
    history: &[ConversationTurn],
    query: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building prompt '{}' with {} context blocks and {} history turns",
        definition.id,
        blocks.len(),
        history.len()
    );

    let documents: Vec<serde_json::Value> = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            json!({
                "number": i + 1,
                "title": block.title,
                "source": block.source,
                "content": truncate_chars(&block.content, definition.context.preview_chars),
            })
        })
        .collect();

    let turns: Vec<serde_json::Value> = history
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role,
                "label": turn.role.label(),
                "content": turn.content,
            })
        })
        .collect();

    let data = json!({
        "documents": documents,
        "history": turns,
        "query": query,
    });

    let handlebars = registry(definition)?;
    let system = handlebars
        .render("system", &data)
        .map_err(|e| AppError::Prompt(format!("Failed to render system template: {}", e)))?;
    let user = handlebars
        .render("user", &data)
        .map_err(|e| AppError::Prompt(format!("Failed to render user template: {}", e)))?;

    Ok(BuiltPrompt {
        system: if system.trim().is_empty() {
            None
        } else {
            Some(system)
        },
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            context_blocks: blocks.len(),
            history_turns: history.len(),
        },
    })
}

fn registry(definition: &PromptDefinition) -> AppResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("system", &definition.system)
        .map_err(|e| AppError::Prompt(format!("Failed to register system template: {}", e)))?;
    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Failed to register user template: {}", e)))?;

    Ok(handlebars)
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
