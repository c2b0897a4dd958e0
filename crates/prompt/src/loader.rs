//! Prompt loader: built-in grounding prompt plus YAML overrides.

use crate::types::{PromptContextConfig, PromptDefinition};
use ragline_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the prompt used to ground chat replies.
pub const GROUNDING_PROMPT_ID: &str = "grounding";

const GROUNDING_SYSTEM: &str = r#"You are a helpful AI assistant for a chatbot service. Use the following context to answer the user's question when relevant.

{{#if documents}}Relevant information from knowledge base:
{{#each documents}}
[Document {{number}} - {{title}} ({{source}})]:
{{content}}
{{/each}}{{else}}No relevant documents found in the knowledge base.{{/if}}

Guidelines:
1. If the context contains relevant information, use it to formulate your answer.
2. If the context doesn't contain relevant information, acknowledge this and provide a helpful answer based on your general knowledge.
3. When using information from the context, you can mention that it's based on available documentation.
4. Be concise, accurate, and helpful.
5. If the user asks about something outside the context, say you don't have specific information but try to help generally.
6. Format your responses in a readable way with paragraphs when appropriate."#;

const GROUNDING_TEMPLATE: &str = r#"{{#each history}}{{label}}: {{content}}
{{/each}}User: {{query}}"#;

/// The built-in grounding prompt.
pub fn builtin_grounding_prompt() -> PromptDefinition {
    PromptDefinition {
        id: GROUNDING_PROMPT_ID.to_string(),
        title: "Knowledge-grounded chat reply".to_string(),
        api_version: "1.0".to_string(),
        context: PromptContextConfig::default(),
        system: GROUNDING_SYSTEM.to_string(),
        template: GROUNDING_TEMPLATE.to_string(),
    }
}

/// Load a prompt definition from `<prompts_dir>/<id>.yaml`.
///
/// # Example
/// ```no_run
/// use ragline_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("data/prompts"), "grounding")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yaml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Resolve a prompt: the YAML override when present, else the built-in.
///
/// Only the grounding prompt has a built-in; other ids must exist on disk.
pub fn resolve_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let override_file = prompts_dir.join(format!("{}.yaml", prompt_id));
    if override_file.exists() {
        return load_prompt(prompts_dir, prompt_id);
    }

    if prompt_id == GROUNDING_PROMPT_ID {
        return Ok(builtin_grounding_prompt());
    }

    Err(AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if def.context.preview_chars == 0 {
        return Err(AppError::Prompt(
            "Prompt previewChars must be positive".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
