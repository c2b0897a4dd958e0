//! Grounding prompt system for ragline.
//!
//! This crate turns retrieved context, conversation history and the current
//! user query into the prompt sent to the completion service:
//! - Built-in grounding template, overridable from YAML
//! - Handlebars template rendering
//! - Bounded context previews with title/source attribution

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, truncate_chars};
pub use loader::{load_prompt, resolve_prompt, GROUNDING_PROMPT_ID};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, ContextBlock, ConversationTurn, PromptContextConfig,
    PromptDefinition, Role,
};
