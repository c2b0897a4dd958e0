//! Grounded reply generation.
//!
//! Retrieves context from the knowledge store, renders the grounding prompt
//! and asks the completion service for an answer.

pub mod composer;
pub mod types;

pub use composer::ResponseComposer;
pub use types::{reply_text, ChatReply, ChatReplyMetadata, RetrievedDocPreview};
