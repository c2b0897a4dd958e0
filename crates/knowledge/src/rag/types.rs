//! Chat reply types.

use crate::types::{DocumentType, RetrievedChunk};
use ragline_llm::Completion;
use ragline_prompt::truncate_chars;
use serde::{Deserialize, Serialize};

/// Characters of each retrieved chunk echoed back in reply metadata.
pub const RETRIEVED_PREVIEW_CHARS: usize = 200;

/// Characters of a provider error message shown to the user.
const ERROR_DETAIL_CHARS: usize = 100;

pub const RATE_LIMITED_REPLY: &str =
    "I'm currently experiencing high demand. Please try again in a moment.";

pub const AUTH_ERROR_REPLY: &str = "Authentication error with AI service. Please contact support.";

/// A retrieved chunk as reported back with the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocPreview {
    /// First 200 characters followed by `...`
    pub content: String,
    pub source: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
}

impl From<&RetrievedChunk> for RetrievedDocPreview {
    fn from(chunk: &RetrievedChunk) -> Self {
        Self {
            content: format!(
                "{}...",
                truncate_chars(&chunk.content, RETRIEVED_PREVIEW_CHARS)
            ),
            source: chunk.source.clone(),
            title: chunk.title.clone(),
            doc_type: chunk.doc_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReplyMetadata {
    pub retrieved_docs: Vec<RetrievedDocPreview>,
    pub context_used: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The assistant turn produced for one user query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub metadata: ChatReplyMetadata,
}

/// Text shown to the user for a completion outcome.
pub fn reply_text(completion: &Completion) -> String {
    match completion {
        Completion::Success(text) => text.clone(),
        Completion::RateLimited => RATE_LIMITED_REPLY.to_string(),
        Completion::AuthError => AUTH_ERROR_REPLY.to_string(),
        Completion::OtherError(message) => format!(
            "I apologize, but I encountered an error: {}",
            truncate_chars(message, ERROR_DETAIL_CHARS)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_text_per_outcome() {
        assert_eq!(
            reply_text(&Completion::Success("We open at 9.".into())),
            "We open at 9."
        );
        assert_eq!(reply_text(&Completion::RateLimited), RATE_LIMITED_REPLY);
        assert_eq!(reply_text(&Completion::AuthError), AUTH_ERROR_REPLY);

        let long = "x".repeat(300);
        let text = reply_text(&Completion::OtherError(long));
        assert_eq!(
            text,
            format!("I apologize, but I encountered an error: {}", "x".repeat(100))
        );
    }

    #[test]
    fn test_preview_truncates() {
        let chunk = RetrievedChunk {
            content: "y".repeat(250),
            source: "faq".into(),
            title: "Y".into(),
            doc_type: DocumentType::Faq,
        };
        let preview = RetrievedDocPreview::from(&chunk);
        assert_eq!(preview.content, format!("{}...", "y".repeat(200)));
        assert_eq!(preview.source, "faq");
    }

    #[test]
    fn test_metadata_omits_missing_error() {
        let metadata = ChatReplyMetadata {
            retrieved_docs: vec![],
            context_used: false,
            model: "gpt-3.5-turbo".into(),
            error: None,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["context_used"], false);
    }
}
