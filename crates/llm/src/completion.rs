//! Closed outcome of a completion call.

use crate::client::LlmResponse;
use crate::error::LlmError;

/// Result of asking the completion service for text.
///
/// Every failure a provider can produce folds into one of the three
/// error variants, so callers handle generation failures exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Success(String),
    RateLimited,
    AuthError,
    OtherError(String),
}

impl Completion {
    /// Fold a client result into a completion outcome.
    pub fn from_result(result: Result<LlmResponse, LlmError>) -> Self {
        match result {
            Ok(response) => Completion::Success(response.content.trim().to_string()),
            Err(LlmError::RateLimited(message)) => {
                tracing::warn!("Completion rate limited: {}", message);
                Completion::RateLimited
            }
            Err(LlmError::Unauthorized(message)) => {
                tracing::warn!("Completion rejected credentials: {}", message);
                Completion::AuthError
            }
            Err(other) => {
                tracing::warn!("Completion failed: {}", other);
                Completion::OtherError(other.to_string())
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Success(_))
    }

    /// Marker recorded in turn metadata when generation failed.
    pub fn error_marker(&self) -> Option<&'static str> {
        match self {
            Completion::Success(_) => None,
            Completion::RateLimited => Some("rate_limited"),
            Completion::AuthError => Some("auth_error"),
            Completion::OtherError(_) => Some("other_error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmUsage;

    fn response(content: &str) -> LlmResponse {
        LlmResponse {
            content: content.to_string(),
            model: "test".to_string(),
            usage: LlmUsage::default(),
            done: true,
        }
    }

    #[test]
    fn test_success_is_trimmed() {
        let outcome = Completion::from_result(Ok(response("  Hello there.\n")));
        assert_eq!(outcome, Completion::Success("Hello there.".to_string()));
        assert!(outcome.is_success());
        assert_eq!(outcome.error_marker(), None);
    }

    #[test]
    fn test_error_mapping() {
        let rate = Completion::from_result(Err(LlmError::RateLimited("quota".into())));
        assert_eq!(rate, Completion::RateLimited);
        assert_eq!(rate.error_marker(), Some("rate_limited"));

        let auth = Completion::from_result(Err(LlmError::Unauthorized("key".into())));
        assert_eq!(auth, Completion::AuthError);
        assert_eq!(auth.error_marker(), Some("auth_error"));

        let other = Completion::from_result(Err(LlmError::Transport("refused".into())));
        match &other {
            Completion::OtherError(message) => assert!(message.contains("refused")),
            _ => panic!("expected OtherError"),
        }
        assert_eq!(other.error_marker(), Some("other_error"));
    }
}
