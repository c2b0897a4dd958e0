//! Completion service errors.

use ragline_core::AppError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure modes of a completion call.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Provider rejected the call because of rate limits or exhausted quota
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Missing, invalid or revoked credentials
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Any other non-success HTTP status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection, DNS or timeout failures below HTTP
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl LlmError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized(body),
            _ => LlmError::Api {
                status: status.as_u16(),
                message: body,
            },
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err.to_string())
    }
}
