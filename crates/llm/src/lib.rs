//! Completion-service integration for ragline.
//!
//! Provides a provider-agnostic abstraction over text-generation services
//! and a closed [`Completion`] outcome that callers match on instead of
//! inspecting error strings.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Any OpenAI-compatible chat completions endpoint
//!
//! # Example
//! ```no_run
//! use ragline_llm::{Completion, LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! match Completion::from_result(client.complete(&request).await) {
//!     Completion::Success(text) => println!("{}", text),
//!     other => eprintln!("generation failed: {:?}", other),
//! }
//! # }
//! ```

pub mod client;
pub mod completion;
pub mod error;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use completion::Completion;
pub use error::LlmError;
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
