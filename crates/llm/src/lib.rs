//! LLM integration crate for Cue.
//!
//! This crate is the AI collaborator used by the detection engine: a
//! provider-agnostic, one-shot completion interface plus the concrete
//! providers behind it.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Any OpenAI-compatible chat completions endpoint
//!
//! # Example
//! ```no_run
//! use cue_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Classify this question", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmImage, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_with_timeout};
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
