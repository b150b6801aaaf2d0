//! LLM integration crate for the docqa system.
//!
//! This crate provides a provider-agnostic abstraction for generating
//! answers with Large Language Models. It supports multiple providers
//! through a unified trait-based interface.
//!
//! # Providers
//! - **Ollama**: local LLM runtime (default)
//! - **Groq**: hosted OpenAI-compatible chat completions
//!
//! # Example
//! ```no_run
//! use docqa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
pub use factory::create_client;
pub use providers::{GroqClient, OllamaClient};
