//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration. It handles provider resolution and
//! credential checks.

use crate::client::LlmClient;
use crate::providers::{GroqClient, OllamaClient};
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "groq")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required for hosted providers)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// credential is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        "groq" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(
                    "Groq provider requires an API key (DOCQA_API_KEY or GROQ_API_KEY)".to_string(),
                )
            })?;
            let client = match endpoint {
                Some(endpoint) => GroqClient::with_base_url(api_key, endpoint),
                None => GroqClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown LLM provider: '{}'. Supported providers: ollama, groq",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", None, None) {
            Err(err) => assert!(err.to_string().contains("API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_create_groq_client() {
        let client = create_client("groq", None, Some("gsk-test")).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown LLM provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
