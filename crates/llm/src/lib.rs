//! ESG Survey LLM
//!
//! Provides a unified interface for the language-model collaborator:
//! - OpenAI and Groq (OpenAI-compatible chat completions)
//! - Ollama (local inference)
//!
//! Also includes the HTTP client factory, prompt templates and the retrying
//! `Completer` that turns a template plus variables into text.

pub mod completion;
pub mod http_client;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod template;
pub mod types;

use std::sync::Arc;

// Re-export main types
pub use completion::{Completer, TextCompletion};
pub use http_client::build_http_client;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use template::{variables, PromptTemplate, PromptVariables};
pub use types::*;

/// Create an LLM provider from a ProviderConfig.
///
/// Maps ProviderType to the concrete provider implementation.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    Ok(match config.provider {
        ProviderType::OpenAI | ProviderType::Groq => Arc::new(OpenAIProvider::new(config)?),
        ProviderType::Ollama => Arc::new(OllamaProvider::new(config)?),
    })
}
