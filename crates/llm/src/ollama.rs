//! Ollama Provider
//!
//! Implementation of the LlmProvider trait for Ollama local inference
//! using the ollama-rs native SDK. No API key is required.

use async_trait::async_trait;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::{ChatMessage, ChatMessageResponse, MessageRole as OllamaRole};
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;

use super::provider::LlmProvider;
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    StopReason, UsageStats,
};
use crate::http_client::build_http_client;

/// Default Ollama API endpoint
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Ollama provider for local inference using the native ollama-rs SDK
pub struct OllamaProvider {
    config: ProviderConfig,
    client: Ollama,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_URL)
            .to_string();

        let client = Self::create_client(&base_url, &config)?;

        Ok(Self { config, client })
    }

    /// Create an Ollama SDK client from a base URL string.
    ///
    /// `Ollama::new()` takes host and port separately, so the URL is split here.
    /// A proxy or timeout is honored by injecting a custom reqwest client.
    fn create_client(base_url: &str, config: &ProviderConfig) -> LlmResult<Ollama> {
        let parsed = url::Url::parse(base_url).map_err(|e| LlmError::InvalidRequest {
            message: format!("Invalid Ollama URL {}: {}", base_url, e),
        })?;
        let host = parsed.host_str().unwrap_or("localhost");
        let port = parsed.port().unwrap_or(11434);
        let host_url = format!("{}://{}", parsed.scheme(), host);

        let http_client = build_http_client(config.proxy.as_ref(), config.timeout_secs)?;
        Ok(Ollama::new_with_client(host_url, port, http_client))
    }

    /// Get the base URL for the Ollama server (used in error messages)
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_URL)
    }

    /// Build a ChatMessageRequest from our unified types
    fn build_chat_request(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> ChatMessageRequest {
        let mut chat_messages: Vec<ChatMessage> = Vec::new();

        if let Some(sys) = system {
            chat_messages.push(ChatMessage::system(sys.to_string()));
        }

        for msg in messages {
            let role = match msg.role {
                MessageRole::User => OllamaRole::User,
                MessageRole::Assistant => OllamaRole::Assistant,
                MessageRole::System => OllamaRole::System,
            };
            chat_messages.push(ChatMessage::new(role, msg.content.clone()));
        }

        let temperature = request_options
            .temperature_override
            .unwrap_or(self.config.temperature);
        let max_tokens = request_options
            .max_tokens_override
            .unwrap_or(self.config.max_tokens);

        let mut opts = ModelOptions::default().temperature(temperature);
        if max_tokens > 0 {
            opts = opts.num_predict(max_tokens as i32);
        }

        ChatMessageRequest::new(self.config.model.clone(), chat_messages).options(opts)
    }

    /// Convert an ollama-rs response to our unified LlmResponse
    fn convert_response(&self, response: &ChatMessageResponse) -> LlmResponse {
        let text = &response.message.content;

        let usage = response
            .final_data
            .as_ref()
            .map(|final_data| UsageStats {
                input_tokens: final_data.prompt_eval_count as u32,
                output_tokens: final_data.eval_count as u32,
            })
            .unwrap_or_default();

        LlmResponse {
            content: if text.is_empty() {
                None
            } else {
                Some(text.clone())
            },
            stop_reason: StopReason::EndTurn,
            usage,
            model: response.model.clone(),
        }
    }

    /// Map an SDK error string onto our error taxonomy
    fn map_error(&self, msg: String) -> LlmError {
        if msg.contains("connect") || msg.contains("Connection refused") {
            LlmError::ProviderUnavailable {
                message: format!("Cannot connect to Ollama at {}: {}", self.base_url(), msg),
            }
        } else if msg.contains("not found") || msg.contains("404") {
            LlmError::ModelNotFound {
                model: self.config.model.clone(),
            }
        } else {
            LlmError::NetworkError { message: msg }
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let request = self.build_chat_request(&messages, system.as_deref(), &request_options);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| self.map_error(e.to_string()))?;

        Ok(self.convert_response(&response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        self.client
            .list_local_models()
            .await
            .map_err(|e| self.map_error(e.to_string()))?;

        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
