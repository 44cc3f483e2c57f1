//! Text Completion
//!
//! `complete(template, variables) -> text` on top of an `LlmProvider`, with a
//! bounded retry of transient failures using exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;

use crate::provider::LlmProvider;
use crate::template::{PromptTemplate, PromptVariables};
use crate::types::{LlmError, LlmRequestOptions, LlmResult, Message};

/// Prompt template in, text out
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        template: &PromptTemplate,
        vars: &PromptVariables,
    ) -> LlmResult<String>;
}

const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Sends rendered prompts to a provider as a single user message
pub struct Completer {
    provider: Arc<dyn LlmProvider>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl Completer {
    /// Create a completer using the provider's configured retry budget
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let max_retries = provider.config().max_retries;
        Self {
            provider,
            max_retries,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    async fn send_once(&self, prompt: &str) -> LlmResult<String> {
        let response = self
            .provider
            .send_message(
                vec![Message::user(prompt)],
                None,
                LlmRequestOptions::default(),
            )
            .await?;

        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError {
                message: format!("{} returned an empty completion", self.provider.name()),
            })
    }
}

#[async_trait]
impl TextCompletion for Completer {
    async fn complete(
        &self,
        template: &PromptTemplate,
        vars: &PromptVariables,
    ) -> LlmResult<String> {
        let prompt = template.render(vars)?;

        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(MAX_BACKOFF)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build();

        let mut attempt = 0u32;
        loop {
            match self.send_once(&prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let mut wait = backoff.next_backoff().unwrap_or(MAX_BACKOFF);
                    if let LlmError::RateLimited {
                        retry_after: Some(secs),
                        ..
                    } = &e
                    {
                        wait = wait.max(Duration::from_secs(u64::from(*secs)));
                    }
                    tracing::warn!(
                        provider = self.provider.name(),
                        attempt,
                        max_retries = self.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "completion failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
