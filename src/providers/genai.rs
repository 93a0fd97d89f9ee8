//! LLM completion provider over the `genai` multi-provider client.
//!
//! The provider adapter is inferred by `genai` from the model name, with API keys
//! read from the usual environment variables (`GEMINI_API_KEY`, `GROQ_API_KEY`, ...).

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, error};

use super::CompletionProvider;
use super::error::{ProviderError, ProviderResult};

const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Single-turn chat completion against one model.
#[derive(Clone)]
pub struct GenaiProvider {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl GenaiProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    /// Shares an existing client between several models.
    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions::default().with_temperature(DEFAULT_TEMPERATURE),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for GenaiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiProvider")
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl CompletionProvider for GenaiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> ProviderResult<String> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt.to_string())]);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&self.options))
            .await
            .map_err(|e| {
                error!(model = %self.model, "Provider error: {}", e);
                ProviderError::Request(e.to_string())
            })?;

        let text = response.first_text().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        debug!(model = %self.model, len = text.len(), "Completion received");
        Ok(text)
    }
}
