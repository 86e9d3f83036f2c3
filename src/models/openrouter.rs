use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::traits::CompletionBackend;
use super::types::{ChatMessage, GenerationConfig};
use crate::constants::{
    HTTP_REQUEST_TIMEOUT_SECS, OPENROUTER_BASE_URL, OPENROUTER_REFERER, OPENROUTER_TITLE,
};

/// Completion backend speaking the OpenAI chat-completions format to OpenRouter
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    generation: GenerationConfig,
}

impl OpenRouterClient {
    /// Create a client against the default OpenRouter endpoint
    pub fn new(api_key: impl Into<String>, generation: GenerationConfig) -> Result<Self> {
        Self::with_base_url(api_key, OPENROUTER_BASE_URL, generation)
    }

    /// Create a client against a custom endpoint (configuration override)
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        generation: GenerationConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
            generation,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request_body = json!({
            "model": self.generation.model,
            "messages": messages,
            "temperature": self.generation.temperature,
            "max_tokens": self.generation.max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", OPENROUTER_REFERER)
            .header("X-Title", OPENROUTER_TITLE)
            .json(&request_body)
            .send()
            .await
            .with_context(|| format!("Failed to reach completion endpoint at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            anyhow::bail!("Completion endpoint returned {}: {}", status, error_text);
        }

        let response_json: ChatCompletionResponse = response
            .json()
            .await
            .context("Malformed completion response body")?;

        // The endpoint may return several candidates; only the first is read
        let choice = response_json
            .choices
            .into_iter()
            .next()
            .context("Completion response contained no choices")?;

        Ok(choice.message.content)
    }

    fn name(&self) -> &str {
        &self.generation.model
    }
}

// Response structures for the chat-completions endpoint (OpenAI format)

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}
