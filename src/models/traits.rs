use anyhow::Result;
use async_trait::async_trait;

use super::types::ChatMessage;

/// Core trait every completion backend must implement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send an ordered transcript to the upstream model and return the reply text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Name of the upstream model
    fn name(&self) -> &str;
}
