use tracing::error;

use super::traits::CompletionBackend;
use super::types::ChatMessage;
use crate::constants::FALLBACK_REPLY;

/// Stateless relay from an ordered transcript to the upstream completion
/// endpoint. Holds no conversation state between calls.
pub struct CompletionGateway {
    backend: Box<dyn CompletionBackend>,
}

impl CompletionGateway {
    pub fn new(backend: Box<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Generate a reply for the transcript. Never fails: any upstream
    /// problem (network, bad status, malformed body, missing field) is
    /// logged and collapsed into the fixed in-character fallback reply.
    /// No retries; a single failed attempt goes straight to the fallback.
    pub async fn generate(&self, transcript: &[ChatMessage]) -> String {
        match self.backend.complete(transcript).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("AI API error from {}: {:#}", self.backend.name(), e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
