// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod gateway;
mod openrouter;
mod traits;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use gateway::CompletionGateway;
pub use openrouter::OpenRouterClient;
pub use traits::CompletionBackend;
pub use types::{ChatMessage, GenerationConfig, MessageRole};

#[cfg(test)]
pub use traits::MockCompletionBackend;
