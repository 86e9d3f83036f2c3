pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod server;
pub mod session;
pub mod telegram;
pub mod utils;

pub use app::{load_config, Config};
pub use models::{ChatMessage, CompletionGateway, MessageRole, OpenRouterClient};
pub use session::{SessionInitPayload, SessionManager};
pub use utils::MythosError;
