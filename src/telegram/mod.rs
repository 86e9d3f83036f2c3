// Gateway module for the Telegram transport adapter
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod api;
mod dispatch;

// Public re-exports - the ONLY way to access transport functionality
pub use api::{BotClient, Chat, Message, Update, WebAppData};
pub use dispatch::Dispatcher;
