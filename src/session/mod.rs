/// Session management module - Gateway

mod manager;
mod types;

pub use manager::SessionManager;
pub use types::{Session, SessionInitPayload, UserId};
