use thiserror::Error;

/// Main error type for the Mythos Engine
#[derive(Error, Debug)]
pub enum MythosError {
    /// The user tried to continue a conversation that was never initialized.
    /// Expected condition, surfaced as guidance text rather than logged as a fault.
    #[error("no active session for this user")]
    NoSession,

    #[error("malformed session payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Telegram API error: {0}")]
    TelegramError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
