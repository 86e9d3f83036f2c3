/// Constants module to avoid magic numbers and scattered policy strings

// Network Configuration
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_REFERER: &str = "https://mythos-engine.ai";
pub const OPENROUTER_TITLE: &str = "Mythos Engine Telegram";
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const TELEGRAM_POLL_TIMEOUT_SECS: u64 = 50;

// Generation policy, fixed per request rather than user-tunable
pub const DEFAULT_MODEL_NAME: &str = "gryphe/mythomax-l2-13b";
pub const DEFAULT_TEMPERATURE: f32 = 0.85;
pub const DEFAULT_MAX_TOKENS: usize = 400;

// Liveness server
pub const DEFAULT_HEALTH_PORT: u16 = 5000;
pub const HEALTH_RESPONSE: &str = "Mythos Engine Bot is active.";

// Persona defaults, substituted for any missing init payload field
pub const DEFAULT_AI_NAME: &str = "The Sovereign";
pub const DEFAULT_AI_DESC: &str = "A mysterious entity.";
pub const DEFAULT_USER_NAME: &str = "The Guest";
pub const DEFAULT_SCENARIO: &str = "An empty throne room.";

// Fixed user-facing strings
pub const FALLBACK_REPLY: &str =
    "*(The ink fades... the connection to the void was lost. Please try again.)*";
pub const NO_SESSION_GUIDANCE: &str =
    "The ink has not yet touched the scroll. Tap /start to begin your story.";
pub const MANIFEST_FAILED_MESSAGE: &str =
    "An error occurred while manifesting reality. Please try again.";
pub const WEAVING_STATUS: &str = "⏳ *Weaving fate...*";
pub const MANIFEST_BUTTON_LABEL: &str = "✨ Manifest Reality ✨";
pub const WELCOME_MESSAGE: &str = "Welcome to the **Mythos Engine**.\n\n\
Tap the button below to configure your Sovereign and your Kingdom. \
Once you manifest reality, our story will begin here.";
