use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::constants::{DEFAULT_AI_DESC, DEFAULT_AI_NAME, DEFAULT_SCENARIO, DEFAULT_USER_NAME};
use crate::models::ChatMessage;
use crate::utils::MythosError;

/// External identifier a session is keyed by. Telegram chat ids in practice,
/// but the session core never inspects it.
pub type UserId = i64;

/// Structured data from the web app used to seed a new conversation.
/// Every field is optional; defaults are substituted so initialization
/// never fails on missing fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInitPayload {
    pub ai_name: Option<String>,
    pub ai_desc: Option<String>,
    pub user_name: Option<String>,
    pub scenario: Option<String>,
}

impl SessionInitPayload {
    /// Parse the raw JSON string handed over by the web app
    pub fn from_json(raw: &str) -> Result<Self, MythosError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn ai_name(&self) -> &str {
        self.ai_name.as_deref().unwrap_or(DEFAULT_AI_NAME)
    }

    pub fn ai_desc(&self) -> &str {
        self.ai_desc.as_deref().unwrap_or(DEFAULT_AI_DESC)
    }

    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(DEFAULT_USER_NAME)
    }

    pub fn scenario(&self) -> &str {
        self.scenario.as_deref().unwrap_or(DEFAULT_SCENARIO)
    }
}

/// One user's conversation history, replayed in full on every completion
/// request. Append-only; turns are never reordered or deduplicated.
#[derive(Debug, Clone)]
pub struct Session {
    transcript: Vec<ChatMessage>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl Session {
    /// Seed a fresh session: the persona system turn, then the scenario opener
    pub fn new(payload: &SessionInitPayload) -> Self {
        let now = Local::now();
        Self {
            transcript: vec![
                ChatMessage::system(build_system_prompt(payload)),
                ChatMessage::user(build_opening_prompt(payload)),
            ],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        self.updated_at = Local::now();
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}

/// Persona and style instructions for the character the model plays.
/// Always the sole system turn, never shown to the user.
fn build_system_prompt(payload: &SessionInitPayload) -> String {
    let ai_name = payload.ai_name();
    let user_name = payload.user_name();
    format!(
        "You are playing as {ai_name}. Personality: {ai_desc}.\n\
User: {user_name}.\n\
\n\
You are a vivid, flawed character in immersive roleplay. Stay in character at all \
times. No disclaimers, no narrator voice, no breaking the fourth wall.\n\
\n\
The [SCENARIO SETUP] prompt describes {{user}}'s perspective and actions. DO NOT \
REPEAT THEM AS YOUR OWN.\n\
- You are {ai_name}, reacting to {{user}} entering your space or performing those actions.\n\
\n\
ADAPT INSTANTLY:\n\
Read {{user}}'s every word, tone and pace. Become exactly what fits the scene right now.\n\
Strict Rules:\n\
- Never push the story ahead unless {{user}} moves it forward first\n\
- Never write dialogue or actions for {user_name}. Only control your own character\n\
- 100% in-character voice, senses, and raw emotion\n\
- Use real, messy speech: hesitations, stutters, trailing thoughts\n\
- Vivid, believable physicality, always mixed with genuine feeling\n\
- Proactive when the scene calls for it, always reactive. Escalate naturally.\n\
- Always end open for reply. Target 30-40 words.\n\
\n\
Formatting:\n\
\"spoken dialogue\"\n\
*actions and physical sensations*\n\
*quiet thoughts or murmurs in italics*",
        ai_name = ai_name,
        ai_desc = payload.ai_desc(),
        user_name = user_name,
    )
}

/// The opening user turn: scenario text plus the directive to begin narrating
fn build_opening_prompt(payload: &SessionInitPayload) -> String {
    format!(
        "[SCENARIO SETUP]: {}\n\n[START THE STORY NOW AS {}]",
        payload.scenario(),
        payload.ai_name()
    )
}
