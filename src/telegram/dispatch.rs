use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, warn};

use super::api::{BotClient, KeyboardButton, Message, ReplyKeyboardMarkup, WebAppInfo};
use crate::constants::{
    MANIFEST_BUTTON_LABEL, MANIFEST_FAILED_MESSAGE, NO_SESSION_GUIDANCE, WEAVING_STATUS,
    WELCOME_MESSAGE,
};
use crate::session::{SessionInitPayload, SessionManager};
use crate::utils::MythosError;

const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Routes incoming Telegram updates onto the session manager.
/// Pure I/O shim: all conversation state lives behind the manager.
pub struct Dispatcher {
    bot: Arc<BotClient>,
    manager: Arc<SessionManager>,
    web_app_url: String,
}

impl Dispatcher {
    pub fn new(bot: Arc<BotClient>, manager: Arc<SessionManager>, web_app_url: String) -> Self {
        Self {
            bot,
            manager,
            web_app_url,
        }
    }

    /// Long-poll loop. Each update is handled on its own task so one
    /// user's outbound completion call never blocks another user's turn.
    pub async fn run(&self) -> Result<()> {
        let mut offset = 0i64;
        loop {
            let updates = match self.bot.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("getUpdates failed: {e:#}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };

                let bot = Arc::clone(&self.bot);
                let manager = Arc::clone(&self.manager);
                let web_app_url = self.web_app_url.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_message(bot, manager, web_app_url, message).await {
                        error!("failed to handle update: {e:#}");
                    }
                });
            }
        }
    }
}

async fn handle_message(
    bot: Arc<BotClient>,
    manager: Arc<SessionManager>,
    web_app_url: String,
    message: Message,
) -> Result<()> {
    let chat_id = message.chat.id;

    if let Some(web_app_data) = message.web_app_data {
        return handle_manifest(&bot, &manager, chat_id, &web_app_data.data).await;
    }

    match message.text.as_deref() {
        Some("/start") => handle_start(&bot, chat_id, &web_app_url).await,
        Some(text) => handle_text(&bot, &manager, chat_id, text).await,
        None => Ok(()),
    }
}

/// /start: welcome text plus the one-button web-app keyboard
async fn handle_start(bot: &BotClient, chat_id: i64, web_app_url: &str) -> Result<()> {
    let keyboard = ReplyKeyboardMarkup {
        keyboard: vec![vec![KeyboardButton {
            text: MANIFEST_BUTTON_LABEL.to_string(),
            web_app: WebAppInfo {
                url: web_app_url.to_string(),
            },
        }]],
        resize_keyboard: true,
    };
    bot.send_message_with_keyboard(chat_id, WELCOME_MESSAGE, &keyboard)
        .await?;
    Ok(())
}

/// Web-app payload: parse, seed a fresh session, and edit the status
/// message into the character's opening reply
async fn handle_manifest(
    bot: &BotClient,
    manager: &SessionManager,
    chat_id: i64,
    raw_payload: &str,
) -> Result<()> {
    // Parse before touching any session state; a malformed payload must
    // leave an existing conversation exactly as it was
    let payload = match SessionInitPayload::from_json(raw_payload) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Error processing web app data: {e}");
            bot.send_message(chat_id, MANIFEST_FAILED_MESSAGE).await?;
            return Ok(());
        }
    };

    let ai_name = payload.ai_name().to_string();
    let status = bot
        .send_message_removing_keyboard(chat_id, WEAVING_STATUS)
        .await?;

    let reply = manager.initialize_session(chat_id, payload).await;
    bot.edit_message_text(chat_id, status.message_id, &format!("*{ai_name}*:\n\n{reply}"))
        .await?;
    Ok(())
}

/// Plain text: continue the conversation, or nudge the user to /start
async fn handle_text(
    bot: &BotClient,
    manager: &SessionManager,
    chat_id: i64,
    text: &str,
) -> Result<()> {
    if let Err(e) = bot.send_chat_action(chat_id, "typing").await {
        warn!("sendChatAction failed: {e:#}");
    }

    match manager.continue_session(chat_id, text).await {
        Ok(reply) => {
            bot.send_message(chat_id, &reply).await?;
        }
        Err(MythosError::NoSession) => {
            bot.send_message(chat_id, NO_SESSION_GUIDANCE).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
