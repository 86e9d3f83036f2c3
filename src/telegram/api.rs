use anyhow::{Context as _, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{HTTP_REQUEST_TIMEOUT_SECS, TELEGRAM_API_BASE, TELEGRAM_POLL_TIMEOUT_SECS};
use crate::utils::MythosError;

// Wire types: the minimal subset of the Bot API this bot consumes

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub web_app_data: Option<WebAppData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Payload delivered by the mini app's sendData()
#[derive(Debug, Clone, Deserialize)]
pub struct WebAppData {
    pub data: String,
    pub button_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
pub struct KeyboardButton {
    pub text: String,
    pub web_app: WebAppInfo,
}

#[derive(Debug, Serialize)]
pub struct WebAppInfo {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Thin client for the Telegram Bot API. Holds no conversation state.
pub struct BotClient {
    client: Client,
    base_url: String,
}

impl BotClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_base(token, TELEGRAM_API_BASE)
    }

    /// Point the client at a different API host (tests)
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        // The poll timeout rides on top of the plain request timeout, since
        // getUpdates holds the connection open while it waits for events
        let timeout =
            std::time::Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS + TELEGRAM_POLL_TIMEOUT_SECS);
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: format!("{api_base}/bot{token}"),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach Telegram API method {method}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(
                MythosError::TelegramError(format!("{method} returned {status}: {error_text}"))
                    .into(),
            );
        }

        let api: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Malformed Telegram response for {method}"))?;
        if !api.ok {
            let description = api.description.unwrap_or_else(|| "no description".to_string());
            return Err(MythosError::TelegramError(format!("{method} failed: {description}")).into());
        }
        api.result
            .with_context(|| format!("Telegram response for {method} missing result"))
    }

    /// Long-poll for new updates starting at `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": TELEGRAM_POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Send text verbatim, with no parse mode. Model-generated replies go
    /// through here: Telegram's legacy Markdown parser rejects unbalanced
    /// `*`/`_` entities with a 400, and roleplay output is full of them.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
            }),
        )
        .await
    }

    pub async fn send_message_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &ReplyKeyboardMarkup,
    ) -> Result<Message> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
                "reply_markup": keyboard,
            }),
        )
        .await
    }

    /// Send a message while tearing down any visible reply keyboard
    pub async fn send_message_removing_keyboard(
        &self,
        chat_id: i64,
        text: &str,
    ) -> Result<Message> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
                "reply_markup": {"remove_keyboard": true},
            }),
        )
        .await
    }

    /// Replace a message's text. Carries model-generated content, so no
    /// parse mode here either.
    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }

    /// Show the "typing..." indicator while a reply is being generated
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendChatAction", json!({"chat_id": chat_id, "action": action}))
            .await?;
        Ok(())
    }
}
