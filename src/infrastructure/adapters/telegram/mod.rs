//! Telegram adapter

pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities;
use crate::domain::traits::{Bot, BotInfo, OutgoingMessage};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Pause before polling again after a failed `getUpdates`
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

impl From<User> for entities::User {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_bot: user.is_bot,
        }
    }
}

impl From<Update> for entities::Update {
    /// Messages without text or without a sender carry nothing to route and
    /// become an empty update.
    fn from(update: Update) -> Self {
        let message = update.message.and_then(|m| {
            let text = m.text?;
            let sender = m.from?;
            let timestamp = DateTime::<Utc>::from_timestamp(m.date, 0).unwrap_or_else(Utc::now);
            Some(
                entities::Message::new(m.chat.id, sender.into(), text)
                    .with_id(m.message_id)
                    .with_timestamp(timestamp),
            )
        });

        Self {
            id: update.update_id,
            message,
        }
    }
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_client(token, Client::new())
    }

    /// Use a preconfigured HTTP client (proxies, custom TLS)
    pub fn with_client(token: impl Into<String>, client: Client) -> Self {
        Self {
            token: token.into(),
            client,
            info: BotInfo::default(),
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, BotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{}: {}", method, e)))?;

        if !data.ok {
            let description = data.description.unwrap_or_else(|| status.to_string());
            return Err(BotError::Api(format!("{}: {}", method, description)));
        }

        data.result
            .ok_or_else(|| BotError::Parse(format!("{}: response has no result", method)))
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Me {
            id: i64,
            first_name: String,
            username: String,
        }

        let me: Me = self.call("getMe", &serde_json::json!({})).await?;
        self.info = BotInfo {
            id: me.id,
            name: me.first_name,
            username: me.username,
        };

        tracing::info!("Authorized on account @{}", self.info.username);
        Ok(())
    }

    /// Point Telegram at `url`; an empty url removes the webhook
    pub async fn set_webhook(&self, url: &str) -> Result<(), BotError> {
        let _: bool = self.call("setWebhook", &serde_json::json!({ "url": url })).await?;
        Ok(())
    }

    /// `getUpdates` refuses to work while a webhook is set
    pub async fn delete_webhook(&self) -> Result<(), BotError> {
        self.set_webhook("").await
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: u64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        self.call("getUpdates", &request).await
    }

    /// Offset acknowledging everything in `updates`
    pub fn next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Long-poll forever, feeding `updates`. Returns once the receiving side
    /// is gone; transient API failures are logged and retried.
    pub async fn poll(self: Arc<Self>, updates: mpsc::Sender<entities::Update>, timeout: u64) -> Result<(), BotError> {
        self.delete_webhook().await?;
        tracing::info!(timeout, "Polling for updates");

        let mut offset = 0;
        loop {
            let batch = match self.get_updates(offset, timeout).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!("Failed to get updates, retrying: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            if let Some(next) = Self::next_offset(&batch) {
                offset = next;
            }

            for raw in batch {
                tracing::debug!(update = ?raw, "Received update");
                if updates.send(raw.into()).await.is_err() {
                    tracing::info!("Dispatcher gone, stopping poll");
                    return Ok(());
                }
            }
        }
    }

    /// Register bot commands with Telegram
    pub async fn set_my_commands(&self, commands: &[(String, String)]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command<'a> {
            command: &'a str,
            description: &'a str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest<'a> {
            commands: Vec<Command<'a>>,
        }

        let request = SetMyCommandsRequest {
            commands: commands
                .iter()
                .map(|(command, description)| Command { command, description })
                .collect(),
        };

        let _: bool = self.call("setMyCommands", &request).await?;
        tracing::info!(count = commands.len(), "Registered bot commands with Telegram");
        Ok(())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn send_message(&self, message: OutgoingMessage) -> Result<i64, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: i64,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'static str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_to_message_id: Option<i64>,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        tracing::debug!("Sending to {}: {}", message.chat_id, message.text);

        let request = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: message.parse_mode.map(|m| m.as_str()),
            reply_to_message_id: message.reply_to,
        };

        let sent: MessageResult = self.call("sendMessage", &request).await?;
        Ok(sent.message_id)
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: serde_json::Value) -> Update {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_text_message_converts() {
        let update: entities::Update = raw(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "chat": { "id": -100 },
                "from": { "id": 1, "is_bot": false, "first_name": "Alice", "username": "alice" },
                "text": "/help"
            }
        }))
        .into();

        assert_eq!(update.id, 10);
        let message = update.message.unwrap();
        assert_eq!(message.id, 5);
        assert_eq!(message.chat_id, -100);
        assert_eq!(message.sender.to_string(), "alice");
        assert_eq!(message.text, "/help");
        assert_eq!(message.timestamp.timestamp(), 1700000000);
    }

    #[test]
    fn test_message_without_text_is_dropped() {
        let update: entities::Update = raw(serde_json::json!({
            "update_id": 11,
            "message": {
                "message_id": 6,
                "date": 1700000000,
                "chat": { "id": 1 },
                "from": { "id": 1, "first_name": "Alice" }
            }
        }))
        .into();

        assert!(update.message.is_none());
    }

    #[test]
    fn test_message_without_sender_is_dropped() {
        let update: entities::Update = raw(serde_json::json!({
            "update_id": 12,
            "message": { "message_id": 7, "chat": { "id": 1 }, "text": "hi" }
        }))
        .into();

        assert!(update.message.is_none());
    }

    #[test]
    fn test_update_without_message() {
        let update: entities::Update = raw(serde_json::json!({ "update_id": 13 })).into();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_next_offset() {
        let updates = vec![
            raw(serde_json::json!({ "update_id": 3 })),
            raw(serde_json::json!({ "update_id": 9 })),
        ];
        assert_eq!(TelegramAdapter::next_offset(&updates), Some(10));
        assert_eq!(TelegramAdapter::next_offset(&[]), None);
    }
}
