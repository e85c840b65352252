//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Message, Update, User};
use crate::domain::traits::{Bot, BotInfo, OutgoingMessage};

/// Chat id used for every console message
pub const CONSOLE_CHAT_ID: i64 = 1;

/// Console bot adapter: stdin lines in, stdout out
pub struct ConsoleAdapter {
    info: BotInfo,
    user: User,
    sender: Option<mpsc::UnboundedSender<OutgoingMessage>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: 0,
                name: "finch-bot".to_string(),
                username: "console".to_string(),
            },
            user: User::new(1).with_username("console"),
            sender: None,
        }
    }

    /// Copy every outgoing message to `sender` instead of printing it
    pub fn with_sender(mut self, sender: mpsc::UnboundedSender<OutgoingMessage>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Who console messages appear to come from
    pub fn with_user(mut self, user: User) -> Self {
        self.user = user;
        self
    }

    /// Turn each non-empty input line into an update until EOF or until the
    /// dispatcher goes away.
    pub async fn read_updates<R>(&self, input: R, updates: mpsc::Sender<Update>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut next_id = 1;

        while let Some(line) = lines.next_line().await? {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let message = Message::new(CONSOLE_CHAT_ID, self.user.clone(), text).with_id(next_id);
            if updates.send(Update::new(next_id, message)).await.is_err() {
                break;
            }
            next_id += 1;
        }

        Ok(())
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, message: OutgoingMessage) -> Result<i64, BotError> {
        match &self.sender {
            Some(sender) => sender
                .send(message)
                .map_err(|_| BotError::Internal("console output closed".to_string()))?,
            None => println!("[BOT] {}", message.text),
        }
        Ok(0)
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
