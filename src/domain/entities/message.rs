use super::User;
use chrono::{DateTime, Utc};

/// One inbound event from the messaging transport.
///
/// `message` is `None` when the transport delivered something the router
/// cannot act on (edits, channel posts without a sender, media without text).
#[derive(Debug, Clone)]
pub struct Update {
    pub id: i64,
    pub message: Option<Message>,
}

impl Update {
    pub fn new(id: i64, message: Message) -> Self {
        Self {
            id,
            message: Some(message),
        }
    }

    /// An update that carries nothing routable.
    pub fn empty(id: i64) -> Self {
        Self { id, message: None }
    }
}

/// A text message with everything routing and commands rely on
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub sender: User,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: i64, sender: User, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            chat_id,
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
