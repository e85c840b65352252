use async_trait::async_trait;
use crate::application::errors::BotError;

/// Bot trait - abstraction for the outbound side of a messaging platform
#[async_trait]
pub trait Bot: Send + Sync {
    /// Send a message, returning the id the platform assigned to it
    async fn send_message(&self, message: OutgoingMessage) -> Result<i64, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Formatting applied by the platform to outgoing text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Telegram's legacy Markdown
    Markdown,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
        }
    }

    /// Escape `text` so it is shown literally in this mode
    pub fn escape(&self, text: &str) -> String {
        match self {
            ParseMode::Markdown => {
                let mut out = String::with_capacity(text.len());
                for c in text.chars() {
                    if matches!(c, '_' | '*' | '`' | '[') {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out
            }
        }
    }
}

/// A message on its way out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub reply_to: Option<i64>,
    pub parse_mode: Option<ParseMode>,
}

impl OutgoingMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
            parse_mode: None,
        }
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }
}

/// Bot information
#[derive(Debug, Clone, Default)]
pub struct BotInfo {
    pub id: i64,
    pub name: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_escape() {
        assert_eq!(ParseMode::Markdown.escape("finch_bot"), "finch\\_bot");
        assert_eq!(ParseMode::Markdown.escape("*a* `b` [c]"), "\\*a\\* \\`b\\` \\[c]");
        assert_eq!(ParseMode::Markdown.escape("plain text"), "plain text");
    }
}
