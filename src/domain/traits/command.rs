use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;

use crate::application::errors::CommandError;
use crate::application::messaging::parser;
use crate::application::services::Finch;
use crate::domain::entities::{CommandState, Help, Message};

/// A unit of bot behaviour held by the registry.
///
/// Every method is required. Commands that only care about a few of them
/// embed a [`CommandBase`] and delegate the rest to it.
#[async_trait]
pub trait Command: Send + Sync {
    /// Metadata for help listings. May be empty.
    fn help(&self) -> Help;

    /// Called once at startup with this command's state. Failing here
    /// disables the command for the lifetime of the process.
    async fn init(&self, state: Arc<CommandState>, finch: &Finch) -> Result<(), CommandError>;

    /// Whether `run` should fire for this message. Must not have side effects.
    fn should_run(&self, message: &Message) -> bool;

    async fn run(&self, finch: &Finch, message: &Message) -> Result<(), CommandError>;

    /// Called instead of `run` while this command is waiting for a reply.
    async fn run_as_reply(&self, finch: &Finch, message: &Message) -> Result<(), CommandError>;
}

/// No-op command behaviour plus the bookkeeping most commands need.
#[derive(Debug, Default)]
pub struct CommandBase {
    state: OnceCell<Arc<CommandState>>,
    bot_username: OnceCell<String>,
}

impl CommandBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn help(&self) -> Help {
        Help::default()
    }

    /// Keep the state handle and the bot's username. Commands that override
    /// `init` should still call this.
    pub fn init(&self, state: Arc<CommandState>, finch: &Finch) -> Result<(), CommandError> {
        if self.state.set(state).is_err() {
            tracing::warn!("Command initialized more than once, keeping first state");
        }
        let _ = self.bot_username.set(finch.bot_info().username);
        Ok(())
    }

    pub fn should_run(&self, _message: &Message) -> bool {
        false
    }

    pub fn run(&self, _finch: &Finch, _message: &Message) -> Result<(), CommandError> {
        Ok(())
    }

    pub fn run_as_reply(&self, _finch: &Finch, _message: &Message) -> Result<(), CommandError> {
        Ok(())
    }

    pub fn state(&self) -> Option<&Arc<CommandState>> {
        self.state.get()
    }

    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.get().map(String::as_str)
    }

    /// `/name`, optionally addressed to this bot.
    pub fn is_command(&self, name: &str, message: &Message) -> bool {
        parser::simple_command(name, &message.text, self.bot_username())
    }

    /// Route the next message to `run_as_reply`.
    pub fn wait_for_reply(&self) {
        if let Some(state) = self.state.get() {
            state.set_waiting_for_reply(true);
        }
    }

    /// Back to normal routing.
    pub fn reply_received(&self) {
        if let Some(state) = self.state.get() {
            state.set_waiting_for_reply(false);
        }
    }
}
