use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::{CommandRegistry, Message};
use crate::domain::traits::{Bot, BotInfo, OutgoingMessage};
use crate::infrastructure::storage::ConfigStore;

/// The bot instance: platform client, shared config store and command registry.
///
/// Built once at startup and shared behind an `Arc` by every routed update.
/// The registry is never mutated after construction.
pub struct Finch {
    api: Arc<dyn Bot>,
    config: ConfigStore,
    commands: CommandRegistry,
    initialized: AtomicBool,
}

/// Outcome of the init phase
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InitSummary {
    pub ready: Vec<String>,
    pub disabled: Vec<String>,
}

impl Finch {
    pub fn new(api: Arc<dyn Bot>, config: ConfigStore, commands: CommandRegistry) -> Self {
        Self {
            api,
            config,
            commands,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &Arc<dyn Bot> {
        &self.api
    }

    pub fn bot_info(&self) -> BotInfo {
        self.api.bot_info()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Bind every command to its state, in registration order.
    ///
    /// A command whose `init` fails is disabled and skipped by the router;
    /// the rest still initialize. Runs at most once.
    pub async fn init_commands(&self) -> InitSummary {
        let mut summary = InitSummary::default();

        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::warn!("Commands already initialized, skipping");
            return summary;
        }

        for entry in self.commands.iter() {
            let name = entry.name();
            match entry.command().init(entry.state().clone(), self).await {
                Ok(()) => {
                    tracing::debug!(command = %name, "Command initialized");
                    summary.ready.push(name);
                }
                Err(e) => {
                    tracing::error!(command = %name, "Command failed to initialize, disabling: {}", e);
                    entry.state().disable();
                    summary.disabled.push(name);
                }
            }
        }

        tracing::info!(
            ready = summary.ready.len(),
            disabled = summary.disabled.len(),
            "Commands initialized"
        );
        summary
    }

    /// Send a message. Every `@@` in the text becomes `@<bot username>`,
    /// escaped for the message's parse mode.
    pub async fn send_message(&self, mut message: OutgoingMessage) -> Result<i64, BotError> {
        if message.text.contains("@@") {
            let username = self.api.bot_info().username;
            let mention = match message.parse_mode {
                Some(mode) => format!("@{}", mode.escape(&username)),
                None => format!("@{}", username),
            };
            message.text = message.text.replace("@@", &mention);
        }

        match self.api.send_message(message).await {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::warn!("Failed to send message: {}", e);
                Err(e)
            }
        }
    }

    /// Reply to `message` in the same chat
    pub async fn quick_reply(&self, message: &Message, text: impl Into<String>) -> Result<i64, BotError> {
        let reply = OutgoingMessage::new(message.chat_id, text).reply_to(message.id);
        self.send_message(reply).await
    }
}
