//! finch-bot - a Telegram bot framework built around a command registry.
//!
//! Commands register themselves in a [`CommandRegistry`] before the bot
//! starts. A [`Finch`] owns the registry, the platform client and the shared
//! [`ConfigStore`]; the [`Dispatcher`] routes every inbound update through a
//! [`Router`] as its own task.
//!
//! [`CommandRegistry`]: domain::entities::CommandRegistry
//! [`Finch`]: application::services::Finch
//! [`ConfigStore`]: infrastructure::storage::ConfigStore
//! [`Dispatcher`]: application::messaging::Dispatcher
//! [`Router`]: application::messaging::Router

pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;

pub use application::errors::{BotError, CommandError, ConfigError, StorageError};
pub use application::messaging::{Dispatcher, Router};
pub use application::services::Finch;
pub use domain::entities::{CommandRegistry, CommandState, Help, Message, Update, User};
pub use domain::traits::{Bot, BotInfo, Command, CommandBase, OutgoingMessage, ParseMode};
pub use infrastructure::storage::ConfigStore;
