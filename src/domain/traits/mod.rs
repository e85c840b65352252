//! Domain traits - Abstractions implemented by adapters and commands

pub mod bot;
pub mod command;

pub use bot::{Bot, BotInfo, OutgoingMessage, ParseMode};
pub use command::{Command, CommandBase};
