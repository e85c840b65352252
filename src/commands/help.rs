//! `/help` - lists loaded commands

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::CommandError;
use crate::application::services::Finch;
use crate::domain::entities::{CommandRegistry, CommandState, Help, Message};
use crate::domain::traits::{Command, CommandBase, OutgoingMessage, ParseMode};

#[derive(Default)]
pub struct HelpCommand {
    base: CommandBase,
}

impl HelpCommand {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Full help of every command that has a description, in registration order
pub fn listing(commands: &CommandRegistry) -> String {
    let mut out = String::from("Loaded commands:\n\n");
    for help in commands.helps() {
        if help.description.is_empty() {
            continue;
        }
        out.push_str(&help.to_text(true));
    }
    out
}

/// BotFather lines of every command, in registration order
pub fn botfather_listing(commands: &CommandRegistry) -> String {
    commands
        .helps()
        .iter()
        .map(Help::botfather_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Command for HelpCommand {
    fn help(&self) -> Help {
        Help::new("Help")
            .with_description("Displays loaded commands and their help text")
            .with_example("/help@@")
            .with_botfather("help", "Displays available commands and help information")
    }

    async fn init(&self, state: Arc<CommandState>, finch: &Finch) -> Result<(), CommandError> {
        self.base.init(state, finch)
    }

    fn should_run(&self, message: &Message) -> bool {
        self.base.is_command("help", message)
    }

    async fn run(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        let text = if message.command_arguments() == "botfather" {
            botfather_listing(finch.commands())
        } else {
            listing(finch.commands())
        };

        // Listings hold no markup of their own; command names like `my_cmd` must survive.
        let reply = OutgoingMessage::new(message.chat_id, ParseMode::Markdown.escape(&text))
            .reply_to(message.id)
            .with_parse_mode(ParseMode::Markdown);
        finch.send_message(reply).await?;
        Ok(())
    }

    async fn run_as_reply(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        self.base.run_as_reply(finch, message)
    }
}
