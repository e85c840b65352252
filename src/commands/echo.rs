//! `/echo` - asks for a message and repeats it

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::CommandError;
use crate::application::services::Finch;
use crate::domain::entities::{CommandState, Help, Message};
use crate::domain::traits::{Command, CommandBase};

pub const PROMPT: &str = "say something";

#[derive(Default)]
pub struct EchoCommand {
    base: CommandBase,
}

impl EchoCommand {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Command for EchoCommand {
    fn help(&self) -> Help {
        Help::new("Echo")
            .with_description("Repeats the next message you send")
            .with_example("/echo@@")
            .with_botfather("echo", "Repeats your next message")
    }

    async fn init(&self, state: Arc<CommandState>, finch: &Finch) -> Result<(), CommandError> {
        self.base.init(state, finch)
    }

    fn should_run(&self, message: &Message) -> bool {
        self.base.is_command("echo", message)
    }

    async fn run(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        finch.quick_reply(message, PROMPT).await?;
        self.base.wait_for_reply();
        Ok(())
    }

    async fn run_as_reply(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        self.base.reply_received();
        finch.quick_reply(message, message.text.as_str()).await?;
        Ok(())
    }
}
