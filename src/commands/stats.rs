//! Per-sender message counts, kept under the `stats` config key

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::errors::CommandError;
use crate::application::services::Finch;
use crate::domain::entities::{CommandState, Help, Message};
use crate::domain::traits::{Command, CommandBase};

/// Config key holding the counts
pub const STATS_KEY: &str = "stats";

/// Messages seen per sender display name
pub type UserMessageCount = BTreeMap<String, u64>;

/// Counts every message. Never listed in help.
#[derive(Default)]
pub struct StatsCollector {
    base: CommandBase,
    counts: Mutex<UserMessageCount>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Command for StatsCollector {
    fn help(&self) -> Help {
        Help::new("Stats Collector")
    }

    async fn init(&self, state: Arc<CommandState>, finch: &Finch) -> Result<(), CommandError> {
        self.base.init(state, finch)?;

        let stored: UserMessageCount = finch.config().get_as(STATS_KEY).await.unwrap_or_default();
        tracing::debug!(users = stored.len(), "Loaded message stats");
        *self.counts.lock().await = stored;
        Ok(())
    }

    fn should_run(&self, _message: &Message) -> bool {
        true
    }

    async fn run(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        // Held across the save so a later snapshot can't be overwritten by an older one.
        let mut counts = self.counts.lock().await;
        *counts.entry(message.sender.to_string()).or_insert(0) += 1;
        finch.config().set(STATS_KEY, &*counts).await?;
        Ok(())
    }

    async fn run_as_reply(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        self.base.run_as_reply(finch, message)
    }
}

/// `/stats` - replies with the collected counts
#[derive(Default)]
pub struct StatsCommand {
    base: CommandBase,
}

impl StatsCommand {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn render(counts: &UserMessageCount) -> String {
    let mut out = String::from("Users seen\n\n");
    for (user, count) in counts {
        out.push_str(&format!("{} - {}\n", user, count));
    }
    out
}

#[async_trait]
impl Command for StatsCommand {
    fn help(&self) -> Help {
        Help::new("Stats")
            .with_description("Displays some statistics")
            .with_example("/stats@@")
            .with_botfather("stats", "Displays some statistics about bot usage")
    }

    async fn init(&self, state: Arc<CommandState>, finch: &Finch) -> Result<(), CommandError> {
        self.base.init(state, finch)
    }

    fn should_run(&self, message: &Message) -> bool {
        self.base.is_command("stats", message)
    }

    async fn run(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        let counts: UserMessageCount = finch.config().get_as(STATS_KEY).await.unwrap_or_default();
        finch.quick_reply(message, render(&counts)).await?;
        Ok(())
    }

    async fn run_as_reply(&self, finch: &Finch, message: &Message) -> Result<(), CommandError> {
        self.base.run_as_reply(finch, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sorted_by_name() {
        let counts = UserMessageCount::from([("bob".to_string(), 2), ("alice".to_string(), 3)]);
        assert_eq!(render(&counts), "Users seen\n\nalice - 3\nbob - 2\n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&UserMessageCount::new()), "Users seen\n\n");
    }
}
