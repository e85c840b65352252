use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::traits::Command;

/// Help metadata a command publishes for listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    pub name: String,
    pub description: String,
    pub example: String,
    /// `(command, description)` pairs in the format BotFather expects.
    pub botfather: Vec<(String, String)>,
}

impl Help {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    pub fn with_botfather(mut self, command: impl Into<String>, desc: impl Into<String>) -> Self {
        self.botfather.push((command.into(), desc.into()));
        self
    }

    /// Render for the help listing. `full` puts the description on its own
    /// line and appends the usage example.
    pub fn to_text(&self, full: bool) -> String {
        let mut out = String::with_capacity(self.name.len() + self.description.len() + 16);

        out.push_str(&self.name);
        out.push_str(if full { "\n" } else { " - " });
        out.push_str(&self.description);
        out.push('\n');

        if full {
            out.push_str("Example: ");
            out.push_str(&self.example);
            out.push('\n');
        }

        out.push('\n');
        out
    }

    /// One `command - description` line per BotFather entry.
    pub fn botfather_text(&self) -> String {
        self.botfather
            .iter()
            .map(|(command, desc)| format!("{} - {}", command, desc))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Routing state owned by one registry entry.
///
/// Only the owning command flips `waiting_for_reply`; the router reads it on
/// every update to choose between `run` and `run_as_reply`.
#[derive(Debug)]
pub struct CommandState {
    waiting_for_reply: AtomicBool,
    enabled: AtomicBool,
}

impl CommandState {
    pub fn new() -> Self {
        Self {
            waiting_for_reply: AtomicBool::new(false),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn waiting_for_reply(&self) -> bool {
        self.waiting_for_reply.load(Ordering::SeqCst)
    }

    pub fn set_waiting_for_reply(&self, waiting: bool) {
        self.waiting_for_reply.store(waiting, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }
}

impl Default for CommandState {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered command paired with its state
pub struct CommandEntry {
    command: Box<dyn Command>,
    state: Arc<CommandState>,
}

impl CommandEntry {
    pub fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }

    pub fn state(&self) -> &Arc<CommandState> {
        &self.state
    }

    /// Name used in logs; falls back to the type name for commands without help.
    pub fn name(&self) -> String {
        let help = self.command.help();
        if help.name.is_empty() {
            std::any::type_name_of_val(self.command.as_ref()).to_string()
        } else {
            help.name
        }
    }
}

/// Ordered command registry. Registration order is the order commands are
/// tried and the order they are listed in help output.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `command` with a fresh state. Only called during startup,
    /// before the registry is handed to the bot.
    pub fn register<C: Command + 'static>(&mut self, command: C) {
        self.entries.push(CommandEntry {
            command: Box::new(command),
            state: Arc::new(CommandState::new()),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    /// Help of every command, in registration order.
    pub fn helps(&self) -> Vec<Help> {
        self.entries.iter().map(|e| e.command.help()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Help {
        Help::new("Stats")
            .with_description("Displays some statistics")
            .with_example("/stats@@")
            .with_botfather("stats", "Displays some statistics about bot usage")
    }

    #[test]
    fn test_help_short_text() {
        assert_eq!(sample().to_text(false), "Stats - Displays some statistics\n\n");
    }

    #[test]
    fn test_help_full_text() {
        assert_eq!(
            sample().to_text(true),
            "Stats\nDisplays some statistics\nExample: /stats@@\n\n"
        );
    }

    #[test]
    fn test_botfather_text() {
        let help = sample().with_botfather("statsreset", "Reset counters");
        assert_eq!(
            help.botfather_text(),
            "stats - Displays some statistics about bot usage\nstatsreset - Reset counters"
        );
        assert_eq!(Help::default().botfather_text(), "");
    }

    #[test]
    fn test_state_flags() {
        let state = CommandState::new();
        assert!(!state.waiting_for_reply());
        assert!(state.is_enabled());

        state.set_waiting_for_reply(true);
        assert!(state.waiting_for_reply());

        state.disable();
        assert!(!state.is_enabled());
    }
}
