//! Command parser - Recognises `/command@bot arguments` messages

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::domain::entities::Message;

static COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^/(\w+)(?:@(\w+))?(?:\s+(.*))?$").expect("command pattern is valid")
});

/// A leading `/command` token split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    /// Bot username after `@`, if the command was addressed to one.
    pub mention: Option<&'a str>,
    pub arguments: &'a str,
}

/// Parse the command at the start of `text`, if there is one.
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let caps = COMMAND.captures(text)?;
    Some(ParsedCommand {
        name: caps.get(1)?.as_str(),
        mention: caps.get(2).map(|m| m.as_str()),
        arguments: caps.get(3).map(|m| m.as_str().trim()).unwrap_or(""),
    })
}

/// True when `text` is `/name`, optionally with arguments, and either not
/// addressed to any bot or addressed to `bot_username`.
pub fn simple_command(name: &str, text: &str, bot_username: Option<&str>) -> bool {
    let Some(cmd) = parse_command(text) else {
        return false;
    };

    if !cmd.name.eq_ignore_ascii_case(name) {
        return false;
    }

    match cmd.mention {
        None => true,
        Some(mention) => bot_username.is_some_and(|u| u.eq_ignore_ascii_case(mention)),
    }
}

impl Message {
    /// Name of the leading command, without `/` or the bot mention
    pub fn command(&self) -> Option<&str> {
        parse_command(&self.text).map(|c| c.name)
    }

    /// Text after the leading command, trimmed; empty when there is none
    pub fn command_arguments(&self) -> &str {
        parse_command(&self.text).map(|c| c.arguments).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;

    #[test]
    fn test_parse_plain_command() {
        let cmd = parse_command("/help").unwrap();
        assert_eq!(cmd.name, "help");
        assert_eq!(cmd.mention, None);
        assert_eq!(cmd.arguments, "");
    }

    #[test]
    fn test_parse_mention_and_arguments() {
        let cmd = parse_command("/help@finch_bot  botfather ").unwrap();
        assert_eq!(cmd.name, "help");
        assert_eq!(cmd.mention, Some("finch_bot"));
        assert_eq!(cmd.arguments, "botfather");
    }

    #[test]
    fn test_parse_multiline_arguments() {
        let cmd = parse_command("/echo first\nsecond").unwrap();
        assert_eq!(cmd.arguments, "first\nsecond");
    }

    #[test]
    fn test_parse_rejects_non_commands() {
        assert!(parse_command("hello /help").is_none());
        assert!(parse_command("").is_none());
        assert!(parse_command("/").is_none());
        assert!(parse_command("/help-me").is_none());
    }

    #[test]
    fn test_simple_command_matching() {
        assert!(simple_command("stats", "/stats", Some("finch_bot")));
        assert!(simple_command("stats", "/stats now", None));
        assert!(simple_command("stats", "/stats@Finch_Bot", Some("finch_bot")));
        assert!(!simple_command("stats", "/stats@other_bot", Some("finch_bot")));
        assert!(!simple_command("stats", "/stats@finch_bot", None));
        assert!(!simple_command("stats", "/statistics", Some("finch_bot")));
        assert!(!simple_command("stats", "stats", Some("finch_bot")));
    }

    #[test]
    fn test_message_helpers() {
        let msg = Message::new(1, User::new(2), "/help botfather");
        assert_eq!(msg.command(), Some("help"));
        assert_eq!(msg.command_arguments(), "botfather");

        let msg = Message::new(1, User::new(2), "just text");
        assert_eq!(msg.command(), None);
        assert_eq!(msg.command_arguments(), "");
    }
}
