use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender of an inbound message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
            last_name: None,
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: Option<impl Into<String>>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = last.map(|l| l.into());
        self
    }

    /// Username when set, otherwise the full name, otherwise the numeric id.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }

        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.id.to_string()
        } else {
            name
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefers_username() {
        let user = User::new(7).with_username("alice").with_name("Alice", Some("Liddell"));
        assert_eq!(user.to_string(), "alice");
    }

    #[test]
    fn test_display_falls_back_to_names() {
        let user = User::new(7).with_name("Alice", Some("Liddell"));
        assert_eq!(user.to_string(), "Alice Liddell");

        let user = User::new(7).with_name("Bob", None::<String>);
        assert_eq!(user.to_string(), "Bob");
    }

    #[test]
    fn test_display_falls_back_to_id() {
        assert_eq!(User::new(42).to_string(), "42");
    }
}
