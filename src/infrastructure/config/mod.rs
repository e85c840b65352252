//! Runtime settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;
use crate::infrastructure::storage;

/// Bot settings, read from `finch.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub bot: BotSettings,
    pub transport: TransportSettings,
    pub dispatch: DispatchSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotSettings {
    pub token: Option<String>,
    pub debug: bool,
    /// Publish every command's BotFather entries with `setMyCommands` at startup
    pub publish_commands: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TransportSettings {
    /// Long-poll timeout passed to `getUpdates`
    pub poll_timeout_secs: u64,
    pub webhook: Option<WebhookSettings>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebhookSettings {
    /// Public base URL, e.g. `https://bot.example.com`
    pub domain: String,
    pub endpoint: String,
    pub listen_port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DispatchSettings {
    /// Updates buffered between the transport and the dispatcher
    pub queue_capacity: usize,
    /// Updates routed at the same time
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 86_400,
            webhook: None,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_concurrent: 64,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(storage::DEFAULT_CONFIG_PATH),
        }
    }
}

impl Settings {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read settings: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load `path` if it exists, fall back to defaults otherwise, then apply
    /// environment overrides.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let settings = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };

        Ok(settings.with_env())
    }

    pub fn with_env(mut self) -> Self {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.bot.token = Some(token);
        }

        if let Ok(path) = std::env::var(storage::CONFIG_ENV) {
            if !path.is_empty() {
                self.store.path = PathBuf::from(path);
            }
        }

        if let Ok(debug) = std::env::var("FINCH_DEBUG") {
            self.bot.debug = matches!(debug.as_str(), "1" | "true" | "yes");
        }

        self
    }

    pub fn token(&self) -> Result<&str, ConfigError> {
        self.bot
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField("bot.token".to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue("dispatch.queue-capacity must be at least 1".to_string()));
        }
        if self.dispatch.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue("dispatch.max-concurrent must be at least 1".to_string()));
        }
        if let Some(webhook) = &self.transport.webhook {
            if !webhook.endpoint.starts_with('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "transport.webhook.endpoint must start with '/': {}",
                    webhook.endpoint
                )));
            }
        }
        Ok(())
    }
}
