//! Configuration loading and management.
//!
//! Loads bot configuration from `./config.toml` (or `$ANONSBOT_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//! A `.env` file is honored via `dotenvy` before loading.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Tracing log level filter used when `RUST_LOG` is unset.
    pub log_level: LogLevel,
    /// Telegram transport settings.
    pub telegram: TelegramConfig,
    /// Storage settings.
    pub store: StoreConfig,
    /// Liveness probe settings.
    pub health: HealthConfig,
    /// Author-visible field length bounds.
    pub limits: Limits,
}

/// Log level wrapper so the default is `"info"` rather than empty.
#[derive(Debug, Clone, Deserialize)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_owned())
    }
}

impl BotConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from the TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: BotConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(BotConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("ANONSBOT_CONFIG_PATH")
            .map_or_else(|| PathBuf::from("config.toml"), PathBuf::from)
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("ANONSBOT_LOG_LEVEL") {
            self.log_level = LogLevel(v);
        }

        if let Some(v) = env("ANONSBOT_BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = env("ANONSBOT_MODERATION_CHAT_ID") {
            match v.parse() {
                Ok(id) => self.telegram.moderation_chat_id = id,
                Err(_) => tracing::warn!(
                    var = "ANONSBOT_MODERATION_CHAT_ID",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("ANONSBOT_CHANNEL_ID") {
            match v.parse() {
                Ok(id) => self.telegram.channel_id = id,
                Err(_) => tracing::warn!(
                    var = "ANONSBOT_CHANNEL_ID",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        if let Some(v) = env("ANONSBOT_DATABASE_PATH") {
            self.store.database_path = v;
        }

        // Railway-style deployments set PORT; the namespaced var wins.
        let port = env("ANONSBOT_HEALTH_PORT").or_else(|| env("PORT"));
        if let Some(v) = port {
            match v.parse() {
                Ok(p) => self.health.port = p,
                Err(_) => tracing::warn!(
                    var = "ANONSBOT_HEALTH_PORT",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: BotConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

/// Telegram transport configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: Option<String>,
    /// Chat where submissions land for approve/reject. The moderator gate:
    /// only controls pressed in this chat may approve or reject.
    pub moderation_chat_id: i64,
    /// Channel where approved announcements are published.
    pub channel_id: i64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "__REDACTED__"))
            .field("moderation_chat_id", &self.moderation_chat_id)
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path.
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "anonsbot.db".to_owned(),
        }
    }
}

/// Liveness probe configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// TCP port the probe listens on.
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Author-visible field length bounds, in characters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Minimum theme length.
    pub theme_min: usize,
    /// Maximum theme length.
    pub theme_max: usize,
    /// Minimum place length.
    pub place_min: usize,
    /// Maximum place length. Wider than the rest to leave room for links.
    pub place_max: usize,
    /// Minimum contact length.
    pub contact_min: usize,
    /// Maximum contact length.
    pub contact_max: usize,
    /// Minimum time length.
    pub time_min: usize,
    /// Maximum time length.
    pub time_max: usize,
    /// Maximum description length. No minimum: the field is optional.
    pub description_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            theme_min: 3,
            theme_max: 100,
            place_min: 3,
            place_max: 500,
            contact_min: 3,
            contact_max: 100,
            time_min: 3,
            time_max: 100,
            description_max: 500,
        }
    }
}
