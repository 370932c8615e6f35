//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::ConfigError;
use crate::application::messaging::{AnimationSettings, ReservedGroups};
use crate::domain::entities::ReactionSet;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub reactions: ReactionSet,
    pub groups: ReservedGroups,
    pub animation: AnimationSettings,
    pub ascii: AsciiConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "hinko".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/hinko.db"),
        }
    }
}

/// Text grid bounds for landscape images (portrait images swap them) and
/// download limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AsciiConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub timeout_secs: u64,
    pub max_bytes: u64,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            max_width: 100,
            max_height: 70,
            timeout_secs: 15,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// `BOT_TOKEN` enables Telegram, `HINKO_DB_PATH` moves the database
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.set_token(token);
        }
        if let Ok(path) = std::env::var("HINKO_DB_PATH") {
            self.storage.path = PathBuf::from(path);
        }
    }

    pub fn set_token(&mut self, token: String) {
        let tg = self.adapters.telegram.get_or_insert_with(TelegramConfig::default);
        tg.token = Some(token);
        tg.enabled = true;
    }

    /// Telegram token, when the adapter is enabled and has one
    pub fn telegram_token(&self) -> Option<&str> {
        self.adapters
            .telegram
            .as_ref()
            .filter(|tg| tg.enabled)
            .and_then(|tg| tg.token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.animation.shark_length < 3 {
            return Err(ConfigError::InvalidValue(format!(
                "animation.shark-length must be at least 3, got {}",
                self.animation.shark_length
            )));
        }
        if self.animation.frames == 0 {
            return Err(ConfigError::InvalidValue("animation.frames must be positive".to_string()));
        }
        if self.ascii.max_width == 0 || self.ascii.max_height == 0 {
            return Err(ConfigError::InvalidValue("ascii bounds must be positive".to_string()));
        }
        if self.ascii.timeout_secs == 0 || self.ascii.max_bytes == 0 {
            return Err(ConfigError::InvalidValue("ascii download limits must be positive".to_string()));
        }
        if self.groups.team_names.is_empty() || self.groups.pair_names.is_empty() {
            return Err(ConfigError::MissingField("groups".to_string()));
        }
        if let Some(tg) = &self.adapters.telegram {
            if tg.enabled && tg.token.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingField("adapters.telegram.token".to_string()));
            }
        }
        Ok(())
    }
}
