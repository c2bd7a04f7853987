use std::env;
use std::fs;

use log::warn;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::PollDefaults;
use crate::models::options::MAX_COLOR;

const CONFIG_PATH_VAR: &str = "VOTEMASTER_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Text in front of every command, e.g. `!` for `!poll`. May be empty.
    pub command_prefix: String,
    pub default_timeout_minutes: u64,
    pub default_color: u32,
    // Declared for compatibility; none of these do anything yet
    pub persistence: bool,
    pub localization: Option<String>,
    pub charts: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            default_timeout_minutes: 60,
            default_color: 0x3498db,
            persistence: false,
            localization: None,
            charts: false,
        }
    }
}

impl BotConfig {
    /// Load from the JSON file named by `VOTEMASTER_CONFIG` (if set), then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| env::var(key).ok())
    }

    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        config.warn_unsupported();
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_string(),
            source,
        })
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("VOTEMASTER_PREFIX") {
            self.command_prefix = prefix.trim().to_string();
        }
        if let Some(value) = lookup("VOTEMASTER_DEFAULT_TIMEOUT") {
            self.default_timeout_minutes = parse_number("VOTEMASTER_DEFAULT_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("VOTEMASTER_DEFAULT_COLOR") {
            self.default_color = parse_number("VOTEMASTER_DEFAULT_COLOR", &value)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "default_timeout_minutes".to_string(),
                value: "0".to_string(),
            });
        }
        if self.command_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                key: "command_prefix".to_string(),
                value: self.command_prefix.clone(),
            });
        }
        if self.default_color > MAX_COLOR {
            return Err(ConfigError::InvalidValue {
                key: "default_color".to_string(),
                value: self.default_color.to_string(),
            });
        }
        Ok(())
    }

    fn warn_unsupported(&self) {
        if self.persistence {
            warn!("`persistence` is enabled but polls are kept in memory only");
        }
        if let Some(locale) = &self.localization {
            warn!("`localization` is set to {} but only English replies exist", locale);
        }
        if self.charts {
            warn!("`charts` is enabled but chart output is not available");
        }
    }

    pub fn poll_defaults(&self) -> PollDefaults {
        PollDefaults {
            timeout_minutes: self.default_timeout_minutes,
            color: self.default_color,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// The bot token. Required.
pub fn discord_token() -> Result<String, ConfigError> {
    env::var("DISCORD_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingToken)
}
