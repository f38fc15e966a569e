use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use strum::{AsRefStr, EnumString};

use crate::storage::{DEFAULT_HISTORY_KEY, FileHistoryStore};

pub const DEFAULT_BASE_URL: &str = "https://sentien-rag-app.onrender.com";
pub const BASE_URL_ENV: &str = "CHAT_WIDGET_BASE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Vertical {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Horizontal {
    Left,
    Right,
}

/// Screen corner the widget button is anchored to, written `"<vertical>-<horizontal>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            vertical: Vertical::Bottom,
            horizontal: Horizontal::Right,
        }
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (vertical, horizontal) = s
            .trim()
            .split_once('-')
            .with_context(|| format!("Position '{}' must look like 'bottom-right'", s))?;

        Ok(Position {
            vertical: vertical
                .parse()
                .with_context(|| format!("Unknown vertical position '{}'", vertical))?,
            horizontal: horizontal
                .parse()
                .with_context(|| format!("Unknown horizontal position '{}'", horizontal))?,
        })
    }
}

impl TryFrom<String> for Position {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.vertical.as_ref(), self.horizontal.as_ref())
    }
}

/// Widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Organization the conversation belongs to
    pub organization_id: u64,

    /// Corner the button sits in
    pub position: Position,

    /// Backend root, without the `/threads/` or `/chat/` suffix
    pub base_url: String,

    /// Deadline applied to each backend request
    pub request_timeout_secs: u64,

    /// Where history and logs are kept
    pub data_dir: PathBuf,

    /// Storage key of the conversation history
    pub history_key: String,

    /// First line of the panel; shown, never stored
    pub greeting: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            organization_id: 1,
            position: Position::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            data_dir: default_data_dir(),
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            greeting: "Hi there! I'm here to assist you.".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chat-widget")
}

/// `~/.chat-widget/config.toml`, read by [`WidgetConfig::load`] and written by
/// [`WidgetConfig::save`]
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".chat-widget").join("config.toml"))
}

impl WidgetConfig {
    /// Load the config file, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            WidgetConfig::default()
        };

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }

        Ok(config)
    }

    /// Write the configuration where `load` will find it
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn history_store(&self) -> FileHistoryStore {
        FileHistoryStore::new(&self.data_dir, &self.history_key)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("widget.log")
    }
}
