use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// `true` / `false`, or a table of options merged over the extension's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionSetting {
    Enabled(bool),
    Options(toml::Table),
}

impl ExtensionSetting {
    /// The options as JSON, for extensions configured with a table.
    pub fn options(&self) -> Option<Map<String, Value>> {
        match self {
            ExtensionSetting::Enabled(_) => None,
            ExtensionSetting::Options(table) => match serde_json::to_value(table) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, ExtensionSetting::Enabled(false))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffordanceSettings {
    pub grace_period_ms: u64,
    pub scroll_edge_px: f64,
    pub scroll_step_px: f64,
    pub hover_probe_px: f64,
    pub disabled_kinds: BTreeSet<String>,
}

impl Default for AffordanceSettings {
    fn default() -> Self {
        Self {
            grace_period_ms: 300,
            scroll_edge_px: 20.0,
            scroll_step_px: 10.0,
            hover_probe_px: 70.0,
            disabled_kinds: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub debounce_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drafts_dir: Option<PathBuf>,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            max_attempts: 3,
            backoff_ms: 500,
            drafts_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extensions: BTreeMap<String, ExtensionSetting>,
    pub affordance: AffordanceSettings,
    pub persistence: PersistenceSettings,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the drafts directory
        if let Some(dir) = config.persistence.drafts_dir.take() {
            config.persistence.drafts_dir = Some(Self::expand_path(&dir).unwrap_or(dir));
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markweave");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
