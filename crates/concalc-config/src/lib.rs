use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
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

/// User settings. Every field may be left out of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the buffer and the log file live
    pub state_dir: PathBuf,
    /// How long an evaluation may take before the evaluator is restarted
    pub calculation_timeout_ms: u64,
    /// Quiet period that folds a burst of typing into one undo step
    pub history_debounce_ms: u64,
    pub history_limit: usize,
    /// Fractional digits shown before trailing zeros are trimmed
    pub precision: usize,
    /// File name offered when saving
    pub export_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: Self::default_state_dir(),
            calculation_timeout_ms: 1000,
            history_debounce_ms: 500,
            history_limit: 300,
            precision: 10,
            export_name: "doc.txt".to_string(),
        }
    }
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

        // Expand shell variables and tilde in the state directory
        config.state_dir = Self::expand_path(&config.state_dir).unwrap_or(config.state_dir);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// The file's settings, or the defaults when there is no file
    pub fn load_or_default_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(config_path)?.unwrap_or_default())
    }

    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_or_default_from_path(Self::config_path())
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
        let config_dir = shellexpand::tilde("~/.config/concalc");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("concalc.log")
    }

    pub fn calculation_timeout(&self) -> Duration {
        Duration::from_millis(self.calculation_timeout_ms)
    }

    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }

    fn default_state_dir() -> PathBuf {
        let state_dir = shellexpand::tilde("~/.local/share/concalc");
        PathBuf::from(state_dir.as_ref())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
