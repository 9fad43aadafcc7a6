//! Configuration file support for the wellness tracker.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/wellness/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub routine: RoutineConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn auth_path(&self) -> PathBuf {
        self.data_dir.join("auth.json")
    }
}

/// Routine playback configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutineConfig {
    /// Category played when none is given on the command line
    #[serde(default = "default_category")]
    pub default_category: String,
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
        }
    }
}

/// Statistics configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Days covered by the stats summary, including today
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

/// Longest look-back window accepted for stats and listings
pub const MAX_WINDOW_DAYS: u32 = 36_600;

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("wellness")
}

fn default_category() -> String {
    "cardio".into()
}

fn default_window_days() -> u32 {
    7
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("wellness").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.stats.window_days == 0 || self.stats.window_days > MAX_WINDOW_DAYS {
            return Err(Error::Config(format!(
                "stats.window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        if self.routine.default_category.trim().is_empty() {
            return Err(Error::Config(
                "routine.default_category cannot be empty".into(),
            ));
        }
        Ok(())
    }
}
