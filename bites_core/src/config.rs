//! Configuration file support for First Bites.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/firstbites/config.toml`.

use crate::allergen::{MaintenanceWindow, MAINTENANCE_DAYS_MAX, MAINTENANCE_DAYS_WARNING};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub maintenance: MaintenanceConfig,
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

/// Allergen maintenance reminder thresholds, in days since last exposure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_soon_days")]
    pub soon_days: i64,

    #[serde(default = "default_overdue_days")]
    pub overdue_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            soon_days: default_soon_days(),
            overdue_days: default_overdue_days(),
        }
    }
}

impl MaintenanceConfig {
    pub fn window(&self) -> MaintenanceWindow {
        MaintenanceWindow {
            soon_days: self.soon_days,
            overdue_days: self.overdue_days,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("firstbites")
}

fn default_soon_days() -> i64 {
    MAINTENANCE_DAYS_WARNING
}

fn default_overdue_days() -> i64 {
    MAINTENANCE_DAYS_MAX
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
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("firstbites").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Journal file path under the configured data directory
    pub fn journal_path(&self) -> PathBuf {
        self.data.data_dir.join("journal").join("feeding_events.jsonl")
    }

    /// CSV archive path under the configured data directory
    pub fn csv_path(&self) -> PathBuf {
        self.data.data_dir.join("events.csv")
    }

    /// Award ledger path under the configured data directory
    pub fn ledger_path(&self) -> PathBuf {
        self.data.data_dir.join("awards.json")
    }

    /// Allergen override store path under the configured data directory
    pub fn overrides_path(&self) -> PathBuf {
        self.data.data_dir.join("allergen_overrides.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.maintenance.soon_days, 5);
        assert_eq!(config.maintenance.overdue_days, 7);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.maintenance.soon_days, parsed.maintenance.soon_days);
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[maintenance]
soon_days = 3
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.maintenance.soon_days, 3);
        assert_eq!(config.maintenance.overdue_days, 7); // default
    }

    #[test]
    fn test_paths_derive_from_data_dir() {
        let mut config = Config::default();
        config.data.data_dir = PathBuf::from("/tmp/fb");

        assert_eq!(
            config.journal_path(),
            PathBuf::from("/tmp/fb/journal/feeding_events.jsonl")
        );
        assert_eq!(config.csv_path(), PathBuf::from("/tmp/fb/events.csv"));
        assert_eq!(config.ledger_path(), PathBuf::from("/tmp/fb/awards.json"));
        assert_eq!(
            config.overrides_path(),
            PathBuf::from("/tmp/fb/allergen_overrides.json")
        );
    }
}
