//! Application configuration management.
//!
//! Configuration is stored at `~/.config/clinicdesk/config.json` and covers
//! the API endpoint, the credential storage location, and the session
//! monitor tunables.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::SessionSettings;

/// Application name used for config/storage directory paths
const APP_NAME: &str = "clinicdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    /// Overrides the platform data directory for credential storage.
    pub storage_dir: Option<PathBuf>,
    pub monitor_period_secs: u64,
    pub warning_threshold_minutes: i64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            storage_dir: None,
            monitor_period_secs: 60,
            warning_threshold_minutes: 5,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted credential file.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            monitor_period: std::time::Duration::from_secs(self.monitor_period_secs),
            warning_threshold_minutes: self.warning_threshold_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_settings() {
        let settings = Config::default().session_settings();
        assert_eq!(settings.monitor_period, std::time::Duration::from_secs(60));
        assert_eq!(settings.warning_threshold_minutes, 5);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"monitor_period_secs":30}"#).unwrap();
        assert_eq!(config.monitor_period_secs, 30);
        assert_eq!(config.warning_threshold_minutes, 5);
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_storage_dir_override_wins() {
        let config = Config {
            storage_dir: Some(PathBuf::from("/tmp/clinicdesk-test")),
            ..Config::default()
        };
        assert_eq!(
            config.storage_dir().unwrap(),
            PathBuf::from("/tmp/clinicdesk-test")
        );
    }
}
