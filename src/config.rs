use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::input::MAX_SLOTS;
use crate::timing::MAX_FRAME_STEP_DELAY;

const CONFIG_DIR: &str = "hotkey-scheduler";
const SETTINGS_FILE: &str = "scheduler.toml";
const MAX_TICK_INTERVAL_MS: u64 = 1000;
const MAX_COOLDOWN_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Scheduler tuning, read once at startup
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Nominal tick period
    pub tick_interval_ms: u64,
    /// Blocking pause after a cooldown-guarded action
    pub cooldown_ms: u64,
    pub slot_count: u8,
    /// Capacity of the command channel
    pub command_buffer: usize,
    /// Initial frame-step delay
    pub frame_step_delay: u32,
    pub stats_interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000 / 60,
            cooldown_ms: 100,
            slot_count: MAX_SLOTS,
            command_buffer: 1000,
            frame_step_delay: 1,
            stats_interval_secs: 30,
        }
    }
}

impl SchedulerSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_TICK_INTERVAL_MS).contains(&self.tick_interval_ms) {
            return Err(SettingsError::Invalid(format!(
                "tick_interval_ms {} outside 1..={}",
                self.tick_interval_ms, MAX_TICK_INTERVAL_MS
            )));
        }
        if self.cooldown_ms > MAX_COOLDOWN_MS {
            return Err(SettingsError::Invalid(format!(
                "cooldown_ms {} above {}",
                self.cooldown_ms, MAX_COOLDOWN_MS
            )));
        }
        if !(1..=MAX_SLOTS).contains(&self.slot_count) {
            return Err(SettingsError::Invalid(format!(
                "slot_count {} outside 1..={}",
                self.slot_count, MAX_SLOTS
            )));
        }
        if self.frame_step_delay > MAX_FRAME_STEP_DELAY {
            return Err(SettingsError::Invalid(format!(
                "frame_step_delay {} above {}",
                self.frame_step_delay, MAX_FRAME_STEP_DELAY
            )));
        }
        if self.command_buffer == 0 {
            return Err(SettingsError::Invalid("command_buffer must be positive".into()));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`; a missing file yields the defaults
    pub async fn load(path: &Path) -> Result<Self, SettingsError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        if !exists {
            warn!("Settings file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let settings = Self::from_toml_str(&content)?;
        info!("Loaded settings from {}", path.display());
        debug!("{:?}", settings);
        Ok(settings)
    }

    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        path
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = SchedulerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.tick_interval(), Duration::from_millis(16));
        assert_eq!(settings.slot_count, 10);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings = SchedulerSettings::from_toml_str("cooldown_ms = 250\nslot_count = 4\n").unwrap();
        assert_eq!(settings.cooldown_ms, 250);
        assert_eq!(settings.slot_count, 4);
        assert_eq!(settings.command_buffer, 1000);
    }

    #[test]
    fn rejects_out_of_range_values() {
        for content in [
            "tick_interval_ms = 0",
            "tick_interval_ms = 1001",
            "tick_interval_ms = 9223372036854775807",
            "cooldown_ms = 1001",
            "slot_count = 0",
            "slot_count = 11",
            "frame_step_delay = 61",
            "command_buffer = 0",
        ] {
            assert!(
                matches!(
                    SchedulerSettings::from_toml_str(content),
                    Err(SettingsError::Invalid(_))
                ),
                "{content}"
            );
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            SchedulerSettings::from_toml_str("slot_count = \"many\""),
            Err(SettingsError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("hotkey-scheduler-missing/scheduler.toml");
        let settings = SchedulerSettings::load(&path).await.unwrap();
        assert_eq!(settings, SchedulerSettings::default());
    }

    #[tokio::test]
    async fn loads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("hotkey-scheduler-{}.toml", std::process::id()));
        tokio::fs::write(&path, "tick_interval_ms = 20\n").await.unwrap();
        let settings = SchedulerSettings::load(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(settings.tick_interval_ms, 20);
    }

    #[test]
    fn default_path_ends_with_settings_file() {
        let path = SchedulerSettings::default_path();
        assert!(path.ends_with("hotkey-scheduler/scheduler.toml"));
    }
}
