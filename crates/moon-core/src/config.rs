use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::SleepThresholds;

/// Seconds between sampling rounds
pub const TICK_INTERVAL_SECS: f64 = 5.0;
/// Seconds between motion sensor updates
pub const MOTION_UPDATE_INTERVAL_SECS: f64 = 1.0;
/// Shortest interval accepted from a config file
const MIN_INTERVAL_SECS: f64 = 0.001;
/// Longest interval accepted from a config file (one day)
const MAX_INTERVAL_SECS: f64 = 86_400.0;

/// Get the local data directory for moon.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("moon");
    Ok(path)
}

/// Monitor settings, read from `config.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub tick_interval_secs: f64,
    pub motion_update_interval_secs: f64,
    pub thresholds: SleepThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: TICK_INTERVAL_SECS,
            motion_update_interval_secs: MOTION_UPDATE_INTERVAL_SECS,
            thresholds: SleepThresholds::default(),
        }
    }
}

impl MonitorConfig {
    /// Default config file location
    ///
    /// # Errors
    ///
    /// Returns an error if the local data directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        Ok(get_data_dir()?.join("config.toml"))
    }

    /// Load and validate a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default location, else defaults
    ///
    /// An explicit path must exist; a missing default file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but is invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Ok(default) if default.exists() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Check intervals and thresholds are usable
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tick_interval_secs", self.tick_interval_secs),
            ("motion_update_interval_secs", self.motion_update_interval_secs),
        ] {
            if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&value) {
                anyhow::bail!(
                    "{name} must be between {MIN_INTERVAL_SECS} and {MAX_INTERVAL_SECS} seconds, got {value}"
                );
            }
        }

        let t = &self.thresholds;
        if !t.roll_pitch_threshold.is_finite() || t.roll_pitch_threshold <= 0.0 {
            anyhow::bail!(
                "thresholds.roll_pitch_threshold must be positive, got {}",
                t.roll_pitch_threshold
            );
        }
        if !t.min_resting_hr.is_finite()
            || !t.max_resting_hr.is_finite()
            || t.min_resting_hr > t.max_resting_hr
        {
            anyhow::bail!(
                "thresholds resting heart rate window [{}, {}] is invalid",
                t.min_resting_hr,
                t.max_resting_hr
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.tick_interval_secs)
    }

    #[must_use]
    pub fn motion_update_interval(&self) -> Duration {
        Duration::from_secs_f64(self.motion_update_interval_secs)
    }
}
