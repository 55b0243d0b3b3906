//! TOML-based scheduler settings.
//!
//! Loaded once at startup, mutated only through the settings surface, and
//! re-saved on every change; the engine itself never writes to it.
//!
//! Stored at `~/.config/chaoscontrol/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Process-wide scheduler configuration.
///
/// Defaults mirror the original workday: 09:00-17:00, 30-minute grid,
/// 5-minute buffer, capacity equal to the workday span, Monday week start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Workday start, minutes from midnight
    #[serde(default = "default_work_start")]
    pub work_start_minute: u32,
    /// Workday end, minutes from midnight (exclusive)
    #[serde(default = "default_work_end")]
    pub work_end_minute: u32,
    /// Slot grid granularity in minutes
    #[serde(default = "default_granularity")]
    pub slot_granularity_minutes: u32,
    /// Minimum idle gap between two placed items
    #[serde(default = "default_buffer")]
    pub buffer_minutes: u32,
    /// Booked-minutes ceiling per day; unset means the workday span
    #[serde(default)]
    pub daily_capacity_minutes: Option<u32>,
    /// First day of the week view: 0 = Sunday .. 6 = Saturday
    #[serde(default = "default_week_start")]
    pub week_start_day: u8,
    /// Prefer early slots when placing flexible tasks
    #[serde(default = "default_true")]
    pub prefer_mornings: bool,
}

fn default_work_start() -> u32 {
    540
}
fn default_work_end() -> u32 {
    1020
}
fn default_granularity() -> u32 {
    30
}
fn default_buffer() -> u32 {
    5
}
fn default_week_start() -> u8 {
    1
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_start_minute: default_work_start(),
            work_end_minute: default_work_end(),
            slot_granularity_minutes: default_granularity(),
            buffer_minutes: default_buffer(),
            daily_capacity_minutes: None,
            week_start_day: default_week_start(),
            prefer_mornings: true,
        }
    }
}

impl Settings {
    /// Effective daily capacity: the configured ceiling, or the workday span.
    pub fn daily_capacity(&self) -> u32 {
        self.daily_capacity_minutes
            .unwrap_or_else(|| self.work_end_minute.saturating_sub(self.work_start_minute))
    }

    /// Week start as a chrono weekday.
    pub fn week_start(&self) -> Weekday {
        match self.week_start_day % 7 {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.work_start_minute >= self.work_end_minute {
            return Err(ConfigError::InvalidValue {
                key: "work_start_minute".to_string(),
                message: "workday start must precede workday end".to_string(),
            });
        }
        if self.work_end_minute > 24 * 60 {
            return Err(ConfigError::InvalidValue {
                key: "work_end_minute".to_string(),
                message: "workday must end within the day".to_string(),
            });
        }
        if self.slot_granularity_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "slot_granularity_minutes".to_string(),
                message: "granularity must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Default config file location.
    pub fn default_path() -> Result<PathBuf, std::io::Error> {
        Ok(super::data_dir()?.join("config.toml"))
    }

    /// Load settings from `path`, falling back to defaults if absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings: Settings =
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to `path` as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let text =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
