//! Dashboard tuning knobs, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives
//! the stock dashboard behavior.

use std::path::Path;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Environment variable naming the dashboard config file.
pub const CONFIG_ENV: &str = "DRONE_MAP_CONFIG";

/// Errors that can occur while loading a [`DashboardConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML or has wrongly typed fields.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is outside its allowed domain.
    #[error("Invalid config value for {field}: {message}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Which records the map shows while the timeline runs.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewMode {
    /// Only flights on the playback position's calendar day.
    #[default]
    SingleDay,
    /// Every flight in the filtered subset, ignoring playback position.
    AllData,
}

/// Tunable parameters for the dashboard core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DashboardConfig {
    /// Wall-clock interval between playback ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Number of 1x-speed ticks needed to cross the active range.
    pub steps_per_range: u32,
    /// Minimum separation kept between the in and out points, in ms.
    pub min_range_gap_ms: i64,
    /// Reasons with fewer flights are hidden from the collapsed list.
    pub reason_min_count: u64,
    /// Maximum number of reasons in the collapsed list.
    pub reason_max_display: usize,
    /// Number of equal-width buckets in the activity histogram.
    pub histogram_buckets: usize,
    /// View mode the timeline starts in.
    pub default_view_mode: ViewMode,
    /// Playback speed multiplier the timeline starts with.
    pub default_speed: f64,
    /// Whether playback loops by default.
    pub default_loop: bool,
    /// Fixed UTC offset used for calendar-day boundaries. `None` uses the
    /// host's local time zone.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 40,
            steps_per_range: 500,
            min_range_gap_ms: 1,
            reason_min_count: 20,
            reason_max_display: 20,
            histogram_buckets: 80,
            default_view_mode: ViewMode::SingleDay,
            default_speed: 1.0,
            default_loop: false,
            utc_offset_minutes: None,
        }
    }
}

impl DashboardConfig {
    /// Parses and validates a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out
    /// of range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded dashboard config from {}", path.display());
        Ok(config)
    }

    /// Loads the config from `path` when given, otherwise returns the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a path is given and loading it fails.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Tick interval as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The fixed offset for calendar days, if one is configured and valid.
    #[must_use]
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes.saturating_mul(60)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms", "must be at least 1"));
        }
        if self.steps_per_range == 0 {
            return Err(invalid("steps_per_range", "must be at least 1"));
        }
        if self.min_range_gap_ms < 1 {
            return Err(invalid("min_range_gap_ms", "must be at least 1"));
        }
        if !self.default_speed.is_finite() || self.default_speed <= 0.0 {
            return Err(invalid("default_speed", "must be a positive number"));
        }
        if let Some(minutes) = self.utc_offset_minutes
            && FixedOffset::east_opt(minutes.saturating_mul(60)).is_none()
        {
            return Err(invalid("utc_offset_minutes", "must be within +/- 24 hours"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_millis(40));
        assert!(config.utc_offset().is_none());
    }

    #[test]
    fn overrides_selected_fields() {
        let config = DashboardConfig::from_toml_str(
            r#"
            min_range_gap_ms = 60000
            reason_min_count = 5
            default_view_mode = "all_data"
            utc_offset_minutes = -480
            "#,
        )
        .unwrap();
        assert_eq!(config.min_range_gap_ms, 60_000);
        assert_eq!(config.reason_min_count, 5);
        assert_eq!(config.reason_max_display, 20);
        assert_eq!(config.default_view_mode, ViewMode::AllData);
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn rejects_zero_gap() {
        let err = DashboardConfig::from_toml_str("min_range_gap_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "min_range_gap_ms",
                ..
            }
        ));
    }

    #[test]
    fn rejects_offset_beyond_a_day() {
        let err = DashboardConfig::from_toml_str("utc_offset_minutes = 1500").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "utc_offset_minutes",
                ..
            }
        ));
        assert!(DashboardConfig::from_toml_str("utc_offset_minutes = -420").is_ok());
    }

    #[test]
    fn rejects_non_positive_speed() {
        assert!(DashboardConfig::from_toml_str("default_speed = 0.0").is_err());
    }

    #[test]
    fn view_mode_parses_from_str() {
        assert_eq!("all_data".parse::<ViewMode>().unwrap(), ViewMode::AllData);
        assert_eq!(ViewMode::SingleDay.to_string(), "single_day");
    }
}
