//! Supervisor configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty or missing file yields a working
//! configuration. Validation runs at load time so a bad value stops the
//! supervisor before it writes a single setpoint.

use flow_correction::CorrectionParameters;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schedule::{WeekSchedule, WorkState};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/flow-temperature/supervisor.toml";

// Room setpoint limits accepted by the controller.
const MIN_ROOM_TEMP: f64 = 10.0;
const MAX_ROOM_TEMP: f64 = 35.0;

mod defaults {
    use std::path::PathBuf;

    pub fn interval_secs() -> u64 { 60 }
    pub fn max_step() -> f64 { 2.0 }
    pub fn max_flow_temperature() -> f64 { 55.0 }
    pub fn stale_after_secs() -> i64 { 600 }

    pub fn comfort_temperature() -> f64 { 21.0 }
    pub fn eco_temperature() -> f64 { 19.0 }

    pub fn setpoint_path() -> PathBuf { "/var/lib/flow-temperature/setpoint".into() }

    pub fn bind_addr() -> String { "0.0.0.0:8080".to_string() }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    /// Seconds between correction cycles.
    #[serde(default = "defaults::interval_secs")]
    pub interval_secs: u64,
    /// Largest change of the applied flow setpoint per cycle; 0 disables limiting.
    #[serde(default = "defaults::max_step")]
    pub max_step: f64,
    /// Upper bound of the published flow temperature.
    #[serde(default = "defaults::max_flow_temperature")]
    pub max_flow_temperature: f64,
    /// Readings older than this are treated as missing.
    #[serde(default = "defaults::stale_after_secs")]
    pub stale_after_secs: i64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval_secs(),
            max_step: defaults::max_step(),
            max_flow_temperature: defaults::max_flow_temperature(),
            stale_after_secs: defaults::stale_after_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomConfig {
    #[serde(default)]
    pub work_state: WorkState,
    #[serde(default = "defaults::comfort_temperature")]
    pub comfort_temperature: f64,
    #[serde(default = "defaults::eco_temperature")]
    pub eco_temperature: f64,
    #[serde(default)]
    pub schedule: WeekSchedule,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            work_state: WorkState::default(),
            comfort_temperature: defaults::comfort_temperature(),
            eco_temperature: defaults::eco_temperature(),
            schedule: WeekSchedule::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "defaults::setpoint_path")]
    pub setpoint_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            setpoint_path: defaults::setpoint_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    #[serde(default)]
    pub correction: CorrectionParameters,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub room: RoomConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub web: WebConfig,
}

impl SupervisorConfig {
    /// Reads `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("{} not found, using default configuration", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.control.interval_secs == 0 {
            return Err(invalid("control.interval_secs", "must be greater than zero"));
        }
        if !self.control.max_step.is_finite() || self.control.max_step < 0.0 {
            return Err(invalid("control.max_step", "must be a finite, non-negative number"));
        }
        if !self.control.max_flow_temperature.is_finite() {
            return Err(invalid("control.max_flow_temperature", "must be a finite number"));
        }
        if self.control.stale_after_secs <= 0 {
            return Err(invalid("control.stale_after_secs", "must be greater than zero"));
        }
        check_room_temp("room.comfort_temperature", self.room.comfort_temperature)?;
        check_room_temp("room.eco_temperature", self.room.eco_temperature)?;
        Ok(())
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.to_string(),
    }
}

fn check_room_temp(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(MIN_ROOM_TEMP..=MAX_ROOM_TEMP).contains(&value) {
        return Err(ConfigError::InvalidValue {
            key,
            reason: format!("{} is outside {}..={}", value, MIN_ROOM_TEMP, MAX_ROOM_TEMP),
        });
    }
    Ok(())
}
