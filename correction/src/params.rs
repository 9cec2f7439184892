use serde::{Deserialize, Serialize};

use crate::corrector::quantize;
use crate::error::ConfigurationError;

pub const DEFAULT_DECREASE: f64 = 6.0;
pub const DEFAULT_CORRECTION: f64 = 6.0;
pub const DEFAULT_HYSTERESIS: f64 = 0.3;

/// Tunables of the room correction, validated once at configuration time.
///
/// Fields are private so a value of this type is always finite and
/// non-negative; deserialisation goes through the same checks as [`Self::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterValues")]
pub struct CorrectionParameters {
    decrease: f64,
    correction: f64,
    hysteresis: f64,
}

impl CorrectionParameters {
    pub fn new(decrease: f64, correction: f64, hysteresis: f64) -> Result<Self, ConfigurationError> {
        Ok(Self {
            decrease: check("decrease", decrease)?,
            correction: check("correction", correction)?,
            hysteresis: quantize(check("hysteresis", hysteresis)?),
        })
    }

    /// Flat flow reduction (°C) applied at or above the setpoint.
    pub fn decrease(&self) -> f64 {
        self.decrease
    }

    /// Flow change (°C) per °C of room difference.
    pub fn correction(&self) -> f64 {
        self.correction
    }

    /// Half-width (°C) of the dead band around the setpoint, at the same
    /// resolution as the room difference it is compared with.
    pub fn hysteresis(&self) -> f64 {
        self.hysteresis
    }
}

impl Default for CorrectionParameters {
    fn default() -> Self {
        Self {
            decrease: DEFAULT_DECREASE,
            correction: DEFAULT_CORRECTION,
            hysteresis: DEFAULT_HYSTERESIS,
        }
    }
}

fn check(name: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NonFinite { name, value });
    }
    if value < 0.0 {
        return Err(ConfigurationError::Negative { name, value });
    }
    Ok(value)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterValues {
    #[serde(default = "default_decrease")]
    decrease: f64,
    #[serde(default = "default_correction")]
    correction: f64,
    #[serde(default = "default_hysteresis")]
    hysteresis: f64,
}

fn default_decrease() -> f64 {
    DEFAULT_DECREASE
}

fn default_correction() -> f64 {
    DEFAULT_CORRECTION
}

fn default_hysteresis() -> f64 {
    DEFAULT_HYSTERESIS
}

impl TryFrom<ParameterValues> for CorrectionParameters {
    type Error = ConfigurationError;

    fn try_from(values: ParameterValues) -> Result<Self, Self::Error> {
        Self::new(values.decrease, values.correction, values.hysteresis)
    }
}
