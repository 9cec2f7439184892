use std::fmt;

use thiserror::Error;

/// Tunable parameter rejected when building [`crate::CorrectionParameters`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigurationError {
    #[error("{name} must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
}

/// Which reading of a [`crate::CorrectionInput`] was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    BaseTemperature,
    RoomTemperature,
    RoomSetpoint,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BaseTemperature => "base temperature",
            Self::RoomTemperature => "room temperature",
            Self::RoomSetpoint => "room setpoint",
        };
        f.write_str(name)
    }
}

/// A per-cycle reading was NaN or infinite, e.g. a disconnected sensor.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("{reading} is not a finite number: {value}")]
pub struct InvalidReadingError {
    pub reading: Reading,
    pub value: f64,
}
