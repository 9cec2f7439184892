use serde::Serialize;
use std::fmt;

use crate::error::{InvalidReadingError, Reading};
use crate::params::CorrectionParameters;

/// Temperature differences are compared in steps of 1e-6 °C.
const STEPS_PER_DEGREE: f64 = 1e6;

/// Rounds a temperature difference to the resolution zones are classified at,
/// so `20.0 - 19.7` lands exactly on a hysteresis of `0.3`.
pub fn quantize(delta: f64) -> f64 {
    (delta * STEPS_PER_DEGREE).round() / STEPS_PER_DEGREE
}

/// Band of `diff = setpoint - room` the room currently falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    /// `diff > h`
    Cold,
    /// `0 <= diff <= h`
    NearSetpointBelow,
    /// `-h < diff < 0`
    NearSetpointAbove,
    /// `diff <= -h`
    Warm,
}

impl Zone {
    /// Every finite `diff` maps to exactly one zone. The strict/non-strict
    /// sides of each comparison decide the zone at `h`, `0` and `-h`.
    pub fn classify(diff: f64, hysteresis: f64) -> Zone {
        if diff > hysteresis {
            Zone::Cold
        } else if diff >= 0.0 {
            Zone::NearSetpointBelow
        } else if diff > -hysteresis {
            Zone::NearSetpointAbove
        } else {
            Zone::Warm
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Cold => "COLD",
            Zone::NearSetpointBelow => "NEAR_SETPOINT_BELOW",
            Zone::NearSetpointAbove => "NEAR_SETPOINT_ABOVE",
            Zone::Warm => "WARM",
        };
        f.write_str(name)
    }
}

/// Readings for one control cycle, all in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrectionInput {
    /// Heating curve output including the outdoor shift.
    pub base_temperature: f64,
    pub room_temperature: f64,
    pub room_setpoint: f64,
}

impl CorrectionInput {
    pub fn new(base_temperature: f64, room_temperature: f64, room_setpoint: f64) -> Self {
        Self {
            base_temperature,
            room_temperature,
            room_setpoint,
        }
    }

    fn validate(&self) -> Result<(), InvalidReadingError> {
        let readings = [
            (Reading::BaseTemperature, self.base_temperature),
            (Reading::RoomTemperature, self.room_temperature),
            (Reading::RoomSetpoint, self.room_setpoint),
        ];
        for (reading, value) in readings {
            if !value.is_finite() {
                return Err(InvalidReadingError { reading, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrectionResult {
    pub flow_temperature: f64,
    pub zone: Zone,
    pub diff: f64,
}

/// Computes the corrected flow temperature for one cycle.
///
/// Stateless: the result depends only on the arguments.
pub fn correct(
    input: CorrectionInput,
    params: CorrectionParameters,
) -> Result<CorrectionResult, InvalidReadingError> {
    input.validate()?;

    let diff = quantize(input.room_setpoint - input.room_temperature);
    let base = input.base_temperature;
    // Already quantized when the parameters were built.
    let h = params.hysteresis();
    let zone = Zone::classify(diff, h);

    let flow_temperature = match zone {
        Zone::Cold => base + (diff - h) * params.correction(),
        Zone::NearSetpointBelow => base - params.decrease(),
        // No flat decrease here, unlike the zones on either side.
        Zone::NearSetpointAbove => base - (diff.abs() + h) * params.correction(),
        Zone::Warm => base - params.decrease() - diff.abs() * params.correction(),
    };

    Ok(CorrectionResult {
        flow_temperature,
        zone,
        diff,
    })
}

/// Holds the configured parameters so callers only pass readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowTemperatureCorrector {
    params: CorrectionParameters,
}

impl FlowTemperatureCorrector {
    pub fn new(params: CorrectionParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> CorrectionParameters {
        self.params
    }

    pub fn correct(&self, input: CorrectionInput) -> Result<CorrectionResult, InvalidReadingError> {
        correct(input, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: f64 = 31.9;
    const EPS: f64 = 1e-9;

    fn run(setpoint: f64, room: f64) -> CorrectionResult {
        correct(
            CorrectionInput::new(BASE, room, setpoint),
            CorrectionParameters::default(),
        )
        .unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {:.6}, got {:.6}",
            expected,
            actual
        );
    }

    #[test]
    fn cold_room_boosts_flow() {
        let r = run(21.0, 19.3);
        assert_eq!(r.zone, Zone::Cold);
        assert_close(r.diff, 1.7);
        assert_close(r.flow_temperature, 40.3);
    }

    #[test]
    fn just_below_setpoint_applies_decrease() {
        let r = run(19.5, 19.3);
        assert_eq!(r.zone, Zone::NearSetpointBelow);
        assert_close(r.flow_temperature, 25.9);
    }

    #[test]
    fn at_setpoint_applies_decrease() {
        let r = run(19.5, 19.5);
        assert_eq!(r.zone, Zone::NearSetpointBelow);
        assert_eq!(r.diff, 0.0);
        assert_close(r.flow_temperature, 25.9);
    }

    #[test]
    fn just_above_setpoint() {
        let r = run(19.5, 19.6);
        assert_eq!(r.zone, Zone::NearSetpointAbove);
        assert_close(r.flow_temperature, 29.5);
    }

    #[test]
    fn warm_room_at_lower_band_edge() {
        let r = run(19.0, 19.3);
        assert_eq!(r.zone, Zone::Warm);
        assert_close(r.flow_temperature, 24.1);
    }

    #[test]
    fn classify_boundaries() {
        // 0.5 is exact in binary, so these hit the edges precisely.
        assert_eq!(Zone::classify(0.5, 0.5), Zone::NearSetpointBelow);
        assert_eq!(Zone::classify(0.5000001, 0.5), Zone::Cold);
        assert_eq!(Zone::classify(0.0, 0.5), Zone::NearSetpointBelow);
        assert_eq!(Zone::classify(-0.0, 0.5), Zone::NearSetpointBelow);
        assert_eq!(Zone::classify(-1e-12, 0.5), Zone::NearSetpointAbove);
        assert_eq!(Zone::classify(-0.4999999, 0.5), Zone::NearSetpointAbove);
        assert_eq!(Zone::classify(-0.5, 0.5), Zone::Warm);
    }

    #[test]
    fn decimal_readings_at_upper_band_edge() {
        for (setpoint, room) in [(19.5, 19.2), (21.0, 20.7), (20.0, 19.7), (22.0, 21.7)] {
            let r = run(setpoint, room);
            assert_eq!(r.diff, 0.3, "setpoint {} room {}", setpoint, room);
            assert_eq!(r.zone, Zone::NearSetpointBelow, "setpoint {} room {}", setpoint, room);
            assert_close(r.flow_temperature, 25.9);
        }
    }

    #[test]
    fn decimal_readings_at_lower_band_edge() {
        for (setpoint, room) in [(19.0, 19.3), (19.5, 19.8), (20.7, 21.0), (21.7, 22.0)] {
            let r = run(setpoint, room);
            assert_eq!(r.diff, -0.3, "setpoint {} room {}", setpoint, room);
            assert_eq!(r.zone, Zone::Warm, "setpoint {} room {}", setpoint, room);
            assert_close(r.flow_temperature, 24.1);
        }
    }

    #[test]
    fn just_inside_band_edges() {
        let r = run(19.5, 19.199999);
        assert_eq!(r.zone, Zone::Cold);
        assert_close(r.flow_temperature, BASE + 0.000001 * 6.0);
        let r = run(19.0, 19.299999);
        assert_eq!(r.zone, Zone::NearSetpointAbove);
    }

    #[test]
    fn quantize_rounds_to_micro_degrees() {
        assert_eq!(quantize(19.5 - 19.2), 0.3);
        assert_eq!(quantize(19.0 - 19.3), -0.3);
        assert_eq!(quantize(1e-9), 0.0);
        assert_eq!(quantize(-2.0000004), -2.0);
    }

    #[test]
    fn zero_hysteresis_leaves_single_point_band() {
        assert_eq!(Zone::classify(0.0, 0.0), Zone::NearSetpointBelow);
        assert_eq!(Zone::classify(1e-12, 0.0), Zone::Cold);
        assert_eq!(Zone::classify(-1e-12, 0.0), Zone::Warm);
    }

    #[test]
    fn step_at_setpoint() {
        let params = CorrectionParameters::new(6.0, 6.0, 0.5).unwrap();
        let at = correct(CorrectionInput::new(30.0, 20.0, 20.0), params).unwrap();
        let above = correct(CorrectionInput::new(30.0, 20.000001, 20.0), params).unwrap();
        assert_eq!(at.zone, Zone::NearSetpointBelow);
        assert_eq!(above.zone, Zone::NearSetpointAbove);
        assert_eq!(above.diff, -0.000001);
        // decrease - h * correction
        assert!((above.flow_temperature - at.flow_temperature - 3.0).abs() < 1e-4);
    }

    #[test]
    fn zero_correction_gives_plateaus() {
        let params = CorrectionParameters::new(6.0, 0.0, 0.3).unwrap();
        let cold = correct(CorrectionInput::new(BASE, 15.0, 21.0), params).unwrap();
        let warm = correct(CorrectionInput::new(BASE, 25.0, 21.0), params).unwrap();
        assert_eq!(cold.zone, Zone::Cold);
        assert_eq!(cold.flow_temperature, BASE);
        assert_eq!(warm.zone, Zone::Warm);
        assert_eq!(warm.flow_temperature, BASE - 6.0);
    }

    #[test]
    fn nan_room_temperature_rejected() {
        let err = correct(
            CorrectionInput::new(BASE, f64::NAN, 21.0),
            CorrectionParameters::default(),
        )
        .unwrap_err();
        assert_eq!(err.reading, Reading::RoomTemperature);
        assert!(err.value.is_nan());
    }

    #[test]
    fn infinite_base_and_setpoint_rejected() {
        let params = CorrectionParameters::default();
        let err = correct(CorrectionInput::new(f64::INFINITY, 20.0, 21.0), params).unwrap_err();
        assert_eq!(err.reading, Reading::BaseTemperature);
        let err = correct(CorrectionInput::new(BASE, 20.0, f64::NEG_INFINITY), params).unwrap_err();
        assert_eq!(err.reading, Reading::RoomSetpoint);
    }

    #[test]
    fn wrapper_uses_its_params() {
        let params = CorrectionParameters::new(4.0, 2.0, 0.0).unwrap();
        let corrector = FlowTemperatureCorrector::new(params);
        let input = CorrectionInput::new(30.0, 20.0, 20.0);
        assert_eq!(corrector.params(), params);
        assert_eq!(corrector.correct(input), correct(input, params));
        assert_eq!(corrector.correct(input).unwrap().flow_temperature, 26.0);
    }

    #[test]
    fn zone_serializes_upper_snake() {
        let json = serde_json::to_string(&Zone::NearSetpointAbove).unwrap();
        assert_eq!(json, "\"NEAR_SETPOINT_ABOVE\"");
        assert_eq!(Zone::NearSetpointAbove.to_string(), "NEAR_SETPOINT_ABOVE");
    }
}
