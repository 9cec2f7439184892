use chrono::{DateTime, Local};
use serde::Serialize;

/// Value the controller reports for a disconnected sensor.
pub const DISCONNECTED_SENSOR: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub value: f64,
    pub timestamp: i64,
}

/// Latest base curve and room temperature pushed by the collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Readings {
    pub base_temperature: Option<Sample>,
    pub room_temperature: Option<Sample>,
}

impl Readings {
    pub fn update_base(&mut self, value: f64, now: DateTime<Local>) {
        self.base_temperature = Some(Sample {
            value: decode(value),
            timestamp: now.timestamp(),
        });
    }

    pub fn update_room(&mut self, value: f64, now: DateTime<Local>) {
        self.room_temperature = Some(Sample {
            value: decode(value),
            timestamp: now.timestamp(),
        });
    }

    /// (base, room) for a cycle at `now`. Missing or stale samples come back
    /// as NaN so the correction rejects them.
    pub fn snapshot(&self, now: DateTime<Local>, stale_after_secs: i64) -> (f64, f64) {
        let now_ts = now.timestamp();
        let fresh = |s: Option<Sample>| match s {
            Some(s) if now_ts - s.timestamp <= stale_after_secs => s.value,
            _ => f64::NAN,
        };
        (fresh(self.base_temperature), fresh(self.room_temperature))
    }
}

fn decode(raw: f64) -> f64 {
    if raw == DISCONNECTED_SENSOR {
        f64::NAN
    } else {
        raw
    }
}
