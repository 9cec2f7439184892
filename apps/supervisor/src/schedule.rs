use chrono::{DateTime, Datelike, Local, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Default comfort hours: 06:00-22:00 every day ---
// AM bit n covers 00:00 + n * 30min, PM bit n covers 12:00 + n * 30min.
const DEFAULT_AM: u32 = 0x00FF_F000; // 06:00-12:00
const DEFAULT_PM: u32 = 0x000F_FFFF; // 12:00-22:00

const SLOTS_PER_HALF_DAY: u32 = 24;

/// How the room setpoint is chosen, mirroring the controller's circuit work state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkState {
    Off,
    Comfort,
    Eco,
    #[default]
    Auto,
}

impl fmt::Display for WorkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkState::Off => "off",
            WorkState::Comfort => "comfort",
            WorkState::Eco => "eco",
            WorkState::Auto => "auto",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Comfort,
    Eco,
}

/// Comfort slots for one day, as two 24-bit half-hour bitfields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(default)]
    pub am: u32,
    #[serde(default)]
    pub pm: u32,
}

impl Default for DaySchedule {
    fn default() -> Self {
        Self {
            am: DEFAULT_AM,
            pm: DEFAULT_PM,
        }
    }
}

impl DaySchedule {
    /// True when the half-hour slot (0..48) containing `hour:minute` is a comfort slot.
    pub fn is_comfort_at(&self, hour: u32, minute: u32) -> bool {
        let slot = hour * 2 + minute / 30;
        if slot < SLOTS_PER_HALF_DAY {
            (self.am >> slot) & 1 == 1
        } else {
            (self.pm >> (slot - SLOTS_PER_HALF_DAY)) & 1 == 1
        }
    }

    /// Comfort periods as "06:00-09:30, 17:00-21:00".
    pub fn describe(&self) -> String {
        let am = decode_ranges(self.am, 0);
        let pm = decode_ranges(self.pm, SLOTS_PER_HALF_DAY);
        // A period running through noon shows up as two adjacent ranges.
        let ranges: Vec<String> = am.into_iter().chain(pm).collect();
        if ranges.is_empty() {
            "No active periods".to_string()
        } else {
            ranges.join(", ")
        }
    }
}

fn format_slot(slot: u32) -> String {
    format!("{:02}:{:02}", slot / 2, (slot % 2) * 30)
}

fn decode_ranges(bits: u32, offset: u32) -> Vec<String> {
    let mut ranges = Vec::new();
    let mut start: Option<u32> = None;
    for bit in 0..SLOTS_PER_HALF_DAY {
        let set = (bits >> bit) & 1 == 1;
        match (set, start) {
            (true, None) => start = Some(bit),
            (false, Some(s)) => {
                ranges.push(format!("{}-{}", format_slot(offset + s), format_slot(offset + bit)));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push(format!(
            "{}-{}",
            format_slot(offset + s),
            format_slot(offset + SLOTS_PER_HALF_DAY)
        ));
    }
    ranges
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekSchedule {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WeekSchedule {
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn preset_at(&self, t: DateTime<Local>) -> Preset {
        if self.day(t.weekday()).is_comfort_at(t.hour(), t.minute()) {
            Preset::Comfort
        } else {
            Preset::Eco
        }
    }

    /// Decoded comfort periods for each day, Monday first.
    pub fn describe(&self) -> Vec<(String, String)> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(|d| (d.to_string(), self.day(d).describe()))
        .collect()
    }
}

/// Room setpoint for the given work state, or `None` when the circuit is off.
pub fn room_setpoint(
    work_state: WorkState,
    comfort: f64,
    eco: f64,
    schedule: &WeekSchedule,
    now: DateTime<Local>,
) -> Option<(Preset, f64)> {
    let preset = match work_state {
        WorkState::Off => return None,
        WorkState::Comfort => Preset::Comfort,
        WorkState::Eco => Preset::Eco,
        WorkState::Auto => schedule.preset_at(now),
    };
    let temp = match preset {
        Preset::Comfort => comfort,
        Preset::Eco => eco,
    };
    Some((preset, temp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        // 2024-01-01 was a Monday.
        Local.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn default_is_comfort_six_to_ten() {
        let s = DaySchedule::default();
        assert!(!s.is_comfort_at(5, 59));
        assert!(s.is_comfort_at(6, 0));
        assert!(s.is_comfort_at(11, 45));
        assert!(s.is_comfort_at(12, 0));
        assert!(s.is_comfort_at(21, 59));
        assert!(!s.is_comfort_at(22, 0));
        assert!(!s.is_comfort_at(23, 30));
    }

    #[test]
    fn describe_ranges() {
        let s = DaySchedule {
            am: 0b1111 << 12 | 1 << 23,
            pm: 1 << 0 | 0b11 << 10 | 1 << 23,
        };
        assert_eq!(
            s.describe(),
            "06:00-08:00, 11:30-12:00, 12:00-12:30, 17:00-18:00, 23:30-24:00"
        );
        assert_eq!(DaySchedule { am: 0, pm: 0 }.describe(), "No active periods");
        assert_eq!(DaySchedule::default().describe(), "06:00-12:00, 12:00-22:00");
    }

    #[test]
    fn per_weekday_lookup() {
        let mut week = WeekSchedule::default();
        week.saturday = DaySchedule { am: 0, pm: 0 };
        assert_eq!(week.preset_at(at(1, 8, 0)), Preset::Comfort);
        assert_eq!(week.preset_at(at(6, 8, 0)), Preset::Eco);
        assert_eq!(week.preset_at(at(7, 8, 0)), Preset::Comfort);
    }

    #[test]
    fn setpoint_by_work_state() {
        let week = WeekSchedule::default();
        let night = at(2, 3, 0);
        let day = at(2, 15, 0);
        assert_eq!(room_setpoint(WorkState::Off, 21.0, 19.0, &week, day), None);
        assert_eq!(
            room_setpoint(WorkState::Comfort, 21.0, 19.0, &week, night),
            Some((Preset::Comfort, 21.0))
        );
        assert_eq!(
            room_setpoint(WorkState::Eco, 21.0, 19.0, &week, day),
            Some((Preset::Eco, 19.0))
        );
        assert_eq!(
            room_setpoint(WorkState::Auto, 21.0, 19.0, &week, night),
            Some((Preset::Eco, 19.0))
        );
        assert_eq!(
            room_setpoint(WorkState::Auto, 21.0, 19.0, &week, day),
            Some((Preset::Comfort, 21.0))
        );
    }

    #[test]
    fn work_state_from_toml() {
        #[derive(Deserialize)]
        struct W {
            work_state: WorkState,
        }
        let w: W = toml::from_str("work_state = \"eco\"").unwrap();
        assert_eq!(w.work_state, WorkState::Eco);
    }
}
