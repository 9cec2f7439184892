use chrono::{DateTime, Local};
use flow_correction::{CorrectionInput, CorrectionResult, FlowTemperatureCorrector, InvalidReadingError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{ControlConfig, RoomConfig};
use crate::limiter::SetpointLimiter;
use crate::schedule::room_setpoint;
use crate::sink::SetpointSink;
use crate::web::{HistoryPoint, ServerState};

const HISTORY_SECS: i64 = 6 * 3600;

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Circuit is off; nothing published.
    Idle,
    Applied {
        result: CorrectionResult,
        flow_temperature: f64,
    },
    /// A reading was unusable; the controller keeps the last setpoint.
    InvalidReading(InvalidReadingError),
    SinkFailed {
        result: CorrectionResult,
        error: String,
    },
}

/// Computed setpoint waiting to be written to the sink.
struct Publication {
    result: CorrectionResult,
    flow_temperature: f64,
    base: f64,
    room: f64,
    room_setpoint: f64,
}

enum Step {
    Done(CycleOutcome),
    Publish(Publication),
}

/// Runs one correction per cycle and publishes the result.
pub struct Supervisor<S: SetpointSink> {
    corrector: FlowTemperatureCorrector,
    control: ControlConfig,
    room: RoomConfig,
    limiter: SetpointLimiter,
    sink: S,
}

impl<S: SetpointSink> Supervisor<S> {
    pub fn new(corrector: FlowTemperatureCorrector, control: ControlConfig, room: RoomConfig, sink: S) -> Self {
        let limiter = SetpointLimiter::new(control.max_step);
        Self {
            corrector,
            control,
            room,
            limiter,
            sink,
        }
    }

    /// Runs one cycle against the shared state.
    ///
    /// The state lock is released while the sink writes, so a slow controller
    /// bridge does not hold up the web API.
    pub async fn cycle(&mut self, shared: &RwLock<ServerState>, now: DateTime<Local>) -> CycleOutcome {
        let step = {
            let mut state = shared.write().await;
            self.evaluate(&mut state, now)
        };
        let publication = match step {
            Step::Done(outcome) => return outcome,
            Step::Publish(publication) => publication,
        };
        let written = self.sink.write_setpoint(publication.flow_temperature);
        let mut state = shared.write().await;
        self.record(&mut state, publication, written, now)
    }

    fn evaluate(&mut self, state: &mut ServerState, now: DateTime<Local>) -> Step {
        let setpoint = room_setpoint(
            state.work_state,
            self.room.comfort_temperature,
            self.room.eco_temperature,
            &self.room.schedule,
            now,
        );
        state.preset = setpoint.map(|(preset, _)| preset);
        state.room_setpoint = setpoint.map(|(_, temp)| temp);

        let Some((preset, room_setpoint)) = setpoint else {
            debug!("circuit off, no setpoint published");
            state.last_result = None;
            state.last_skip = Some("circuit off".to_string());
            return Step::Done(CycleOutcome::Idle);
        };

        let (base, room) = state.readings.snapshot(now, self.control.stale_after_secs);
        let input = CorrectionInput::new(base, room, room_setpoint);

        let result = match self.corrector.correct(input) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "skipping cycle: {}, keeping {}",
                    e,
                    self.limiter
                        .last()
                        .map_or_else(|| "controller setpoint".to_string(), |t| format!("{:.1}", t))
                );
                state.last_result = None;
                state.last_skip = Some(e.to_string());
                return Step::Done(CycleOutcome::InvalidReading(e));
            }
        };
        state.last_result = Some(result);

        let target = result.flow_temperature.min(self.control.max_flow_temperature);
        let flow_temperature = self.limiter.next(target);
        debug!(
            "{:?} setpoint={:.1} room={:.1} base={:.1} diff={:.2} zone={} flow={:.1} target={:.1} applied={:.1}",
            preset, room_setpoint, room, base, result.diff, result.zone, result.flow_temperature, target, flow_temperature
        );

        Step::Publish(Publication {
            result,
            flow_temperature,
            base,
            room,
            room_setpoint,
        })
    }

    fn record(
        &mut self,
        state: &mut ServerState,
        publication: Publication,
        written: anyhow::Result<()>,
        now: DateTime<Local>,
    ) -> CycleOutcome {
        let Publication {
            result,
            flow_temperature,
            base,
            room,
            room_setpoint,
        } = publication;

        if let Err(e) = written {
            warn!("failed to publish flow setpoint {:.1}: {:#}", flow_temperature, e);
            state.last_skip = Some(format!("{:#}", e));
            return CycleOutcome::SinkFailed {
                result,
                error: format!("{:#}", e),
            };
        }

        if self.limiter.last().map_or(true, |last| (last - flow_temperature).abs() >= 0.05) {
            info!("flow setpoint {:.1} ({}, diff {:.2})", flow_temperature, result.zone, result.diff);
        }
        self.limiter.commit(flow_temperature);

        state.applied_flow_temperature = Some(flow_temperature);
        state.last_skip = None;
        let timestamp = now.timestamp();
        state.history.push(HistoryPoint {
            timestamp,
            base_temperature: base,
            room_temperature: room,
            room_setpoint,
            flow_temperature,
            zone: result.zone,
        });
        state.history.retain(|p| p.timestamp >= timestamp - HISTORY_SECS);

        CycleOutcome::Applied {
            result,
            flow_temperature,
        }
    }
}
