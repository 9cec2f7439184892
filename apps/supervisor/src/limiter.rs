/// Rate limiter for the published flow setpoint.
///
/// The correction itself jumps at the band edges; this keeps the controller
/// from seeing more than `max_step` °C of change per cycle.
#[derive(Debug, Clone)]
pub struct SetpointLimiter {
    max_step: f64,
    last: Option<f64>,
}

impl SetpointLimiter {
    /// `max_step == 0.0` passes every target through unchanged.
    pub fn new(max_step: f64) -> Self {
        Self {
            max_step,
            last: None,
        }
    }

    /// Value to publish on the way to `target`. Does not remember it; call
    /// [`Self::commit`] once the value has actually been applied.
    pub fn next(&self, target: f64) -> f64 {
        match self.last {
            Some(last) if self.max_step > 0.0 => {
                target.clamp(last - self.max_step, last + self.max_step)
            }
            _ => target,
        }
    }

    pub fn commit(&mut self, applied: f64) {
        self.last = Some(applied);
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }
}
