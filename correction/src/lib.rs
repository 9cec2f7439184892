//! Room-temperature correction of the underfloor heating flow setpoint.
//!
//! With the heat pump controller's own room correction blocked, the supervisor
//! feeds the base curve temperature, the room reading and the room setpoint
//! through [`correct`] every cycle and writes the result back as the flow
//! temperature setpoint.

pub mod corrector;
pub mod error;
pub mod params;

pub use corrector::{correct, quantize, CorrectionInput, CorrectionResult, FlowTemperatureCorrector, Zone};
pub use error::{ConfigurationError, InvalidReadingError, Reading};
pub use params::CorrectionParameters;
