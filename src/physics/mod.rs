//! Physics simulation modules
//!
//! Contains the model of a bar floating on a soap film:
//! - Forces: surface tension, springs, damping and contact friction
//! - Parameters: the parameter source and derived constants
//! - Integrator: per-step explicit Euler update and run lifecycle
//! - History: bounded position trace for the strip chart
//! - Calibration: spring constant sweeps
//! - Readout: formatted stat lines

pub mod forces;
pub mod parameters;
pub mod integrator;
pub mod history;
pub mod calibration;
pub mod readout;

pub use forces::ForceBalance;
pub use parameters::{DerivedConstants, Parameter, ParameterPanel, ParameterSource, recompute_derived};
pub use integrator::{BarSimulator, RunPhase, SimulationState, StepOutcome, StopReason};
pub use history::{HistorySample, PositionHistory};
pub use calibration::{CalibrationCurve, CalibrationSample, run_sweep};
pub use readout::Readout;
