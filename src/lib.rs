//! Film Bar Simulation Library
//!
//! Simulation of a rigid bar floating on a soap film with:
//! - Surface tension and spring forces
//! - Contact limit with dry friction
//! - Calibration sweeps over the spring constant
//! - Graph export

pub mod config;
pub mod physics;
pub mod render;
pub mod export;

pub use config::SimulationConfig;
pub use physics::{BarSimulator, ParameterPanel, ParameterSource};
