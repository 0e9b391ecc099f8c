//! Stat lines shown next to the simulation.

use crate::physics::integrator::SimulationState;
use crate::physics::parameters::DerivedConstants;

/// Snapshot of the displayed quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub time: f64,
    pub position: f64,
    /// Offset from the analytic equilibrium, if one exists
    pub deviation: Option<f64>,
    /// Bar angle in degrees
    pub angle_degrees: f64,
}

impl Readout {
    pub fn capture(state: &SimulationState, derived: &DerivedConstants) -> Self {
        Self {
            time: state.time,
            position: state.position,
            deviation: derived
                .equilibrium_position
                .map(|equilibrium| state.position - equilibrium),
            angle_degrees: state.rotation.to_degrees(),
        }
    }

    /// Formatted lines in display order.
    pub fn lines(&self) -> [String; 4] {
        let deviation = match self.deviation {
            Some(value) => format!("dy: {:.2} mm", value),
            None => "dy: n/a".to_string(),
        };
        [
            format!("Time: {:.3} s", self.time),
            format!("y: {:.2} mm", self.position),
            deviation,
            format!("angle: {:.2} °", self.angle_degrees),
        ]
    }
}

impl std::fmt::Display for Readout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines().join(", "))
    }
}
