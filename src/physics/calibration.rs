//! Calibration sweep over the spring constant.
//!
//! Instead of a position-vs-time trace, the sweep runs one complete
//! simulation per spring constant and records where the bar came to rest
//! next to where the force balance says it should have.

use crate::physics::integrator::{BarSimulator, StopReason, TIME_LIMIT};
use crate::physics::parameters::{Parameter, ParameterPanel, ParameterSource};

/// Extra steps allowed past the time cutoff before a run is abandoned.
const STEP_MARGIN: usize = 16;

/// Outcome of one full run at a fixed spring constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    /// Spring constant used for the run (mN/mm)
    pub spring_constant: f64,
    /// Position where the run stopped (mm)
    pub final_position: f64,
    /// Analytic equilibrium for this spring constant (mm)
    pub equilibrium_position: Option<f64>,
    /// Condition that ended the run
    pub stop_reason: Option<StopReason>,
    /// Simulated time the run took (s)
    pub duration: f64,
}

impl CalibrationSample {
    /// Distance between the simulated and analytic rest positions.
    pub fn deviation(&self) -> Option<f64> {
        self.equilibrium_position
            .map(|equilibrium| self.final_position - equilibrium)
    }
}

/// Final position as a function of spring constant.
#[derive(Debug, Clone, Default)]
pub struct CalibrationCurve {
    samples: Vec<CalibrationSample>,
}

impl CalibrationCurve {
    pub fn from_samples(samples: Vec<CalibrationSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[CalibrationSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest |final - equilibrium| over samples that have an equilibrium.
    pub fn max_deviation(&self) -> Option<f64> {
        self.samples
            .iter()
            .filter_map(CalibrationSample::deviation)
            .map(f64::abs)
            .reduce(f64::max)
    }
}

/// Spring constants visited by the sweep, computed from integer indices.
///
/// The range is clamped to the spring constant slider and the increment is
/// raised to at least one slider step, so each value is one the panel can
/// hold, no value repeats, and a sweep has at most one run per step.
pub fn sweep_values(start: f64, end: f64, increment: f64) -> Vec<f64> {
    if !start.is_finite() {
        return Vec::new();
    }
    let range = Parameter::SpringConstant.range();
    let start = range.constrain(start);
    if increment.is_nan() || increment <= 0.0 || !end.is_finite() || end < start {
        return vec![start];
    }
    let end = range.constrain(end);
    let increment = increment.max(range.step);

    let count = ((end - start) / increment + 1e-9).floor() as usize;
    let mut values: Vec<f64> = (0..=count)
        .map(|index| range.constrain(start + index as f64 * increment))
        .collect();
    values.dedup();
    values
}

/// Run the calibration sweep configured on the panel.
///
/// The panel's spring constant is restored when the sweep finishes.
pub fn run_sweep(panel: &mut ParameterPanel) -> CalibrationCurve {
    run_sweep_with_progress(panel, |_| {})
}

/// Run the calibration sweep, reporting each sample as it completes.
pub fn run_sweep_with_progress<F>(panel: &mut ParameterPanel, mut progress: F) -> CalibrationCurve
where
    F: FnMut(&CalibrationSample),
{
    let original = panel.get(Parameter::SpringConstant);
    let sweep = panel.config().calibration.clone();
    let values = sweep_values(sweep.start, sweep.end, sweep.increment);
    log::info!(
        "Calibrating {} spring constants from {} to {}",
        values.len(),
        sweep.start,
        sweep.end
    );

    let mut simulator = BarSimulator::for_calibration(panel.config());
    let mut curve = CalibrationCurve::default();

    for value in values {
        let spring_constant = panel.set(Parameter::SpringConstant, value);
        let max_steps = (TIME_LIMIT / panel.config().dt).ceil() as usize + STEP_MARGIN;

        simulator.start();
        simulator.run_to_completion(&*panel, max_steps);

        let sample = CalibrationSample {
            spring_constant,
            final_position: simulator.position(),
            equilibrium_position: panel.derived().equilibrium_position,
            stop_reason: simulator.stop_reason(),
            duration: simulator.time(),
        };
        log::debug!(
            "k={:.3}: y={:.3} ({})",
            sample.spring_constant,
            sample.final_position,
            sample
                .stop_reason
                .map_or_else(|| "step cap".to_string(), |reason| reason.to_string())
        );
        progress(&sample);
        curve.samples.push(sample);
    }

    panel.set(Parameter::SpringConstant, original);
    curve
}
