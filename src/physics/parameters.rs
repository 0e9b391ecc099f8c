//! Parameter source for the bar integrator.
//!
//! The integrator never caches anything derived from the configuration. It
//! asks a [`ParameterSource`] for the current values at every step, so an
//! edit made between two steps is picked up immediately without restarting
//! the run.

use crate::config::SimulationConfig;
use crate::physics::forces;

/// Constants that depend on several configuration fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedConstants {
    /// Moment of inertia of the bar about its centre (kg*mm^2)
    pub moment_of_inertia: f64,
    /// Position where film, springs and gravity balance (mm).
    /// `None` when the springs have no stiffness.
    pub equilibrium_position: Option<f64>,
    /// Largest rotation before the bar touches the frame (rad)
    pub contact_limit: f64,
}

/// Compute the derived constants for a configuration.
pub fn recompute_derived(config: &SimulationConfig) -> DerivedConstants {
    let span = config.bar.width + config.bar.inertia_padding;
    let moment_of_inertia = config.bar.mass * span * span / 12.0;

    let spring_constant = config.spring.spring_constant;
    let equilibrium_position = if spring_constant > 0.0 {
        Some(
            (config.surface_tension_force() - config.bar_weight()) / (2.0 * spring_constant)
                + config.spring.rest_position,
        )
    } else {
        None
    };

    DerivedConstants {
        moment_of_inertia,
        equilibrium_position,
        contact_limit: forces::contact_limit(config),
    }
}

/// Supplies the current parameters to the integrator.
pub trait ParameterSource {
    /// Current configuration.
    fn config(&self) -> &SimulationConfig;

    /// Derived constants matching [`ParameterSource::config`].
    ///
    /// The default recomputes on every call.
    fn derived(&self) -> DerivedConstants {
        recompute_derived(self.config())
    }
}

impl ParameterSource for SimulationConfig {
    fn config(&self) -> &SimulationConfig {
        self
    }
}

/// Allowed values of an adjustable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Number of decimals implied by the step size.
    pub fn precision(&self) -> usize {
        let text = format!("{}", self.step);
        text.split_once('.').map_or(0, |(_, decimals)| decimals.len())
    }

    /// Clamp into the range and snap to the nearest step.
    pub fn constrain(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        let snapped = if self.step > 0.0 {
            self.min + ((clamped - self.min) / self.step).round() * self.step
        } else {
            clamped
        };
        let scale = 10f64.powi(self.precision() as i32);
        ((snapped * scale).round() / scale).clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Adjustable simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    SurfaceTension,
    SpringConstant,
    TimeStep,
    BarMass,
    Tolerance,
    OffsetDistance,
    DynamicFriction,
    Damping,
    RestPosition,
}

impl Parameter {
    pub const ALL: [Parameter; 9] = [
        Parameter::SurfaceTension,
        Parameter::SpringConstant,
        Parameter::TimeStep,
        Parameter::BarMass,
        Parameter::Tolerance,
        Parameter::OffsetDistance,
        Parameter::DynamicFriction,
        Parameter::Damping,
        Parameter::RestPosition,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Parameter::SurfaceTension => "Surface Tension",
            Parameter::SpringConstant => "Spring Constant",
            Parameter::TimeStep => "Time Step (dt)",
            Parameter::BarMass => "Bar Mass",
            Parameter::Tolerance => "Tolerance",
            Parameter::OffsetDistance => "Offset (d)",
            Parameter::DynamicFriction => "Dynamic friction",
            Parameter::Damping => "Damping",
            Parameter::RestPosition => "Rest Position",
        }
    }

    pub fn range(self) -> ParameterRange {
        match self {
            Parameter::SurfaceTension => ParameterRange::new(0.0, 0.1, 0.001),
            Parameter::SpringConstant => ParameterRange::new(0.0, 1.0, 0.01),
            Parameter::TimeStep => ParameterRange::new(0.0001, 0.01, 0.0001),
            Parameter::BarMass => ParameterRange::new(0.0001, 0.01, 0.0001),
            Parameter::Tolerance => ParameterRange::new(0.0, 5.0, 0.1),
            Parameter::OffsetDistance => ParameterRange::new(-75.0, 75.0, 1.0),
            Parameter::DynamicFriction => ParameterRange::new(0.0, 1.0, 0.01),
            Parameter::Damping => ParameterRange::new(0.0, 1.0, 0.01),
            Parameter::RestPosition => ParameterRange::new(0.0, 100.0, 1.0),
        }
    }

    /// Read the parameter from a configuration.
    pub fn get(self, config: &SimulationConfig) -> f64 {
        match self {
            Parameter::SurfaceTension => config.film.surface_tension,
            Parameter::SpringConstant => config.spring.spring_constant,
            Parameter::TimeStep => config.dt,
            Parameter::BarMass => config.bar.mass,
            Parameter::Tolerance => config.bar.tolerance,
            Parameter::OffsetDistance => config.bar.offset_distance,
            Parameter::DynamicFriction => config.friction.dynamic_coefficient,
            Parameter::Damping => config.friction.damping_coefficient,
            Parameter::RestPosition => config.spring.rest_position,
        }
    }

    fn slot(self, config: &mut SimulationConfig) -> &mut f64 {
        match self {
            Parameter::SurfaceTension => &mut config.film.surface_tension,
            Parameter::SpringConstant => &mut config.spring.spring_constant,
            Parameter::TimeStep => &mut config.dt,
            Parameter::BarMass => &mut config.bar.mass,
            Parameter::Tolerance => &mut config.bar.tolerance,
            Parameter::OffsetDistance => &mut config.bar.offset_distance,
            Parameter::DynamicFriction => &mut config.friction.dynamic_coefficient,
            Parameter::Damping => &mut config.friction.damping_coefficient,
            Parameter::RestPosition => &mut config.spring.rest_position,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Headless stand-in for the slider panel.
///
/// Every edit is clamped and snapped to the parameter's range, and the
/// derived constants are recomputed right away.
#[derive(Debug, Clone)]
pub struct ParameterPanel {
    config: SimulationConfig,
    derived: DerivedConstants,
}

impl ParameterPanel {
    /// Create a panel, clamping every adjustable parameter into its range.
    ///
    /// Loaded values are not snapped, so a configured mass of 0.000383 kg
    /// survives even though edits move in 0.0001 kg steps. The calibration
    /// sweep is held to the spring constant range, and its increment to at
    /// least one slider step.
    pub fn new(mut config: SimulationConfig) -> Self {
        for parameter in Parameter::ALL {
            let range = parameter.range();
            let slot = parameter.slot(&mut config);
            *slot = clamp_loaded(parameter.label(), *slot, range);
        }

        let range = Parameter::SpringConstant.range();
        let sweep = &mut config.calibration;
        sweep.start = clamp_loaded("Calibration start", sweep.start, range);
        sweep.end = clamp_loaded("Calibration end", sweep.end, range);
        if sweep.increment > 0.0 && sweep.increment < range.step {
            log::warn!(
                "Calibration increment {} finer than the spring constant step, using {}",
                sweep.increment,
                range.step
            );
            sweep.increment = range.step;
        }

        let derived = recompute_derived(&config);
        Self { config, derived }
    }

    /// Apply an edit and return the value actually stored.
    ///
    /// Non-finite input is ignored and the current value is returned.
    pub fn set(&mut self, parameter: Parameter, value: f64) -> f64 {
        let current = parameter.get(&self.config);
        if !value.is_finite() {
            log::warn!("Ignoring non-finite value for {}: {}", parameter, value);
            return current;
        }

        let range = parameter.range();
        let applied = range.constrain(value);
        if !range.contains(value) {
            log::warn!(
                "{} = {} outside [{}, {}], using {}",
                parameter,
                value,
                range.min,
                range.max,
                applied
            );
        }

        *parameter.slot(&mut self.config) = applied;
        self.derived = recompute_derived(&self.config);
        log::debug!("{} set to {}", parameter, applied);
        applied
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        parameter.get(&self.config)
    }

    pub fn into_config(self) -> SimulationConfig {
        self.config
    }
}

/// Clamp a value read from a config file, warning when it moves.
///
/// Non-finite values fall back to the range minimum.
fn clamp_loaded(name: &str, value: f64, range: ParameterRange) -> f64 {
    let clamped = if value.is_finite() {
        value.clamp(range.min, range.max)
    } else {
        range.min
    };
    if clamped != value {
        log::warn!(
            "{} = {} outside [{}, {}], using {}",
            name,
            value,
            range.min,
            range.max,
            clamped
        );
    }
    clamped
}

impl Default for ParameterPanel {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl ParameterSource for ParameterPanel {
    fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn derived(&self) -> DerivedConstants {
        self.derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_derived_constants() {
        let derived = recompute_derived(&SimulationConfig::default());

        let expected_inertia = 0.000383 * 160.0 * 160.0 / 12.0;
        assert!((derived.moment_of_inertia - expected_inertia).abs() < 1e-12);

        let expected_equilibrium = (15.0 - 0.000383 * 9810.0) / 0.9;
        let equilibrium = derived.equilibrium_position.unwrap();
        assert!((equilibrium - expected_equilibrium).abs() < 1e-9);
    }

    #[test]
    fn test_equilibrium_includes_rest_position() {
        let mut config = SimulationConfig::default();
        let base = recompute_derived(&config).equilibrium_position.unwrap();
        config.spring.rest_position = 5.0;
        let shifted = recompute_derived(&config).equilibrium_position.unwrap();
        assert!((shifted - base - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_spring_constant_has_no_equilibrium() {
        let mut config = SimulationConfig::default();
        config.spring.spring_constant = 0.0;
        assert!(recompute_derived(&config).equilibrium_position.is_none());
    }

    #[test]
    fn test_range_precision() {
        assert_eq!(Parameter::SurfaceTension.range().precision(), 3);
        assert_eq!(Parameter::TimeStep.range().precision(), 4);
        assert_eq!(Parameter::OffsetDistance.range().precision(), 0);
    }

    #[test]
    fn test_set_snaps_to_step() {
        let mut panel = ParameterPanel::default();
        let applied = panel.set(Parameter::SpringConstant, 0.456);
        assert!((applied - 0.46).abs() < 1e-12);
        assert!((panel.config().spring.spring_constant - 0.46).abs() < 1e-12);
    }

    #[test]
    fn test_set_clamps_to_range() {
        let mut panel = ParameterPanel::default();
        assert!((panel.set(Parameter::SurfaceTension, 5.0) - 0.1).abs() < 1e-12);
        assert!((panel.set(Parameter::TimeStep, 0.0) - 0.0001).abs() < 1e-12);
        assert!((panel.set(Parameter::OffsetDistance, -400.0) + 75.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_edit_is_ignored() {
        let mut panel = ParameterPanel::default();
        let applied = panel.set(Parameter::BarMass, f64::NAN);
        assert!((applied - 0.000383).abs() < 1e-12);
        assert!((panel.get(Parameter::BarMass) - 0.000383).abs() < 1e-12);
    }

    #[test]
    fn test_edit_recomputes_derived() {
        let mut panel = ParameterPanel::default();
        let before = panel.derived();

        panel.set(Parameter::SpringConstant, 0.9);
        let after = panel.derived();

        assert_eq!(after, recompute_derived(panel.config()));
        assert!(after.equilibrium_position.unwrap() < before.equilibrium_position.unwrap());

        panel.set(Parameter::BarMass, 0.001);
        assert!(panel.derived().moment_of_inertia > after.moment_of_inertia);

        panel.set(Parameter::Tolerance, 0.0);
        assert_eq!(panel.derived().contact_limit, 0.0);
    }

    #[test]
    fn test_new_constrains_loaded_values() {
        let mut config = SimulationConfig::default();
        config.dt = 0.0;
        config.friction.damping_coefficient = 3.0;

        config.bar.offset_distance = f64::INFINITY;

        let panel = ParameterPanel::new(config);
        assert!((panel.config().dt - 0.0001).abs() < 1e-12);
        assert!((panel.config().friction.damping_coefficient - 1.0).abs() < 1e-12);
        assert!((panel.config().bar.offset_distance + 75.0).abs() < 1e-12);
        // In range but off-step values are kept as loaded
        assert!((panel.config().bar.mass - 0.000383).abs() < 1e-15);
    }

    #[test]
    fn test_new_constrains_calibration_sweep() {
        let mut config = SimulationConfig::default();
        config.calibration.start = -0.5;
        config.calibration.end = 1.3;
        config.calibration.increment = 0.005;

        let panel = ParameterPanel::new(config);
        let sweep = &panel.config().calibration;
        assert_eq!(sweep.start, 0.0);
        assert_eq!(sweep.end, 1.0);
        assert!((sweep.increment - 0.01).abs() < 1e-12);
    }
}
