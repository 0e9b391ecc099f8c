//! Force and torque balance on the floating bar.
//!
//! The film pulls the bar up with a constant force, two springs pull it
//! back toward their rest position, and gravity acts on its mass:
//!
//! ```text
//! Fs = 2 * w * gamma
//! Fk = 2 * k * (y - y_rest)
//! m * y'' = Fs - Fk - 2 * dir * F_dyn - c * y' - m * g
//! ```
//!
//! The surface tension resultant acts at an offset `d` from the bar centre,
//! producing a torque that the springs resist. When the bar rotates far
//! enough for its corner to touch the frame it is pinned there and dry
//! friction opposes its translation.

use crate::config::SimulationConfig;

/// Below this |sin(rotation)| the friction term is treated as zero.
const MIN_CONTACT_SINE: f64 = 1e-9;

/// Forces and torques acting on the bar for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceBalance {
    /// Upward pull of the film
    pub surface_tension: f64,
    /// Restoring force of both springs
    pub spring: f64,
    /// Torque from the offset surface tension resultant
    pub surface_tension_torque: f64,
    /// Restoring torque of both springs
    pub spring_torque: f64,
    /// Viscous damping force
    pub damping: f64,
}

impl ForceBalance {
    /// Compute the force balance for the given bar state.
    pub fn compute(config: &SimulationConfig, position: f64, velocity: f64, rotation: f64) -> Self {
        let surface_tension = config.surface_tension_force();
        Self {
            surface_tension,
            spring: spring_force(config, position),
            surface_tension_torque: surface_tension_torque(config, surface_tension, rotation),
            spring_torque: spring_torque(config, rotation),
            damping: config.friction.damping_coefficient * velocity,
        }
    }

    /// Total torque about the bar centre.
    pub fn torque(&self) -> f64 {
        self.surface_tension_torque + self.spring_torque
    }

    /// Net vertical force including friction and damping but not gravity.
    pub fn driving_force(&self, direction: f64, dynamic_friction: f64) -> f64 {
        self.surface_tension - self.spring - direction * dynamic_friction * 2.0 - self.damping
    }

    /// Net vertical force ignoring friction and damping, gravity included.
    pub fn static_imbalance(&self, weight: f64) -> f64 {
        self.surface_tension - self.spring - weight
    }
}

/// Restoring force of both springs at the given position.
pub fn spring_force(config: &SimulationConfig, position: f64) -> f64 {
    2.0 * config.spring.spring_constant * (position - config.spring.rest_position)
}

/// Torque of the surface tension resultant acting at the offset distance.
pub fn surface_tension_torque(config: &SimulationConfig, surface_tension: f64, rotation: f64) -> f64 {
    config.bar.offset_distance * surface_tension * (rotation + std::f64::consts::FRAC_PI_2).sin()
}

/// Restoring torque of the two springs.
///
/// Each spring end moves by `separation * sin(rotation)`, and both springs
/// act at the same lever arm.
pub fn spring_torque(config: &SimulationConfig, rotation: f64) -> f64 {
    let separation = config.spring.separation;
    let displacement = separation * rotation.sin();
    let force_per_side = -config.spring.spring_constant * displacement;
    2.0 * force_per_side * separation
}

/// Largest rotation before the bar corner touches the frame.
pub fn contact_limit(config: &SimulationConfig) -> f64 {
    let width = config.bar.width;
    let reach = width + config.bar.tolerance;
    if reach <= 0.0 {
        return 0.0;
    }
    (width / reach).clamp(-1.0, 1.0).acos()
}

/// Dry friction while the bar is pinned at the contact limit.
///
/// Returns zero when the rotation is too close to level to resolve a
/// normal force, so the result is always finite.
pub fn dynamic_friction(config: &SimulationConfig, torque: f64, rotation: f64) -> f64 {
    let lever = (config.bar.width + config.bar.tolerance) * rotation.sin();
    if lever.abs() < MIN_CONTACT_SINE {
        return 0.0;
    }
    config.friction.dynamic_coefficient * torque / lever
}

/// Sign of the velocity, zero when the bar is exactly at rest.
pub fn direction_of(velocity: f64) -> f64 {
    if velocity == 0.0 {
        0.0
    } else {
        velocity.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_force_at_rest_is_zero() {
        let config = SimulationConfig::default();
        assert_eq!(spring_force(&config, config.spring.rest_position), 0.0);
    }

    #[test]
    fn test_spring_force_scales_with_displacement() {
        let config = SimulationConfig::default();
        // 2 * 0.45 * 10
        assert!((spring_force(&config, 10.0) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_level_bar_torque_is_offset_times_force() {
        let config = SimulationConfig::default();
        let balance = ForceBalance::compute(&config, 0.0, 0.0, 0.0);
        // -20 mm * 15
        assert!((balance.torque() + 300.0).abs() < 1e-9);
        assert_eq!(balance.spring_torque, 0.0);
    }

    #[test]
    fn test_spring_torque_opposes_rotation() {
        let config = SimulationConfig::default();
        assert!(spring_torque(&config, 0.1) < 0.0);
        assert!(spring_torque(&config, -0.1) > 0.0);
    }

    #[test]
    fn test_contact_limit_default_geometry() {
        let config = SimulationConfig::default();
        let expected = (150.0_f64 / 152.0).acos();
        assert!((contact_limit(&config) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_contact_limit_zero_tolerance() {
        let mut config = SimulationConfig::default();
        config.bar.tolerance = 0.0;
        assert_eq!(contact_limit(&config), 0.0);
    }

    #[test]
    fn test_dynamic_friction_is_finite_at_level() {
        let config = SimulationConfig::default();
        let friction = dynamic_friction(&config, 100.0, 0.0);
        assert_eq!(friction, 0.0);
    }

    #[test]
    fn test_dynamic_friction_value() {
        let config = SimulationConfig::default();
        let rotation = 0.15_f64;
        let expected = 0.35 * 50.0 / (152.0 * rotation.sin());
        assert!((dynamic_friction(&config, 50.0, rotation) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_direction_of() {
        assert_eq!(direction_of(0.0), 0.0);
        assert_eq!(direction_of(-0.0), 0.0);
        assert_eq!(direction_of(3.2), 1.0);
        assert_eq!(direction_of(-1e-9), -1.0);
    }
}
