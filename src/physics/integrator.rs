//! Explicit Euler integrator for the floating bar.
//!
//! Each step accumulates the force and torque balance, advances the
//! rotation, pins the bar at the contact limit if it has rotated too far,
//! and then either stops the run or advances the vertical motion:
//!
//! ```text
//! alpha = T / I             omega += alpha * dt      theta += omega * dt
//! a = (Fs - Fk - 2 * dir * F_dyn - c * v) / m - g
//! v += a * dt               y += v * dt              t += dt
//! ```

use crate::config::SimulationConfig;
use crate::physics::forces::{self, ForceBalance};
use crate::physics::history::PositionHistory;
use crate::physics::parameters::ParameterSource;

/// Net force below which the bar counts as balanced.
pub const FORCE_THRESHOLD: f64 = 0.01;

/// Speed below which the bar counts as at rest (mm/s).
pub const VELOCITY_THRESHOLD: f64 = 0.05;

/// Hard cutoff on simulated time for runs that never settle (s).
pub const TIME_LIMIT: f64 = 4.0;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Net force and velocity both fell below their thresholds
    ForcesBalanced,
    /// Dry friction at the contact limit holds the bar in place
    FrictionLock,
    /// Simulated time passed the cutoff
    TimeLimit,
    /// Bar reached the top of the frame
    UpperBound,
    /// Bar fell back to the bottom stop
    LowerBound,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::ForcesBalanced => "forces balanced",
            StopReason::FrictionLock => "friction lock",
            StopReason::TimeLimit => "time limit",
            StopReason::UpperBound => "upper bound",
            StopReason::LowerBound => "lower bound",
        };
        f.write_str(text)
    }
}

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Never started
    Idle,
    Running,
    /// Ended by a stop condition, terminal until the next start
    Stopped,
}

/// Result of a single call to [`BarSimulator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// State advanced by one time step
    Advanced,
    /// The run ended during this step
    Stopped(StopReason),
    /// No run was active, nothing changed
    Idle,
}

/// Complete dynamic state of the bar.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Elapsed simulated time (s)
    pub time: f64,
    /// Vertical position (mm)
    pub position: f64,
    /// Vertical velocity (mm/s)
    pub velocity: f64,
    /// Vertical acceleration (mm/s^2)
    pub acceleration: f64,
    /// Rotation (rad)
    pub rotation: f64,
    /// Angular velocity (rad/s)
    pub angular_velocity: f64,
    /// Angular acceleration (rad/s^2)
    pub angular_acceleration: f64,
    /// True while a run is active
    pub running: bool,
    /// Condition that ended the last run
    pub stop_reason: Option<StopReason>,
    /// Recent positions for the strip chart
    pub history: PositionHistory,
}

impl SimulationState {
    /// Create an idle state with an empty history window.
    pub fn new(history: PositionHistory) -> Self {
        Self {
            time: 0.0,
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            rotation: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            running: false,
            stop_reason: None,
            history,
        }
    }

    fn stop(&mut self, reason: StopReason) {
        self.running = false;
        self.stop_reason = Some(reason);
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(PositionHistory::default())
    }
}

/// Bar dynamics integrator.
///
/// Owns one [`SimulationState`] and advances it by a fixed step using the
/// parameters supplied on each call.
#[derive(Debug, Clone)]
pub struct BarSimulator {
    state: SimulationState,
    /// Whether any run has been started yet
    started: bool,
    /// Record positions into the history window
    record_history: bool,
}

impl BarSimulator {
    /// Create an idle simulator with a history window sized for the graph.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            state: SimulationState::new(PositionHistory::for_graph(&config.graph)),
            started: false,
            record_history: true,
        }
    }

    /// Create a simulator for calibration sweeps, which keeps no time trace.
    pub fn for_calibration(config: &SimulationConfig) -> Self {
        let mut simulator = Self::new(config);
        simulator.record_history = false;
        simulator
    }

    /// Start a new run from the bottom with the bar level and at rest.
    pub fn start(&mut self) {
        let state = &mut self.state;
        state.time = 0.0;
        state.position = 0.0;
        state.velocity = 0.0;
        state.rotation = 0.0;
        state.angular_velocity = 0.0;
        state.stop_reason = None;
        state.history.clear();
        state.running = true;
        self.started = true;
        log::debug!("Run started");
    }

    /// Advance the simulation by one time step.
    ///
    /// Does nothing unless a run is active.
    pub fn step<S: ParameterSource + ?Sized>(&mut self, source: &S) -> StepOutcome {
        if !self.state.running {
            return StepOutcome::Idle;
        }

        let config = source.config();
        let derived = source.derived();
        let dt = config.dt;
        let state = &mut self.state;

        let balance = ForceBalance::compute(config, state.position, state.velocity, state.rotation);
        let torque = balance.torque();
        let direction = forces::direction_of(state.velocity);

        state.angular_acceleration = torque / derived.moment_of_inertia;
        state.angular_velocity += state.angular_acceleration * dt;
        state.rotation += state.angular_velocity * dt;

        // Corner against the frame: pin the bar and engage dry friction
        let mut dynamic_friction = 0.0;
        if state.rotation.abs() > derived.contact_limit {
            state.rotation = derived.contact_limit.copysign(state.rotation);
            state.angular_velocity = 0.0;
            dynamic_friction = forces::dynamic_friction(config, torque, state.rotation);
        }

        let driving_force = balance.driving_force(direction, dynamic_friction);
        let weight = config.bar_weight();
        state.acceleration = driving_force / config.bar.mass - config.environment.gravity;

        if let Some(reason) = check_stop(
            driving_force - weight,
            state.velocity,
            balance.static_imbalance(weight),
            dynamic_friction,
            state.time,
        ) {
            state.stop(reason);
            log::debug!("Run stopped at t={:.3}s: {}", state.time, reason);
            return StepOutcome::Stopped(reason);
        }

        state.velocity += state.acceleration * dt;
        state.position += state.velocity * dt;
        state.time += dt;

        if self.record_history {
            state.history.push(state.time, state.position);
        }

        log::trace!(
            "t={:.4} y={:.4} v={:.4} rot={:.5}",
            state.time,
            state.position,
            state.velocity,
            state.rotation
        );

        let upper = config.upper_travel_limit();
        let lower = config.spring.rest_position;
        let bound = if state.position > upper {
            Some((upper, StopReason::UpperBound))
        } else if state.position < lower {
            Some((lower, StopReason::LowerBound))
        } else {
            None
        };

        if let Some((limit, reason)) = bound {
            state.position = limit;
            state.velocity = 0.0;
            state.stop(reason);
            log::debug!("Run stopped at t={:.3}s: {}", state.time, reason);
            return StepOutcome::Stopped(reason);
        }

        StepOutcome::Advanced
    }

    /// Step until the run stops or `max_steps` steps have been taken.
    ///
    /// Returns the number of steps that advanced the state.
    pub fn run_to_completion<S: ParameterSource + ?Sized>(
        &mut self,
        source: &S,
        max_steps: usize,
    ) -> usize {
        let mut advanced = 0;
        while advanced < max_steps {
            match self.step(source) {
                StepOutcome::Advanced => advanced += 1,
                StepOutcome::Stopped(_) | StepOutcome::Idle => break,
            }
        }
        advanced
    }

    /// Current run phase.
    pub fn phase(&self) -> RunPhase {
        if self.state.running {
            RunPhase::Running
        } else if self.started {
            RunPhase::Stopped
        } else {
            RunPhase::Idle
        }
    }

    /// Get reference to the simulation state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn time(&self) -> f64 {
        self.state.time
    }

    pub fn position(&self) -> f64 {
        self.state.position
    }

    pub fn velocity(&self) -> f64 {
        self.state.velocity
    }

    pub fn rotation(&self) -> f64 {
        self.state.rotation
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.state.stop_reason
    }

    pub fn history(&self) -> &PositionHistory {
        &self.state.history
    }
}

/// Evaluate the stop conditions for one step.
///
/// The conditions are independent; when several hold the first in
/// declaration order of [`StopReason`] is reported.
fn check_stop(
    net_force: f64,
    velocity: f64,
    static_imbalance: f64,
    dynamic_friction: f64,
    time: f64,
) -> Option<StopReason> {
    let forces_balanced = net_force.abs() < FORCE_THRESHOLD && velocity.abs() < VELOCITY_THRESHOLD;
    let friction_lock = static_imbalance.abs() < dynamic_friction;
    let time_exceeded = time > TIME_LIMIT;

    if forces_balanced {
        Some(StopReason::ForcesBalanced)
    } else if friction_lock {
        Some(StopReason::FrictionLock)
    } else if time_exceeded {
        Some(StopReason::TimeLimit)
    } else {
        None
    }
}
