//! End-to-end scenarios for the bar integrator
//!
//! Each test builds its own simulator and parameter panel, drives a full
//! run through the public API and checks the resulting state.

use film_bar_sim::config::SimulationConfig;
use film_bar_sim::export;
use film_bar_sim::physics::calibration;
use film_bar_sim::physics::integrator::TIME_LIMIT;
use film_bar_sim::physics::{
    BarSimulator, Parameter, ParameterPanel, ParameterSource, RunPhase, StepOutcome, StopReason,
};

/// Steps needed to reach the time cutoff, plus slack.
fn step_budget(config: &SimulationConfig) -> usize {
    (TIME_LIMIT / config.dt).ceil() as usize + 16
}

fn reference_panel() -> ParameterPanel {
    let mut config = SimulationConfig::default();
    config.film.surface_tension = 0.05;
    config.spring.spring_constant = 0.45;
    config.bar.mass = 0.000383;
    config.dt = 0.001;
    config.bar.tolerance = 2.0;
    config.bar.offset_distance = -20.0;
    config.friction.damping_coefficient = 0.05;
    config.friction.dynamic_coefficient = 0.35;
    ParameterPanel::new(config)
}

#[test]
fn equilibrium_convergence() {
    let panel = reference_panel();
    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();
    simulator.run_to_completion(&panel, step_budget(panel.config()));

    assert_eq!(simulator.phase(), RunPhase::Stopped);
    assert_eq!(simulator.stop_reason(), Some(StopReason::ForcesBalanced));
    assert!(simulator.time() < TIME_LIMIT);

    let equilibrium = panel.derived().equilibrium_position.unwrap();
    assert!(
        (simulator.position() - equilibrium).abs() < 0.05,
        "settled at {} but equilibrium is {}",
        simulator.position(),
        equilibrium
    );
}

#[test]
fn immediate_boundary_stop() {
    let mut panel = reference_panel();
    panel.set(Parameter::RestPosition, 5.0);

    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();

    assert_eq!(
        simulator.step(&panel),
        StepOutcome::Stopped(StopReason::LowerBound)
    );
    assert_eq!(simulator.position(), 5.0);
    assert_eq!(simulator.velocity(), 0.0);
    assert!(!simulator.is_running());
}

#[test]
fn pure_translation_never_rotates() {
    let mut panel = reference_panel();
    panel.set(Parameter::OffsetDistance, 0.0);

    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();
    for _ in 0..step_budget(panel.config()) {
        simulator.step(&panel);
        assert_eq!(simulator.rotation(), 0.0);
        assert_eq!(simulator.state().angular_velocity, 0.0);
        if !simulator.is_running() {
            break;
        }
    }
    assert!(!simulator.is_running());
}

#[test]
fn degenerate_springs_are_bounded() {
    let mut panel = reference_panel();
    panel.set(Parameter::SpringConstant, 0.0);
    panel.set(Parameter::SurfaceTension, 0.02);

    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();
    let steps = simulator.run_to_completion(&panel, step_budget(panel.config()));

    assert!(!simulator.is_running());
    assert!(steps <= step_budget(panel.config()));
    assert!(simulator.position().is_finite());
    assert!(simulator.time() <= TIME_LIMIT + 2.0 * panel.config().dt);
}

#[test]
fn mid_run_edit_takes_effect_without_restart() {
    let mut panel = reference_panel();
    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();
    for _ in 0..20 {
        simulator.step(&panel);
    }
    let time_before = simulator.time();

    panel.set(Parameter::SurfaceTension, 0.1);
    assert_eq!(simulator.step(&panel), StepOutcome::Advanced);
    assert!((simulator.time() - time_before - panel.config().dt).abs() < 1e-12);

    simulator.run_to_completion(&panel, step_budget(panel.config()));
    let equilibrium = panel.derived().equilibrium_position.unwrap();
    assert!(equilibrium > 25.0);
    assert!(simulator.position() > 20.0);
}

#[test]
fn history_tracks_latest_window() {
    let mut panel = reference_panel();
    // Slow settling run that outlasts the 400 sample window
    panel.set(Parameter::SpringConstant, 0.1);

    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();
    let steps = simulator.run_to_completion(&panel, step_budget(panel.config()));

    let history = simulator.history();
    assert!(steps > history.capacity());
    assert_eq!(history.len(), history.capacity());
    assert_eq!(history.evicted(), steps - history.capacity());
    assert_eq!(history.latest(), Some(simulator.position()));
}

#[test]
fn trace_times_survive_time_step_edit() {
    let mut panel = reference_panel();
    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();
    for _ in 0..10 {
        assert_eq!(simulator.step(&panel), StepOutcome::Advanced);
    }

    panel.set(Parameter::TimeStep, 0.002);
    for _ in 0..5 {
        assert_eq!(simulator.step(&panel), StepOutcome::Advanced);
    }

    let times: Vec<f64> = simulator.history().samples().map(|sample| sample.time).collect();
    assert_eq!(times.len(), 15);
    assert!((times[9] - 0.010).abs() < 1e-9);
    assert!((times[10] - 0.012).abs() < 1e-9);
    assert!((times[14] - 0.020).abs() < 1e-9);

    let csv = export::trace_csv(simulator.history());
    let last = csv.lines().last().unwrap();
    assert!(last.starts_with("0.020000,"), "last row was {}", last);
}

#[test]
fn cornered_bar_locks_by_friction() {
    let mut panel = reference_panel();
    panel.set(Parameter::DynamicFriction, 1.0);
    panel.set(Parameter::OffsetDistance, -75.0);

    let mut simulator = BarSimulator::new(panel.config());
    simulator.start();
    let steps = simulator.run_to_completion(&panel, step_budget(panel.config()));

    assert_eq!(simulator.stop_reason(), Some(StopReason::FrictionLock));
    assert_eq!(steps, 15);
    assert_eq!(simulator.rotation(), -panel.derived().contact_limit);
    assert_eq!(simulator.state().angular_velocity, 0.0);

    // Stuck well short of the force balance
    let equilibrium = panel.derived().equilibrium_position.unwrap();
    assert!(simulator.position() > 0.0);
    assert!(simulator.position() < equilibrium / 2.0);
}

#[test]
fn calibration_sweep_exports() {
    let mut config = SimulationConfig::default();
    config.calibration.start = 0.6;
    config.calibration.end = 1.0;
    config.calibration.increment = 0.2;
    let mut panel = ParameterPanel::new(config);

    let curve = calibration::run_sweep(&mut panel);
    assert_eq!(curve.len(), 3);
    assert!(curve.max_deviation().unwrap() < 0.1);

    let path = std::env::temp_dir().join("film_bar_sim_calibration.png");
    export::export_calibration_graph(&path, &panel.config().graph, &curve).unwrap();
    assert!(path.exists());
    let _ = std::fs::remove_file(&path);

    let csv = export::calibration_csv(&curve);
    assert_eq!(csv.lines().count(), 4);
}
