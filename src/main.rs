//! Film Bar Simulation
//!
//! Headless driver: runs one simulation or a calibration sweep, logs the
//! readout and optionally exports the graph.

use std::path::PathBuf;

use clap::Parser;

use film_bar_sim::config::SimulationConfig;
use film_bar_sim::export::{self, ExportError};
use film_bar_sim::physics::calibration;
use film_bar_sim::physics::integrator::TIME_LIMIT;
use film_bar_sim::physics::{BarSimulator, Parameter, ParameterPanel, ParameterSource, Readout};

/// Bar floating on a soap film, held down by springs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override surface tension (mN/mm)
    #[arg(long)]
    surface_tension: Option<f64>,

    /// Override spring constant (mN/mm)
    #[arg(long)]
    spring_constant: Option<f64>,

    /// Override bar mass (kg)
    #[arg(long)]
    mass: Option<f64>,

    /// Override time step (s)
    #[arg(long)]
    dt: Option<f64>,

    /// Override bar/frame clearance (mm)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Override surface tension offset from the bar centre (mm)
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Override dynamic friction coefficient
    #[arg(long)]
    friction: Option<f64>,

    /// Override translational damping coefficient
    #[arg(long)]
    damping: Option<f64>,

    /// Override spring rest position / bottom stop (mm)
    #[arg(long)]
    rest_position: Option<f64>,

    /// Sweep the spring constant instead of running a single trace
    #[arg(long)]
    calibrate: bool,

    /// Write the graph to this PNG file
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Write the samples to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the effective configuration to this JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> [(Parameter, Option<f64>); 9] {
        [
            (Parameter::SurfaceTension, self.surface_tension),
            (Parameter::SpringConstant, self.spring_constant),
            (Parameter::TimeStep, self.dt),
            (Parameter::BarMass, self.mass),
            (Parameter::Tolerance, self.tolerance),
            (Parameter::OffsetDistance, self.offset),
            (Parameter::DynamicFriction, self.friction),
            (Parameter::Damping, self.damping),
            (Parameter::RestPosition, self.rest_position),
        ]
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = if let Some(ref path) = args.config {
        match SimulationConfig::from_file(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                SimulationConfig::default()
            }
        }
    } else {
        SimulationConfig::default()
    };

    let mut panel = ParameterPanel::new(config);
    for (parameter, value) in args.overrides() {
        if let Some(value) = value {
            panel.set(parameter, value);
        }
    }

    if let Some(ref path) = args.save_config {
        match panel.config().to_file(path) {
            Ok(()) => log::info!("Saved config to {}", path.display()),
            Err(e) => log::error!("{}", e),
        }
    }

    let result = if args.calibrate {
        run_calibration(&mut panel, &args)
    } else {
        run_trace(&panel, &args)
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run_trace(panel: &ParameterPanel, args: &Args) -> Result<(), ExportError> {
    let config = panel.config();
    let derived = panel.derived();
    log::info!(
        "Starting simulation: gamma={} mN/mm, k={} mN/mm, m={} kg, dt={} s",
        config.film.surface_tension,
        config.spring.spring_constant,
        config.bar.mass,
        config.dt
    );
    match derived.equilibrium_position {
        Some(equilibrium) => log::info!("Equilibrium position: {:.2} mm", equilibrium),
        None => log::info!("No equilibrium: springs have no stiffness"),
    }

    let mut simulator = BarSimulator::new(config);
    simulator.start();

    // Log roughly ten readouts per simulated second
    let report_every = ((0.1 / config.dt).round() as usize).max(1);
    let max_steps = (TIME_LIMIT / config.dt).ceil() as usize + 16;
    let mut steps = 0;
    while simulator.is_running() && steps < max_steps {
        simulator.step(panel);
        steps += 1;
        if steps % report_every == 0 {
            log::debug!("{}", Readout::capture(simulator.state(), &derived));
        }
    }

    let reason = simulator
        .stop_reason()
        .map_or_else(|| "step cap".to_string(), |reason| reason.to_string());
    log::info!("Run stopped after {} steps ({})", steps, reason);
    for line in Readout::capture(simulator.state(), &derived).lines() {
        log::info!("{}", line);
    }

    if let Some(ref path) = args.graph {
        export::export_trace_graph(
            path,
            &config.graph,
            simulator.history(),
            derived.equilibrium_position,
        )?;
    }
    if let Some(ref path) = args.csv {
        export::export_csv(path, &export::trace_csv(simulator.history()))?;
    }
    Ok(())
}

fn run_calibration(panel: &mut ParameterPanel, args: &Args) -> Result<(), ExportError> {
    let curve = calibration::run_sweep_with_progress(panel, |sample| {
        let equilibrium = sample
            .equilibrium_position
            .map_or_else(|| "n/a".to_string(), |value| format!("{:.2} mm", value));
        log::info!(
            "k={:.2}: y={:.2} mm, equilibrium {}",
            sample.spring_constant,
            sample.final_position,
            equilibrium
        );
    });

    if let Some(deviation) = curve.max_deviation() {
        log::info!("Largest deviation from equilibrium: {:.3} mm", deviation);
    }

    let config = panel.config();
    if let Some(ref path) = args.graph {
        export::export_calibration_graph(path, &config.graph, &curve)?;
    }
    if let Some(ref path) = args.csv {
        export::export_csv(path, &export::calibration_csv(&curve))?;
    }
    Ok(())
}
