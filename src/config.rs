//! Configuration module for the film bar simulation parameters.
//!
//! Lengths are in millimetres, masses in kilograms and times in seconds, so
//! forces come out in kg*mm/s^2 and gravity is 9810 mm/s^2.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Properties of the liquid film pulling the bar upward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmParameters {
    /// Surface tension of the film (mN/mm)
    pub surface_tension: f64,
}

impl Default for FilmParameters {
    fn default() -> Self {
        Self {
            surface_tension: 50e-3,
        }
    }
}

/// The pair of springs holding the bar down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringParameters {
    /// Stiffness of each spring (mN/mm)
    pub spring_constant: f64,

    /// Horizontal distance of each spring from the bar centre (mm)
    #[serde(default = "default_spring_separation")]
    pub separation: f64,

    /// Rest position of the springs, also the bottom stop of the bar (mm)
    #[serde(default)]
    pub rest_position: f64,
}

fn default_spring_separation() -> f64 {
    50.0
}

impl Default for SpringParameters {
    fn default() -> Self {
        Self {
            spring_constant: 0.45,
            separation: default_spring_separation(),
            rest_position: 0.0,
        }
    }
}

/// Mass and geometry of the floating bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarParameters {
    /// Mass of the bar (kg)
    pub mass: f64,

    /// Bar width, equal to the inner width of the frame (mm)
    #[serde(default = "default_bar_width")]
    pub width: f64,

    /// Bar thickness (mm)
    #[serde(default = "default_bar_thickness")]
    pub thickness: f64,

    /// Clearance between the bar ends and the frame (mm)
    pub tolerance: f64,

    /// Offset of the surface tension resultant from the bar centre (mm)
    pub offset_distance: f64,

    /// Extra length added to the width in the moment of inertia (mm)
    #[serde(default = "default_inertia_padding")]
    pub inertia_padding: f64,
}

fn default_bar_width() -> f64 {
    150.0
}

fn default_bar_thickness() -> f64 {
    2.0
}

fn default_inertia_padding() -> f64 {
    10.0
}

impl Default for BarParameters {
    fn default() -> Self {
        Self {
            mass: 0.000383,
            width: default_bar_width(),
            thickness: default_bar_thickness(),
            tolerance: 2.0,
            offset_distance: -20.0,
            inertia_padding: default_inertia_padding(),
        }
    }
}

/// Dissipation acting on the bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrictionParameters {
    /// Dry friction coefficient applied while the bar is pinned at the contact limit
    pub dynamic_coefficient: f64,

    /// Viscous damping coefficient for translation
    pub damping_coefficient: f64,
}

impl Default for FrictionParameters {
    fn default() -> Self {
        Self {
            dynamic_coefficient: 0.35,
            damping_coefficient: 0.05,
        }
    }
}

/// The rectangular frame the film is stretched across.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameParameters {
    /// Inner height of the frame (mm)
    pub height: f64,
}

impl Default for FrameParameters {
    fn default() -> Self {
        Self { height: 200.0 }
    }
}

/// Environmental conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentParameters {
    /// Gravitational acceleration in mm/s^2
    pub gravity: f64,
}

impl Default for EnvironmentParameters {
    fn default() -> Self {
        Self { gravity: 9810.0 }
    }
}

/// Strip chart window for the position trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphParameters {
    /// Width of the plot area in pixels
    #[serde(default = "default_graph_width")]
    pub width: u32,

    /// Height of the plot area in pixels
    #[serde(default = "default_graph_height")]
    pub height: u32,

    /// Pixels per history sample
    #[serde(default = "default_x_scale")]
    pub x_scale: f64,

    /// Pixels per millimetre of bar position
    #[serde(default = "default_y_scale")]
    pub y_scale: f64,

    /// Tick spacing on both axes in pixels
    #[serde(default = "default_tick_spacing")]
    pub tick_spacing: u32,
}

fn default_graph_width() -> u32 {
    400
}

fn default_graph_height() -> u32 {
    150
}

fn default_x_scale() -> f64 {
    1.0
}

fn default_y_scale() -> f64 {
    0.5
}

fn default_tick_spacing() -> u32 {
    20
}

impl Default for GraphParameters {
    fn default() -> Self {
        Self {
            width: default_graph_width(),
            height: default_graph_height(),
            x_scale: default_x_scale(),
            y_scale: default_y_scale(),
            tick_spacing: default_tick_spacing(),
        }
    }
}

impl GraphParameters {
    /// Number of position samples that fit in the plot width.
    pub fn history_capacity(&self) -> usize {
        if self.x_scale <= 0.0 {
            return self.width as usize;
        }
        (self.width as f64 / self.x_scale).floor().max(1.0) as usize
    }
}

/// Spring constant range covered by a calibration sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationParameters {
    /// First spring constant (mN/mm)
    #[serde(default = "default_calibration_start")]
    pub start: f64,

    /// Last spring constant, inclusive (mN/mm)
    #[serde(default = "default_calibration_end")]
    pub end: f64,

    /// Spring constant increment between runs (mN/mm)
    #[serde(default = "default_calibration_increment")]
    pub increment: f64,
}

fn default_calibration_start() -> f64 {
    0.05
}

fn default_calibration_end() -> f64 {
    1.0
}

fn default_calibration_increment() -> f64 {
    0.05
}

impl Default for CalibrationParameters {
    fn default() -> Self {
        Self {
            start: default_calibration_start(),
            end: default_calibration_end(),
            increment: default_calibration_increment(),
        }
    }
}

/// Complete simulation configuration combining all parameter groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Liquid film properties
    pub film: FilmParameters,

    /// Spring stiffness and placement
    pub spring: SpringParameters,

    /// Bar mass and geometry
    pub bar: BarParameters,

    /// Damping and contact friction
    pub friction: FrictionParameters,

    /// Frame dimensions
    #[serde(default)]
    pub frame: FrameParameters,

    /// Environmental conditions
    #[serde(default)]
    pub environment: EnvironmentParameters,

    /// Strip chart layout
    #[serde(default)]
    pub graph: GraphParameters,

    /// Calibration sweep range
    #[serde(default)]
    pub calibration: CalibrationParameters,

    /// Simulation time step in seconds
    pub dt: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            film: FilmParameters::default(),
            spring: SpringParameters::default(),
            bar: BarParameters::default(),
            friction: FrictionParameters::default(),
            frame: FrameParameters::default(),
            environment: EnvironmentParameters::default(),
            graph: GraphParameters::default(),
            calibration: CalibrationParameters::default(),
            dt: 0.001, // 1 ms time step
        }
    }
}

impl SimulationConfig {
    /// Read a simulation config from JSON.
    ///
    /// Groups and fields missing from the file take their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })?;
        log::debug!("Read config from {}: dt={} s", path.display(), config.dt);
        Ok(config)
    }

    /// Write the config as pretty-printed JSON, e.g. to replay a CLI run.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Encode)?;
        fs::write(path, contents).map_err(|error| ConfigError::Write {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Upward pull of the film on both faces of the bar.
    pub fn surface_tension_force(&self) -> f64 {
        2.0 * self.bar.width * self.film.surface_tension
    }

    /// Weight of the bar.
    pub fn bar_weight(&self) -> f64 {
        self.bar.mass * self.environment.gravity
    }

    /// Highest position the bar can reach inside the frame (mm).
    pub fn upper_travel_limit(&self) -> f64 {
        self.frame.height - self.bar.thickness
    }
}

/// Failure to load or save a simulation config.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be opened or read
    Read {
        path: std::path::PathBuf,
        error: std::io::Error,
    },
    /// Config file could not be written
    Write {
        path: std::path::PathBuf,
        error: std::io::Error,
    },
    /// File is not a valid simulation config
    Parse {
        path: std::path::PathBuf,
        error: serde_json::Error,
    },
    /// Config could not be encoded as JSON
    Encode(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, error } => {
                write!(f, "Cannot read simulation config {}: {}", path.display(), error)
            }
            ConfigError::Write { path, error } => {
                write!(f, "Cannot write simulation config {}: {}", path.display(), error)
            }
            ConfigError::Parse { path, error } => {
                write!(f, "Invalid simulation config {}: {}", path.display(), error)
            }
            ConfigError::Encode(error) => write!(f, "Cannot encode simulation config: {}", error),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { error, .. } | ConfigError::Write { error, .. } => Some(error),
            ConfigError::Parse { error, .. } | ConfigError::Encode(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!((config.film.surface_tension - 0.05).abs() < f64::EPSILON);
        assert!((config.spring.spring_constant - 0.45).abs() < f64::EPSILON);
        assert!((config.bar.mass - 0.000383).abs() < f64::EPSILON);
        assert!((config.environment.gravity - 9810.0).abs() < f64::EPSILON);
        assert!((config.dt - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_surface_tension_force() {
        let config = SimulationConfig::default();
        // 2 * 150 mm * 0.05 mN/mm
        assert!((config.surface_tension_force() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_upper_travel_limit() {
        let config = SimulationConfig::default();
        assert!((config.upper_travel_limit() - 198.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_capacity() {
        let mut graph = GraphParameters::default();
        assert_eq!(graph.history_capacity(), 400);

        graph.x_scale = 2.0;
        assert_eq!(graph.history_capacity(), 200);
    }

    #[test]
    fn test_optional_groups_fall_back_to_defaults() {
        let json = r#"{
            "film": { "surface_tension": 0.04 },
            "spring": { "spring_constant": 0.3 },
            "bar": { "mass": 0.0005, "tolerance": 1.0, "offset_distance": 0.0 },
            "friction": { "dynamic_coefficient": 0.2, "damping_coefficient": 0.1 },
            "dt": 0.0005
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();

        assert!((config.bar.width - 150.0).abs() < f64::EPSILON);
        assert!((config.spring.separation - 50.0).abs() < f64::EPSILON);
        assert!((config.frame.height - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.graph.width, 400);
        assert!((config.calibration.end - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join("film_bar_sim_config_roundtrip.json");
        let mut config = SimulationConfig::default();
        config.spring.spring_constant = 0.6;
        config.to_file(&path).unwrap();

        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert!((loaded.spring.spring_constant - 0.6).abs() < f64::EPSILON);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let result = SimulationConfig::from_file("/nonexistent/film_bar.json");
        match result {
            Err(ConfigError::Read { path, .. }) => {
                assert!(path.ends_with("film_bar.json"));
            }
            other => panic!("expected Read error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_names_the_file() {
        let path = std::env::temp_dir().join("film_bar_sim_invalid_config.json");
        fs::write(&path, "{ \"dt\": ").unwrap();

        let error = SimulationConfig::from_file(&path).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().starts_with("Invalid simulation config"));
        assert!(std::error::Error::source(&error).is_some());

        let _ = fs::remove_file(&path);
    }
}
