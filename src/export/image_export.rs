//! PNG export of rendered graphs

use std::path::{Path, PathBuf};

use crate::config::GraphParameters;
use crate::physics::calibration::CalibrationCurve;
use crate::physics::history::PositionHistory;
use crate::render::GraphRenderer;

/// Errors that can occur during export
#[derive(Debug)]
pub enum ExportError {
    /// Pixel data does not fit the requested image
    BufferCreation(String),
    /// Failed to encode or write the image file
    Save {
        path: PathBuf,
        error: image::ImageError,
    },
    /// Invalid dimensions
    InvalidDimensions { width: u32, height: u32 },
    /// Failed to write a text export
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::BufferCreation(msg) => write!(f, "Failed to create image buffer: {}", msg),
            ExportError::Save { path, error } => {
                write!(f, "Failed to save image '{}': {}", path.display(), error)
            }
            ExportError::InvalidDimensions { width, height } => {
                write!(f, "Invalid dimensions: {}x{}", width, height)
            }
            ExportError::Io { path, error } => {
                write!(f, "Failed to write '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Save { error, .. } => Some(error),
            ExportError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Export raw RGBA pixel data to a PNG file
///
/// # Arguments
/// * `path` - Output file path
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `data` - RGBA u8 pixel data (length must be width * height * 4)
pub fn export_frame<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<(), ExportError> {
    if width == 0 || height == 0 {
        return Err(ExportError::InvalidDimensions { width, height });
    }

    let expected_len = width as usize * height as usize * 4;
    if data.len() != expected_len {
        return Err(ExportError::BufferCreation(format!(
            "Data length {} doesn't match expected {} ({}x{}x4)",
            data.len(),
            expected_len,
            width,
            height
        )));
    }

    let image = image::RgbaImage::from_raw(width, height, data.to_vec()).ok_or_else(|| {
        ExportError::BufferCreation("Failed to create image buffer from raw data".to_string())
    })?;

    image.save(path.as_ref()).map_err(|error| ExportError::Save {
        path: path.as_ref().to_path_buf(),
        error,
    })?;

    log::info!("Exported {}x{} graph to {}", width, height, path.as_ref().display());
    Ok(())
}

/// Render the position trace and save it as PNG.
pub fn export_trace_graph<P: AsRef<Path>>(
    path: P,
    graph: &GraphParameters,
    history: &PositionHistory,
    equilibrium: Option<f64>,
) -> Result<(), ExportError> {
    let renderer = GraphRenderer::new(graph);
    let (width, height) = renderer.size();
    let pixels = renderer.render_trace(history, equilibrium);
    export_frame(path, width, height, &pixels)
}

/// Render a calibration curve and save it as PNG.
pub fn export_calibration_graph<P: AsRef<Path>>(
    path: P,
    graph: &GraphParameters,
    curve: &CalibrationCurve,
) -> Result<(), ExportError> {
    let renderer = GraphRenderer::new(graph);
    let (width, height) = renderer.size();
    let pixels = renderer.render_calibration(curve);
    export_frame(path, width, height, &pixels)
}
