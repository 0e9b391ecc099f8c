//! Export modules
//!
//! Handles graph and sample export:
//! - Image: PNG export of rendered graphs
//! - CSV: position traces and calibration curves as text

pub mod image_export;
pub mod csv_export;

pub use image_export::{ExportError, export_calibration_graph, export_frame, export_trace_graph};
pub use csv_export::{calibration_csv, export_csv, trace_csv};
