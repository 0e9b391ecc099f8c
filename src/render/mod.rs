//! Rendering modules
//!
//! Rasterizes the strip chart and calibration curve into RGBA buffers
//! without a window or GPU.

pub mod graph;

pub use graph::GraphRenderer;
