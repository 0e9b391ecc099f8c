//! CSV export of simulation samples

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::image_export::ExportError;
use crate::physics::calibration::CalibrationCurve;
use crate::physics::history::PositionHistory;

/// Format the history window as `time_s,position_mm` rows.
pub fn trace_csv(history: &PositionHistory) -> String {
    let mut out = String::from("time_s,position_mm\n");
    for sample in history.samples() {
        let _ = writeln!(out, "{:.6},{:.6}", sample.time, sample.position);
    }
    out
}

/// Format a calibration curve, one row per spring constant.
///
/// The equilibrium column is left empty when the springs have no stiffness.
pub fn calibration_csv(curve: &CalibrationCurve) -> String {
    let mut out =
        String::from("spring_constant,final_position_mm,equilibrium_position_mm,stop_reason\n");
    for sample in curve.samples() {
        let equilibrium = sample
            .equilibrium_position
            .map(|value| format!("{:.6}", value))
            .unwrap_or_default();
        let reason = sample
            .stop_reason
            .map(|reason| reason.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:.4},{:.6},{},{}",
            sample.spring_constant, sample.final_position, equilibrium, reason
        );
    }
    out
}

/// Write CSV text to a file.
pub fn export_csv<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), ExportError> {
    fs::write(path.as_ref(), contents).map_err(|error| ExportError::Io {
        path: path.as_ref().to_path_buf(),
        error,
    })?;
    log::info!("Exported samples to {}", path.as_ref().display());
    Ok(())
}
