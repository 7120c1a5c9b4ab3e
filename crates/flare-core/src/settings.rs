//! Operator-supplied analysis configuration.
//!
//! Everything the operator enters for a run travels in one explicit value
//! threaded through the pipeline call; nothing is read from ambient state,
//! so each analysis run is side-effect-free and safely parallelizable.

use serde::{Deserialize, Serialize};

use crate::error::{FlareError, FlareResult};
use crate::units::Kilometers;

/// Per-run operator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// CT ratio: amps primary per 1 A secondary. Scales current channels.
    pub ct_ratio: f64,
    /// VT ratio: volts primary per 115 V secondary base. Scales voltage channels.
    pub vt_ratio: f64,
    /// Line-type identifier resolved through the line parameter provider.
    pub line_type: String,
    /// Total line length; bounds and denominates all distance outputs.
    pub line_length: Kilometers,
}

impl AnalysisSettings {
    pub fn new(
        ct_ratio: f64,
        vt_ratio: f64,
        line_type: impl Into<String>,
        line_length: Kilometers,
    ) -> FlareResult<Self> {
        if ct_ratio <= 0.0 {
            return Err(FlareError::Config(format!(
                "CT ratio must be > 0, got {ct_ratio}"
            )));
        }
        if vt_ratio <= 0.0 {
            return Err(FlareError::Config(format!(
                "VT ratio must be > 0, got {vt_ratio}"
            )));
        }
        if line_length.value() <= 0.0 {
            return Err(FlareError::Config(format!(
                "line length must be > 0 km, got {}",
                line_length.value()
            )));
        }
        Ok(Self {
            ct_ratio,
            vt_ratio,
            line_type: line_type.into(),
            line_length,
        })
    }
}
