//! Line impedance parameters and the provider seam.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::FlareResult;

/// Per-kilometer sequence impedances of one transmission-line construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineParameters {
    /// Positive-sequence impedance per kilometer (Ω/km)
    pub z1_per_km: Complex64,
    /// Zero-sequence impedance per kilometer (Ω/km)
    pub z0_per_km: Complex64,
    /// Thermal ampacity (A)
    pub ampacity_a: f64,
}

impl LineParameters {
    pub fn new(z1_r: f64, z1_x: f64, z0_r: f64, z0_x: f64, ampacity_a: f64) -> Self {
        Self {
            z1_per_km: Complex64::new(z1_r, z1_x),
            z0_per_km: Complex64::new(z0_r, z0_x),
            ampacity_a,
        }
    }

    /// Zero-sequence compensation factor k0 = (Z0 − Z1) / (3·Z1).
    ///
    /// Scales the residual current in ground-fault loop measurements.
    pub fn k0(&self) -> Complex64 {
        (self.z0_per_km - self.z1_per_km) / (3.0 * self.z1_per_km)
    }
}

/// Source of per-kilometer line parameters for a named line type.
///
/// Injected into the locator so that adding a line type never touches
/// location logic. A missing entry must surface as
/// [`FlareError::UnsupportedLineType`](crate::FlareError::UnsupportedLineType),
/// never a silent default.
pub trait LineParameterProvider {
    fn line_parameters(&self, line_type: &str) -> FlareResult<LineParameters>;

    /// Known line-type identifiers, for listings and error messages.
    fn line_types(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k0() {
        // 69 kV ACSR line constants
        let lp = LineParameters::new(0.0839, 0.3927, 0.2530, 1.1780, 659.0);
        let k0 = lp.k0();
        // (Z0 - Z1) / (3 Z1) for these constants is ~0.666 at ~0 degrees
        assert!((k0.norm() - 0.666).abs() < 0.01);
        assert!(k0.arg().abs() < 0.01);
    }

    #[test]
    fn test_k0_zero_when_sequences_equal() {
        let lp = LineParameters::new(0.1, 0.4, 0.1, 0.4, 400.0);
        assert!(lp.k0().norm() < 1e-12);
    }
}
