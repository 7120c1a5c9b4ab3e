//! Fault-location result types.

use serde::{Deserialize, Serialize};

use crate::error::FlareError;
use crate::fault::Confidence;

/// The closed set of single-ended location methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMethod {
    Reactance,
    Takagi,
    ModifiedTakagi,
    TwoEnd,
}

impl LocationMethod {
    pub const ALL: [LocationMethod; 4] = [
        LocationMethod::Reactance,
        LocationMethod::Takagi,
        LocationMethod::ModifiedTakagi,
        LocationMethod::TwoEnd,
    ];

    /// Stable identifier used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationMethod::Reactance => "reactance",
            LocationMethod::Takagi => "takagi",
            LocationMethod::ModifiedTakagi => "modified_takagi",
            LocationMethod::TwoEnd => "two_end",
        }
    }

    /// Human-readable method name.
    pub fn display_name(&self) -> &'static str {
        match self {
            LocationMethod::Reactance => "Simple reactance",
            LocationMethod::Takagi => "Takagi",
            LocationMethod::ModifiedTakagi => "Modified Takagi",
            LocationMethod::TwoEnd => "Two-end (estimated)",
        }
    }
}

impl std::fmt::Display for LocationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocationMethod {
    type Err = FlareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reactance" => Ok(LocationMethod::Reactance),
            "takagi" => Ok(LocationMethod::Takagi),
            "modified_takagi" => Ok(LocationMethod::ModifiedTakagi),
            "two_end" => Ok(LocationMethod::TwoEnd),
            other => Err(FlareError::Parse(format!("unknown location method: {other}"))),
        }
    }
}

/// Distance-to-fault estimate from one method.
///
/// `distance_km` is always clamped to `[0, line_length]`; when the raw
/// estimate fell outside the line the confidence is forced to Low but the
/// clamped value is still reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationResult {
    pub method: LocationMethod,
    /// Distance along the line, km, clamped to [0, line_length]
    pub distance_km: f64,
    /// Distance as a percentage of line length, 0–100
    pub distance_pct: f64,
    /// Fault-loop impedance, resistive part (Ω)
    pub zf_r: f64,
    /// Fault-loop impedance, reactive part (Ω)
    pub zf_x: f64,
    /// Fault-loop impedance magnitude (Ω)
    pub zf_mag: f64,
    /// Estimated fault resistance (Ω)
    pub rf: f64,
    pub confidence: Confidence,
}

impl LocationResult {
    /// Build a result from a raw (possibly out-of-line) distance estimate.
    ///
    /// Clamps to `[0, line_length]`, computes the percentage, and forces
    /// confidence to Low when the raw distance fell outside the line (a
    /// symptom of remote infeed or parameter mismatch).
    pub fn from_raw(
        method: LocationMethod,
        raw_distance_km: f64,
        line_length_km: f64,
        zf_r: f64,
        zf_x: f64,
        rf: f64,
        confidence: Confidence,
    ) -> Self {
        let out_of_range = raw_distance_km < 0.0 || raw_distance_km > line_length_km;
        let distance_km = raw_distance_km.clamp(0.0, line_length_km);
        let distance_pct = (100.0 * distance_km / line_length_km).clamp(0.0, 100.0);
        Self {
            method,
            distance_km,
            distance_pct,
            zf_r,
            zf_x,
            zf_mag: (zf_r * zf_r + zf_x * zf_x).sqrt(),
            rf,
            confidence: if out_of_range { Confidence::Low } else { confidence },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_identifiers() {
        assert_eq!(LocationMethod::ModifiedTakagi.as_str(), "modified_takagi");
        assert_eq!("two_end".parse::<LocationMethod>().unwrap(), LocationMethod::TwoEnd);
        assert!("three_end".parse::<LocationMethod>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&LocationMethod::ModifiedTakagi).unwrap();
        assert_eq!(json, "\"modified_takagi\"");
    }

    #[test]
    fn test_from_raw_in_range() {
        let r = LocationResult::from_raw(
            LocationMethod::Takagi,
            30.0,
            50.0,
            2.5,
            11.8,
            5.0,
            Confidence::High,
        );
        assert_eq!(r.distance_km, 30.0);
        assert!((r.distance_pct - 60.0).abs() < 1e-9);
        assert_eq!(r.confidence, Confidence::High);
        assert!((r.zf_mag - (2.5f64 * 2.5 + 11.8 * 11.8).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_from_raw_clamps_and_degrades() {
        let over = LocationResult::from_raw(
            LocationMethod::Reactance,
            62.0,
            50.0,
            1.0,
            25.0,
            0.0,
            Confidence::Medium,
        );
        assert_eq!(over.distance_km, 50.0);
        assert_eq!(over.distance_pct, 100.0);
        assert_eq!(over.confidence, Confidence::Low);

        let under = LocationResult::from_raw(
            LocationMethod::TwoEnd,
            -4.0,
            50.0,
            0.0,
            0.0,
            0.0,
            Confidence::Low,
        );
        assert_eq!(under.distance_km, 0.0);
        assert_eq!(under.distance_pct, 0.0);
        assert_eq!(under.confidence, Confidence::Low);
    }
}
