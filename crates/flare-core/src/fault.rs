//! Fault classification types.

use serde::{Deserialize, Serialize};

use crate::error::FlareError;
use crate::record::{FaultWindow, Phase};

/// The closed set of transmission-line fault types.
///
/// Single-phase-to-ground, phase-to-phase, double-phase-to-ground,
/// three-phase, and three-phase-to-ground, plus `Unknown` when the record
/// shows no classifiable disturbance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultType {
    #[serde(rename = "AG")]
    Ag,
    #[serde(rename = "BG")]
    Bg,
    #[serde(rename = "CG")]
    Cg,
    #[serde(rename = "AB")]
    Ab,
    #[serde(rename = "BC")]
    Bc,
    #[serde(rename = "CA")]
    Ca,
    #[serde(rename = "ABG")]
    Abg,
    #[serde(rename = "BCG")]
    Bcg,
    #[serde(rename = "CAG")]
    Cag,
    #[serde(rename = "ABC")]
    Abc,
    #[serde(rename = "ABCG")]
    Abcg,
    Unknown,
}

impl FaultType {
    /// Phases involved in the fault, in phase order.
    pub fn phases(&self) -> &'static [Phase] {
        match self {
            FaultType::Ag => &[Phase::A],
            FaultType::Bg => &[Phase::B],
            FaultType::Cg => &[Phase::C],
            FaultType::Ab | FaultType::Abg => &[Phase::A, Phase::B],
            FaultType::Bc | FaultType::Bcg => &[Phase::B, Phase::C],
            FaultType::Ca | FaultType::Cag => &[Phase::C, Phase::A],
            FaultType::Abc | FaultType::Abcg => &[Phase::A, Phase::B, Phase::C],
            FaultType::Unknown => &[],
        }
    }

    /// Whether the fault path includes ground.
    pub fn involves_ground(&self) -> bool {
        matches!(
            self,
            FaultType::Ag
                | FaultType::Bg
                | FaultType::Cg
                | FaultType::Abg
                | FaultType::Bcg
                | FaultType::Cag
                | FaultType::Abcg
        )
    }

    /// Whether a fault-loop for impedance-based location exists.
    pub fn locatable(&self) -> bool {
        !matches!(self, FaultType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultType::Ag => "AG",
            FaultType::Bg => "BG",
            FaultType::Cg => "CG",
            FaultType::Ab => "AB",
            FaultType::Bc => "BC",
            FaultType::Ca => "CA",
            FaultType::Abg => "ABG",
            FaultType::Bcg => "BCG",
            FaultType::Cag => "CAG",
            FaultType::Abc => "ABC",
            FaultType::Abcg => "ABCG",
            FaultType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for FaultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FaultType {
    type Err = FlareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AG" => Ok(FaultType::Ag),
            "BG" => Ok(FaultType::Bg),
            "CG" => Ok(FaultType::Cg),
            "AB" => Ok(FaultType::Ab),
            "BC" => Ok(FaultType::Bc),
            "CA" => Ok(FaultType::Ca),
            "ABG" => Ok(FaultType::Abg),
            "BCG" => Ok(FaultType::Bcg),
            "CAG" => Ok(FaultType::Cag),
            "ABC" => Ok(FaultType::Abc),
            "ABCG" => Ok(FaultType::Abcg),
            "UNKNOWN" => Ok(FaultType::Unknown),
            other => Err(FlareError::Parse(format!("unknown fault type: {other}"))),
        }
    }
}

/// Confidence in a classification or location result.
///
/// Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }

    /// The lower of two confidence levels.
    pub fn degrade_to(self, other: Confidence) -> Confidence {
        self.min(other)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The detector's verdict for one record. Created once; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultClassification {
    pub fault_type: FaultType,
    /// Phases with current or voltage evidence of involvement
    pub phases: Vec<Phase>,
    /// Disturbance interval, absent when no threshold crossing occurred
    pub window: Option<FaultWindow>,
    /// Fault onset relative to record start, in milliseconds
    pub onset_ms: Option<f64>,
    /// Fault clearing relative to record start, in milliseconds
    pub clear_ms: Option<f64>,
    /// Fault duration in milliseconds
    pub duration_ms: Option<f64>,
    pub confidence: Confidence,
}

impl FaultClassification {
    /// The no-disturbance verdict: Unknown, Low confidence, no window.
    pub fn unknown() -> Self {
        Self {
            fault_type: FaultType::Unknown,
            phases: Vec::new(),
            window: None,
            onset_ms: None,
            clear_ms: None,
            duration_ms: None,
            confidence: Confidence::Low,
        }
    }

    /// Involved phases as a compact display string, e.g. "A,B".
    pub fn phases_display(&self) -> String {
        if self.phases.is_empty() {
            "—".to_string()
        } else {
            self.phases
                .iter()
                .map(Phase::as_str)
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}
