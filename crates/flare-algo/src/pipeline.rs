//! The one-shot analysis pipeline.
//!
//! Loader → detector → phasor engine → locator, each stage consuming the
//! complete output of the previous one. One call analyzes one record;
//! independent runs share nothing and may execute on independent threads.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use flare_core::{
    FaultClassification, FlareResult, Kilometers, LineParameters, LocationMethod, LocationResult,
    PhasorSet, Record, SymmetricalComponents,
};

use crate::detector::{DetectorConfig, FaultDetector};
use crate::locator::{recommended_method, FaultLocator};
use crate::phasor::{symmetrical_components, PhasorEngine};

/// Record metadata surfaced to presentation collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    /// Recorder trigger time
    pub timestamp: NaiveDateTime,
    pub sample_rate_hz: f64,
    pub nominal_freq_hz: f64,
    pub n_samples: usize,
    pub duration_ms: f64,
}

impl RecordSummary {
    pub fn of(record: &Record) -> Self {
        Self {
            timestamp: record.trigger_time(),
            sample_rate_hz: record.sample_rate().value(),
            nominal_freq_hz: record.nominal_freq().value(),
            n_samples: record.n_samples(),
            duration_ms: record.duration_ms().value(),
        }
    }
}

/// Everything one analysis run produces. Read-only for consumers; the
/// presentation layer must not mutate it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub record: RecordSummary,
    pub classification: FaultClassification,
    /// One result per applicable method; empty for Unknown classifications
    pub locations: BTreeMap<LocationMethod, LocationResult>,
    /// Takagi when available, else the reactance estimate
    pub recommended: Option<LocationMethod>,
    /// Fault-window symmetrical components, absent without a fault window
    pub symmetrical: Option<SymmetricalComponents>,
    pub prefault_phasors: Option<PhasorSet>,
    pub fault_phasors: Option<PhasorSet>,
}

impl AnalysisReport {
    /// The recommended location result, when any method applied.
    pub fn recommended_result(&self) -> Option<&LocationResult> {
        self.recommended.and_then(|m| self.locations.get(&m))
    }
}

/// Configured pipeline front-end.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    detector: FaultDetector,
}

impl Analyzer {
    pub fn new(detector_config: DetectorConfig) -> Self {
        Self {
            detector: FaultDetector::new(detector_config),
        }
    }

    /// Analyze one record against one line.
    ///
    /// Insufficient data never fails the run: the report degrades to an
    /// Unknown/Low classification with no location entries. Parse and
    /// configuration failures happen before this point, in the loader.
    pub fn analyze(
        &self,
        record: &Record,
        line: &LineParameters,
        line_length: Kilometers,
    ) -> FlareResult<AnalysisReport> {
        let classification = self.detector.classify(record);

        let mut locations = BTreeMap::new();
        let mut symmetrical = None;
        let mut prefault_phasors = None;
        let mut fault_phasors = None;

        if let Some(window) = classification.window {
            let engine = PhasorEngine::new(record);
            match engine.extract(record, &window) {
                Ok(phasors) => {
                    symmetrical = Some(symmetrical_components(&phasors.fault));
                    if classification.fault_type.locatable() {
                        locations = FaultLocator::new().locate_all(
                            &classification,
                            &phasors.fault,
                            phasors.prefault.as_ref(),
                            line,
                            line_length,
                        );
                    }
                    prefault_phasors = phasors.prefault;
                    fault_phasors = Some(phasors.fault);
                }
                // A window the detector accepted but the engine cannot
                // fill a cycle from: report the classification, skip the
                // frequency-domain outputs.
                Err(_) => {}
            }
        }

        let recommended = recommended_method(&locations);

        Ok(AnalysisReport {
            record: RecordSummary::of(record),
            classification,
            locations,
            recommended,
            symmetrical,
            prefault_phasors,
            fault_phasors,
        })
    }
}

/// Analyze with default detector thresholds.
pub fn analyze(
    record: &Record,
    line: &LineParameters,
    line_length: Kilometers,
) -> FlareResult<AnalysisReport> {
    Analyzer::default().analyze(record, line, line_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::SyntheticFault;
    use flare_core::{Confidence, FaultType, Phase};

    fn line_69kv() -> LineParameters {
        LineParameters::new(0.0839, 0.3927, 0.2530, 1.1780, 659.0)
    }

    #[test]
    fn test_end_to_end_ag_scenario() {
        // 50 km line, AG fault at 60% (30 km) through 5 Ω, onset 50 ms,
        // 3840 Hz for 200 ms
        let record = SyntheticFault::ag().build();
        let report = analyze(&record, &line_69kv(), Kilometers(50.0)).unwrap();

        assert_eq!(report.classification.fault_type, FaultType::Ag);
        assert_eq!(report.classification.phases, vec![Phase::A]);
        assert_eq!(report.classification.confidence, Confidence::High);

        let takagi = &report.locations[&LocationMethod::Takagi];
        assert!(
            (takagi.distance_km - 30.0).abs() <= 3.0,
            "Takagi estimate {} km outside ±10% of 30 km",
            takagi.distance_km
        );
        assert_eq!(report.recommended, Some(LocationMethod::Takagi));
        assert!((report.recommended_result().unwrap().distance_km - takagi.distance_km).abs() < 1e-12);

        // Every method stays on the line
        for r in report.locations.values() {
            assert!(r.distance_km >= 0.0 && r.distance_km <= 50.0);
            assert!(r.distance_pct >= 0.0 && r.distance_pct <= 100.0);
        }

        // Ground fault: strong zero-sequence current ratio
        let sym = report.symmetrical.unwrap();
        assert!(sym.i0_i1_ratio > 0.1);
        assert!(report.prefault_phasors.is_some());
        assert!(report.fault_phasors.is_some());
    }

    #[test]
    fn test_end_to_end_quiet_record() {
        let record = SyntheticFault::no_fault().build();
        let report = analyze(&record, &line_69kv(), Kilometers(50.0)).unwrap();

        assert_eq!(report.classification.fault_type, FaultType::Unknown);
        assert_eq!(report.classification.confidence, Confidence::Low);
        assert!(report.locations.is_empty());
        assert!(report.recommended.is_none());
        assert!(report.symmetrical.is_none());
        assert!(report.fault_phasors.is_none());
    }

    #[test]
    fn test_distance_monotonicity_end_to_end() {
        let mut last = 0.0;
        for d in [10.0, 20.0, 30.0, 40.0] {
            let record = SyntheticFault::ag().with_distance_km(d).build();
            let report = analyze(&record, &line_69kv(), Kilometers(50.0)).unwrap();
            let takagi = report.locations[&LocationMethod::Takagi].distance_km;
            assert!(takagi > last, "takagi {takagi} at {d} km not above {last}");
            last = takagi;
        }
    }

    #[test]
    fn test_noise_robustness_end_to_end() {
        let record = SyntheticFault::ag().with_noise(0.05).build();
        let report = analyze(&record, &line_69kv(), Kilometers(50.0)).unwrap();
        assert_eq!(report.classification.fault_type, FaultType::Ag);
        assert!(report.classification.confidence >= Confidence::Medium);
    }

    #[test]
    fn test_report_serializes() {
        let record = SyntheticFault::ag().build();
        let report = analyze(&record, &line_69kv(), Kilometers(50.0)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["classification"]["fault_type"], "AG");
        assert!(json["locations"]["takagi"]["distance_km"].is_number());
        assert_eq!(json["recommended"], "takagi");
    }
}
