//! Impedance-based single-ended fault location.
//!
//! Every method works on the fault-loop voltage and current selected for
//! the classified fault type: ground loops compensate the phase current
//! with k0 times the residual current, phase loops use the phase-to-phase
//! difference. The methods are independent pure functions of the same
//! inputs and run in parallel; none depends on another's result.

use std::collections::BTreeMap;

use num_complex::Complex64;
use rayon::prelude::*;

use flare_core::{
    Confidence, FaultClassification, FaultType, Kilometers, LineParameters, LocationMethod,
    LocationResult, Phase, PhasorSet,
};

use crate::phasor::CURRENT_EPSILON;

/// Fault-loop signals for one classified event.
#[derive(Debug, Clone, Copy)]
pub struct LoopSignals {
    pub v_loop: Complex64,
    pub i_loop: Complex64,
    /// Loop current before the fault; absent without a pre-fault window
    pub i_loop_pre: Option<Complex64>,
}

impl LoopSignals {
    /// Change in loop current from pre-fault to fault, the Takagi
    /// polarizing quantity.
    pub fn delta_i(&self) -> Option<Complex64> {
        self.i_loop_pre.map(|pre| self.i_loop - pre)
    }
}

/// Select the fault-loop quantities for a classified fault type.
///
/// Single-phase-to-ground loops use the faulted phase voltage against the
/// k0-compensated phase current; every multi-phase type uses the leading
/// phase pair. `Unknown` has no loop and yields `None`.
pub fn fault_loop(
    fault_type: FaultType,
    fault: &PhasorSet,
    prefault: Option<&PhasorSet>,
    line: &LineParameters,
) -> Option<LoopSignals> {
    match fault_type {
        FaultType::Ag | FaultType::Bg | FaultType::Cg => {
            let phase = fault_type.phases()[0];
            let k0 = line.k0();
            let i_loop = fault.current(phase) + k0 * fault.residual_current();
            let i_loop_pre = prefault.map(|p| p.current(phase) + k0 * p.residual_current());
            Some(LoopSignals {
                v_loop: fault.voltage(phase),
                i_loop,
                i_loop_pre,
            })
        }
        FaultType::Ab
        | FaultType::Bc
        | FaultType::Ca
        | FaultType::Abg
        | FaultType::Bcg
        | FaultType::Cag
        | FaultType::Abc
        | FaultType::Abcg => {
            let (p, q) = loop_pair(fault_type);
            let i_loop = fault.current(p) - fault.current(q);
            let i_loop_pre = prefault.map(|s| s.current(p) - s.current(q));
            Some(LoopSignals {
                v_loop: fault.voltage(p) - fault.voltage(q),
                i_loop,
                i_loop_pre,
            })
        }
        FaultType::Unknown => None,
    }
}

fn loop_pair(fault_type: FaultType) -> (Phase, Phase) {
    match fault_type {
        FaultType::Bc | FaultType::Bcg => (Phase::B, Phase::C),
        FaultType::Ca | FaultType::Cag => (Phase::C, Phase::A),
        // AB faults and (by convention) three-phase faults
        _ => (Phase::A, Phase::B),
    }
}

/// Inputs shared by every location strategy.
#[derive(Debug, Clone, Copy)]
pub struct LocationInputs {
    pub signals: LoopSignals,
    /// Positive-sequence line impedance per kilometer (Ω/km)
    pub z1_per_km: Complex64,
    pub line_length_km: f64,
}

impl LocationInputs {
    /// Apparent fault-loop impedance seen from the relay point.
    pub fn apparent_impedance(&self) -> Complex64 {
        self.signals.v_loop / self.signals.i_loop
    }

    fn degenerate(&self) -> bool {
        self.signals.i_loop.norm() < CURRENT_EPSILON
            || self.z1_per_km.im.abs() < f64::EPSILON
    }
}

/// One single-ended location method.
pub trait LocationStrategy: Send + Sync {
    fn method(&self) -> LocationMethod;

    /// Distance estimate, or `None` when prerequisites are missing or the
    /// loop quantities are degenerate. Degeneracy never panics and never
    /// fabricates a number.
    fn locate(&self, inputs: &LocationInputs) -> Option<LocationResult>;
}

/// Simple reactance method: assumes the fault resistance is purely
/// resistive, so the loop reactance is proportional to distance. Fast,
/// biased for resistive/arc faults.
pub struct ReactanceMethod;

impl LocationStrategy for ReactanceMethod {
    fn method(&self) -> LocationMethod {
        LocationMethod::Reactance
    }

    fn locate(&self, inputs: &LocationInputs) -> Option<LocationResult> {
        if inputs.degenerate() {
            return None;
        }
        let z = inputs.apparent_impedance();
        let d = z.im / inputs.z1_per_km.im;
        let rf = z.re - d * inputs.z1_per_km.re;
        Some(LocationResult::from_raw(
            self.method(),
            d,
            inputs.line_length_km,
            z.re,
            z.im,
            rf,
            Confidence::Medium,
        ))
    }
}

/// Takagi method: polarizes with the change in loop current between the
/// pre-fault and fault states, cancelling the fault-resistance term
/// through the imaginary part of V·conj(ΔI).
pub struct TakagiMethod;

impl TakagiMethod {
    fn raw_distance(inputs: &LocationInputs, delta_i: Complex64) -> Option<f64> {
        let num = (inputs.signals.v_loop * delta_i.conj()).im;
        let den = (inputs.z1_per_km * inputs.signals.i_loop * delta_i.conj()).im;
        if den.abs() < f64::EPSILON {
            return None;
        }
        Some(num / den)
    }
}

impl LocationStrategy for TakagiMethod {
    fn method(&self) -> LocationMethod {
        LocationMethod::Takagi
    }

    fn locate(&self, inputs: &LocationInputs) -> Option<LocationResult> {
        if inputs.degenerate() {
            return None;
        }
        let delta_i = inputs.signals.delta_i()?;
        if delta_i.norm() < CURRENT_EPSILON {
            return None;
        }
        let d = Self::raw_distance(inputs, delta_i)?;
        let z = inputs.apparent_impedance();
        let residual = inputs.signals.v_loop - d * inputs.z1_per_km * inputs.signals.i_loop;
        let rf = (residual / delta_i).re;
        Some(LocationResult::from_raw(
            self.method(),
            d,
            inputs.line_length_km,
            z.re,
            z.im,
            rf,
            Confidence::High,
        ))
    }
}

/// Modified Takagi: alternates between re-estimating the fault resistance
/// from the distance residual and re-solving the distance from the
/// Rf-compensated loop voltage, correcting the load-angle bias the plain
/// Takagi estimate keeps.
pub struct ModifiedTakagiMethod {
    pub max_iterations: usize,
    pub tolerance_km: f64,
}

impl Default for ModifiedTakagiMethod {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance_km: 1e-6,
        }
    }
}

impl LocationStrategy for ModifiedTakagiMethod {
    fn method(&self) -> LocationMethod {
        LocationMethod::ModifiedTakagi
    }

    fn locate(&self, inputs: &LocationInputs) -> Option<LocationResult> {
        if inputs.degenerate() {
            return None;
        }
        let delta_i = inputs.signals.delta_i()?;
        if delta_i.norm() < CURRENT_EPSILON {
            return None;
        }
        let v = inputs.signals.v_loop;
        let i = inputs.signals.i_loop;
        let z1 = inputs.z1_per_km;

        let mut d = TakagiMethod::raw_distance(inputs, delta_i)?;
        let mut rf = 0.0;
        for _ in 0..self.max_iterations {
            rf = ((v - d * z1 * i) / delta_i).re;
            let compensated = v - rf * delta_i;
            let d_next = (compensated / i).im / z1.im;
            if (d_next - d).abs() < self.tolerance_km {
                d = d_next;
                break;
            }
            d = d_next;
        }

        let z = inputs.apparent_impedance();
        Some(LocationResult::from_raw(
            self.method(),
            d,
            inputs.line_length_km,
            z.re,
            z.im,
            rf,
            Confidence::High,
        ))
    }
}

/// Estimated two-end method: splits the total line impedance between the
/// apparent impedance and its remainder, standing in for a true
/// synchronized two-terminal solution no remote-end data exists for.
/// Lower confidence by construction.
pub struct TwoEndMethod;

impl LocationStrategy for TwoEndMethod {
    fn method(&self) -> LocationMethod {
        LocationMethod::TwoEnd
    }

    fn locate(&self, inputs: &LocationInputs) -> Option<LocationResult> {
        if inputs.degenerate() {
            return None;
        }
        let z = inputs.apparent_impedance();
        let z_total = inputs.z1_per_km * inputs.line_length_km;
        let remainder = z_total - z;
        let denom = z.norm() + remainder.norm();
        if denom < f64::EPSILON {
            return None;
        }
        let d = inputs.line_length_km * z.norm() / denom;
        let rf = z.re - d * inputs.z1_per_km.re;
        Some(LocationResult::from_raw(
            self.method(),
            d,
            inputs.line_length_km,
            z.re,
            z.im,
            rf,
            Confidence::Low,
        ))
    }
}

/// Runs every applicable location method for one classified event.
pub struct FaultLocator {
    strategies: Vec<Box<dyn LocationStrategy>>,
}

impl Default for FaultLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultLocator {
    /// Locator with the full method set.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(ReactanceMethod),
                Box::new(TakagiMethod),
                Box::new(ModifiedTakagiMethod::default()),
                Box::new(TwoEndMethod),
            ],
        }
    }

    /// Compute every applicable method. Unknown fault types yield an empty
    /// map; methods whose prerequisites are missing are simply absent.
    pub fn locate_all(
        &self,
        classification: &FaultClassification,
        fault: &PhasorSet,
        prefault: Option<&PhasorSet>,
        line: &LineParameters,
        line_length: Kilometers,
    ) -> BTreeMap<LocationMethod, LocationResult> {
        let Some(signals) = fault_loop(classification.fault_type, fault, prefault, line) else {
            return BTreeMap::new();
        };
        let inputs = LocationInputs {
            signals,
            z1_per_km: line.z1_per_km,
            line_length_km: line_length.value(),
        };

        self.strategies
            .par_iter()
            .filter_map(|s| s.locate(&inputs))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|r| (r.method, r))
            .collect()
    }
}

/// The result surfaced as the default: Takagi when available, else the
/// reactance estimate.
pub fn recommended_method(
    results: &BTreeMap<LocationMethod, LocationResult>,
) -> Option<LocationMethod> {
    if results.contains_key(&LocationMethod::Takagi) {
        Some(LocationMethod::Takagi)
    } else if results.contains_key(&LocationMethod::Reactance) {
        Some(LocationMethod::Reactance)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_69kv() -> LineParameters {
        LineParameters::new(0.0839, 0.3927, 0.2530, 1.1780, 659.0)
    }

    fn polar(mag: f64, deg: f64) -> Complex64 {
        Complex64::from_polar(mag, deg.to_radians())
    }

    /// Loop signals consistent with a fault at `d_km` through `rf` ohms:
    /// V = d·z1·I + Rf·ΔI.
    fn consistent_inputs(d_km: f64, rf: f64, line_length: f64) -> LocationInputs {
        let z1 = line_69kv().z1_per_km;
        let i_pre = polar(100.0, -30.0);
        let i_loop = polar(1263.0, -36.3);
        let delta = i_loop - i_pre;
        let v_loop = d_km * z1 * i_loop + rf * delta;
        LocationInputs {
            signals: LoopSignals {
                v_loop,
                i_loop,
                i_loop_pre: Some(i_pre),
            },
            z1_per_km: z1,
            line_length_km: line_length,
        }
    }

    #[test]
    fn test_takagi_exact_on_consistent_loop() {
        let inputs = consistent_inputs(30.0, 5.0, 50.0);
        let r = TakagiMethod.locate(&inputs).unwrap();
        assert!((r.distance_km - 30.0).abs() < 1e-9, "got {}", r.distance_km);
        assert!((r.rf - 5.0).abs() < 1e-9);
        assert_eq!(r.confidence, Confidence::High);
    }

    #[test]
    fn test_reactance_biased_by_fault_resistance() {
        let inputs = consistent_inputs(30.0, 5.0, 50.0);
        let r = ReactanceMethod.locate(&inputs).unwrap();
        // Rf through a slightly rotated ΔI biases the reactance estimate;
        // it stays in the right neighborhood but off the exact answer.
        assert!((r.distance_km - 30.0).abs() < 5.0);
        // Zero fault resistance removes the bias entirely.
        let clean = consistent_inputs(30.0, 0.0, 50.0);
        let r0 = ReactanceMethod.locate(&clean).unwrap();
        assert!((r0.distance_km - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_modified_takagi_converges() {
        let inputs = consistent_inputs(30.0, 5.0, 50.0);
        let r = ModifiedTakagiMethod::default().locate(&inputs).unwrap();
        assert!((r.distance_km - 30.0).abs() < 1e-6);
        assert!((r.rf - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_end_low_confidence() {
        let inputs = consistent_inputs(30.0, 0.0, 50.0);
        let r = TwoEndMethod.locate(&inputs).unwrap();
        assert_eq!(r.confidence, Confidence::Low);
        // Without fault resistance the impedance split is exact
        assert!((r.distance_km - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_monotonicity() {
        let mut last_takagi = 0.0;
        let mut last_reactance = 0.0;
        for d in [10.0, 20.0, 30.0, 40.0] {
            let inputs = consistent_inputs(d, 5.0, 50.0);
            let t = TakagiMethod.locate(&inputs).unwrap().distance_km;
            let x = ReactanceMethod.locate(&inputs).unwrap().distance_km;
            assert!(t > last_takagi, "takagi {t} not above {last_takagi}");
            assert!(x > last_reactance, "reactance {x} not above {last_reactance}");
            last_takagi = t;
            last_reactance = x;
        }
    }

    #[test]
    fn test_out_of_line_estimate_clamps_to_low() {
        // Fault beyond the remote terminal: raw distance 62 km on a 50 km line
        let inputs = consistent_inputs(62.0, 5.0, 50.0);
        let r = TakagiMethod.locate(&inputs).unwrap();
        assert_eq!(r.distance_km, 50.0);
        assert_eq!(r.distance_pct, 100.0);
        assert_eq!(r.confidence, Confidence::Low);
    }

    #[test]
    fn test_takagi_requires_prefault() {
        let mut inputs = consistent_inputs(30.0, 5.0, 50.0);
        inputs.signals.i_loop_pre = None;
        assert!(TakagiMethod.locate(&inputs).is_none());
        assert!(ModifiedTakagiMethod::default().locate(&inputs).is_none());
        // Reactance and two-end still apply
        assert!(ReactanceMethod.locate(&inputs).is_some());
        assert!(TwoEndMethod.locate(&inputs).is_some());
    }

    #[test]
    fn test_degenerate_loop_current_omits_methods() {
        let mut inputs = consistent_inputs(30.0, 5.0, 50.0);
        inputs.signals.i_loop = Complex64::new(0.0, 0.0);
        assert!(ReactanceMethod.locate(&inputs).is_none());
        assert!(TakagiMethod.locate(&inputs).is_none());
        assert!(TwoEndMethod.locate(&inputs).is_none());
    }

    fn ag_phasor_sets() -> (PhasorSet, PhasorSet) {
        let line = line_69kv();
        let k0 = line.k0();
        let prefault = PhasorSet {
            va: polar(39_837.0, 0.0),
            vb: polar(39_837.0, -120.0),
            vc: polar(39_837.0, 120.0),
            ia: polar(100.0, -30.0),
            ib: polar(100.0, -150.0),
            ic: polar(100.0, 90.0),
        };
        let ia_f = polar(800.0, -36.0);
        let ib_f = prefault.ib * 1.05;
        let ic_f = prefault.ic * 1.05;
        let residual = ia_f + ib_f + ic_f;
        let i_loop = ia_f + k0 * residual;
        let i_loop_pre = prefault.ia; // balanced pre-fault: zero residual
        let delta = i_loop - i_loop_pre;
        let va_f = 30.0 * line.z1_per_km * i_loop + 5.0 * delta;
        let fault = PhasorSet {
            va: va_f,
            vb: prefault.vb,
            vc: prefault.vc,
            ia: ia_f,
            ib: ib_f,
            ic: ic_f,
        };
        (prefault, fault)
    }

    #[test]
    fn test_locate_all_for_ag() {
        let (prefault, fault) = ag_phasor_sets();
        let classification = FaultClassification {
            fault_type: FaultType::Ag,
            phases: vec![Phase::A],
            window: None,
            onset_ms: Some(50.0),
            clear_ms: Some(150.0),
            duration_ms: Some(100.0),
            confidence: Confidence::High,
        };
        let results = FaultLocator::new().locate_all(
            &classification,
            &fault,
            Some(&prefault),
            &line_69kv(),
            Kilometers(50.0),
        );
        assert_eq!(results.len(), 4);
        let takagi = &results[&LocationMethod::Takagi];
        // Pre-fault residual is not exactly zero under k0 compensation of
        // the loop; allow the small resulting skew
        assert!((takagi.distance_km - 30.0).abs() < 1.0, "takagi at {}", takagi.distance_km);
        assert_eq!(recommended_method(&results), Some(LocationMethod::Takagi));
        for r in results.values() {
            assert!(r.distance_km >= 0.0 && r.distance_km <= 50.0);
        }
    }

    #[test]
    fn test_unknown_fault_yields_nothing() {
        let (prefault, fault) = ag_phasor_sets();
        let classification = FaultClassification::unknown();
        let results = FaultLocator::new().locate_all(
            &classification,
            &fault,
            Some(&prefault),
            &line_69kv(),
            Kilometers(50.0),
        );
        assert!(results.is_empty());
        assert_eq!(recommended_method(&results), None);
    }

    #[test]
    fn test_recommended_falls_back_to_reactance() {
        let mut inputs = consistent_inputs(30.0, 0.0, 50.0);
        inputs.signals.i_loop_pre = None;
        let mut results = BTreeMap::new();
        let r = ReactanceMethod.locate(&inputs).unwrap();
        results.insert(r.method, r);
        assert_eq!(recommended_method(&results), Some(LocationMethod::Reactance));
    }
}
