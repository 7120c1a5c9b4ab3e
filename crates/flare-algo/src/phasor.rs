//! One-cycle DFT phasor extraction and symmetrical components.
//!
//! Per-channel phasors are single-bin discrete Fourier estimates over a
//! window covering exactly one nominal-frequency cycle, scaled to RMS
//! magnitude. The same convention applies to the pre-fault and fault
//! windows so that ratios between them stay meaningful.

use num_complex::Complex64;
use std::f64::consts::{PI, SQRT_2};

use flare_core::{
    ChannelId, FaultWindow, FlareError, FlareResult, Hertz, PhasorSet, Record, SequenceSet,
    SymmetricalComponents,
};

/// Degeneracy guard for current magnitudes (amps). Below this, sequence
/// ratios are undefined and loop currents are unusable for location.
pub const CURRENT_EPSILON: f64 = 1e-6;

/// Fundamental-frequency phasor of one sample window, RMS magnitude.
///
/// The window should cover exactly one cycle of `freq` at `sample_rate`;
/// the caller controls placement. Correlates against sine/cosine references
/// at the nominal frequency and scales by 2/N (peak) then 1/√2 (RMS).
pub fn fundamental_phasor(samples: &[f64], sample_rate: Hertz, freq: Hertz) -> Complex64 {
    let n = samples.len();
    if n == 0 {
        return Complex64::new(0.0, 0.0);
    }
    let mut acc = Complex64::new(0.0, 0.0);
    for (i, &s) in samples.iter().enumerate() {
        let theta = 2.0 * PI * freq.value() * i as f64 / sample_rate.value();
        acc += s * Complex64::new(theta.cos(), -theta.sin());
    }
    // A cosine of phase φ correlates to a phasor at angle +φ.
    acc * (2.0 / n as f64 / SQRT_2)
}

/// Pre-fault and fault phasor sets for one record.
#[derive(Debug, Clone, Copy)]
pub struct WindowPhasors {
    /// Absent when the record holds no full cycle before fault onset.
    pub prefault: Option<PhasorSet>,
    pub fault: PhasorSet,
}

/// Extracts windowed phasor sets from a record.
#[derive(Debug, Clone)]
pub struct PhasorEngine {
    sample_rate: Hertz,
    nominal_freq: Hertz,
    samples_per_cycle: usize,
}

impl PhasorEngine {
    pub fn new(record: &Record) -> Self {
        Self {
            sample_rate: record.sample_rate(),
            nominal_freq: record.nominal_freq(),
            samples_per_cycle: record.samples_per_cycle(),
        }
    }

    pub fn samples_per_cycle(&self) -> usize {
        self.samples_per_cycle
    }

    /// Phasor of one channel over the cycle starting at `start`.
    pub fn channel_phasor(&self, record: &Record, id: ChannelId, start: usize) -> Complex64 {
        let window = &record.channel(id)[start..start + self.samples_per_cycle];
        fundamental_phasor(window, self.sample_rate, self.nominal_freq)
    }

    /// Phasors of all six channels over the cycle starting at `start`.
    pub fn window_set(&self, record: &Record, start: usize) -> PhasorSet {
        PhasorSet {
            va: self.channel_phasor(record, ChannelId::Va, start),
            vb: self.channel_phasor(record, ChannelId::Vb, start),
            vc: self.channel_phasor(record, ChannelId::Vc, start),
            ia: self.channel_phasor(record, ChannelId::Ia, start),
            ib: self.channel_phasor(record, ChannelId::Ib, start),
            ic: self.channel_phasor(record, ChannelId::Ic, start),
        }
    }

    /// Extract the pre-fault and fault phasor sets for a detected window.
    ///
    /// The fault cycle starts half a cycle after onset to stay clear of the
    /// decaying-DC transient, pulled back when clearing truncates the
    /// interval. An interval shorter than one cycle cannot carry a
    /// fundamental estimate and fails with `InsufficientData`.
    pub fn extract(&self, record: &Record, window: &FaultWindow) -> FlareResult<WindowPhasors> {
        let spc = self.samples_per_cycle;
        if window.len() < spc {
            return Err(FlareError::InsufficientData(format!(
                "fault interval of {} samples is shorter than one cycle ({} samples)",
                window.len(),
                spc
            )));
        }

        let fault_start = (window.onset() + spc / 2).min(window.clear() - spc);
        let fault = self.window_set(record, fault_start);

        let prefault = if window.onset() >= spc {
            Some(self.window_set(record, window.onset() - spc))
        } else {
            None
        };

        Ok(WindowPhasors { prefault, fault })
    }
}

/// 120° rotation operator a = 1∠120°.
fn rotation_operator() -> Complex64 {
    Complex64::from_polar(1.0, 2.0 * PI / 3.0)
}

/// Fortescue transform of one three-phase quantity (order A, B, C).
///
/// Zero sequence is the phase average; positive/negative sequence use the
/// forward/backward rotation combination.
pub fn sequence_components(phases: [Complex64; 3]) -> SequenceSet {
    let a = rotation_operator();
    let a2 = a * a;
    let [xa, xb, xc] = phases;
    SequenceSet {
        zero: (xa + xb + xc) / 3.0,
        positive: (xa + a * xb + a2 * xc) / 3.0,
        negative: (xa + a2 * xb + a * xc) / 3.0,
    }
}

/// Inverse Fortescue transform: reconstruct phase quantities (A, B, C).
pub fn reconstruct_phases(seq: &SequenceSet) -> [Complex64; 3] {
    let a = rotation_operator();
    let a2 = a * a;
    [
        seq.zero + seq.positive + seq.negative,
        seq.zero + a2 * seq.positive + a * seq.negative,
        seq.zero + a * seq.positive + a2 * seq.negative,
    ]
}

/// Symmetrical components of a phasor set, with guarded sequence-current
/// ratios.
///
/// When |I1| falls below [`CURRENT_EPSILON`] the ratios are NaN, never a
/// division fault; downstream consumers treat NaN as insufficient evidence.
pub fn symmetrical_components(set: &PhasorSet) -> SymmetricalComponents {
    let voltage = sequence_components(set.voltages());
    let current = sequence_components(set.currents());

    let i1 = current.positive.norm();
    let (i2_i1_ratio, i0_i1_ratio) = if i1 < CURRENT_EPSILON {
        (f64::NAN, f64::NAN)
    } else {
        (current.negative.norm() / i1, current.zero.norm() / i1)
    };

    SymmetricalComponents {
        voltage,
        current,
        i2_i1_ratio,
        i0_i1_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polar(mag: f64, deg: f64) -> Complex64 {
        Complex64::from_polar(mag, deg.to_radians())
    }

    fn cosine(amp: f64, phase_deg: f64, fs: f64, f0: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * PI * f0 * i as f64 / fs + phase_deg.to_radians()).cos())
            .collect()
    }

    #[test]
    fn test_phasor_magnitude_is_rms() {
        // 100 A peak cosine → 70.71 A RMS phasor
        let samples = cosine(100.0, 0.0, 3840.0, 60.0, 64);
        let p = fundamental_phasor(&samples, Hertz(3840.0), Hertz(60.0));
        assert!((p.norm() - 100.0 / SQRT_2).abs() < 1e-6);
        assert!(p.arg().abs() < 1e-6);
    }

    #[test]
    fn test_phasor_angle() {
        let samples = cosine(10.0, 45.0, 3840.0, 60.0, 64);
        let p = fundamental_phasor(&samples, Hertz(3840.0), Hertz(60.0));
        assert!((p.arg().to_degrees() - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_phasor_negative_angle() {
        let samples = cosine(10.0, -120.0, 3840.0, 60.0, 64);
        let p = fundamental_phasor(&samples, Hertz(3840.0), Hertz(60.0));
        assert!((p.arg().to_degrees() + 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_phasor_rejects_dc() {
        // Pure DC has no fundamental content over a full cycle
        let samples = vec![42.0; 64];
        let p = fundamental_phasor(&samples, Hertz(3840.0), Hertz(60.0));
        assert!(p.norm() < 1e-9);
    }

    #[test]
    fn test_empty_window() {
        let p = fundamental_phasor(&[], Hertz(3840.0), Hertz(60.0));
        assert_eq!(p, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_fortescue_balanced() {
        let phases = [polar(1.0, 0.0), polar(1.0, -120.0), polar(1.0, 120.0)];
        let seq = sequence_components(phases);
        assert!((seq.positive.norm() - 1.0).abs() < 1e-12);
        assert!(seq.negative.norm() < 1e-12);
        assert!(seq.zero.norm() < 1e-12);
    }

    #[test]
    fn test_fortescue_roundtrip() {
        // Arbitrary unbalanced phasors reconstruct within 1e-9 relative
        let phases = [polar(39.8, -12.0), polar(41.2, -131.5), polar(37.6, 114.0)];
        let seq = sequence_components(phases);
        let back = reconstruct_phases(&seq);
        for (orig, rec) in phases.iter().zip(back.iter()) {
            assert!((orig - rec).norm() / orig.norm() < 1e-9);
        }
    }

    #[test]
    fn test_ratio_guard() {
        let set = PhasorSet {
            va: polar(1.0, 0.0),
            vb: polar(1.0, -120.0),
            vc: polar(1.0, 120.0),
            ia: Complex64::new(0.0, 0.0),
            ib: Complex64::new(0.0, 0.0),
            ic: Complex64::new(0.0, 0.0),
        };
        let sym = symmetrical_components(&set);
        assert!(sym.i2_i1_ratio.is_nan());
        assert!(sym.i0_i1_ratio.is_nan());
        assert!(!sym.ratios_defined());
    }

    #[test]
    fn test_ground_fault_ratios() {
        // Single heavy phase-A current: strong zero and negative sequence
        let set = PhasorSet {
            va: polar(20_000.0, 0.0),
            vb: polar(39_800.0, -120.0),
            vc: polar(39_800.0, 120.0),
            ia: polar(800.0, -36.0),
            ib: polar(100.0, -150.0),
            ic: polar(100.0, 90.0),
        };
        let sym = symmetrical_components(&set);
        assert!(sym.ratios_defined());
        assert!(sym.i0_i1_ratio > 0.5);
        assert!(sym.i2_i1_ratio > 0.5);
    }

    fn test_record(n: usize) -> Record {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let defs = ChannelId::ALL
            .iter()
            .enumerate()
            .map(|(i, id)| flare_core::ChannelDefinition {
                index: i + 1,
                name: id.as_str().to_string(),
                phase: id.phase(),
                kind: id.kind(),
                multiplier: 1.0,
                offset: 0.0,
                ratio: 1.0,
                primary_ratio: 1.0,
                secondary_ratio: 1.0,
            })
            .collect();
        let wave = |amp: f64, deg: f64| cosine(amp, deg, 3840.0, 60.0, n);
        Record::new(
            Hertz(3840.0),
            Hertz(60.0),
            ts,
            ts,
            [
                wave(100.0, 0.0),
                wave(100.0, -120.0),
                wave(100.0, 120.0),
                wave(10.0, -30.0),
                wave(10.0, -150.0),
                wave(10.0, 90.0),
            ],
            defs,
        )
        .unwrap()
    }

    #[test]
    fn test_engine_extracts_both_windows() {
        let record = test_record(768);
        let engine = PhasorEngine::new(&record);
        let window = FaultWindow::new(192, 576, 768).unwrap();
        let phasors = engine.extract(&record, &window).unwrap();
        assert!(phasors.prefault.is_some());
        // Steady waveform: pre-fault and fault phasors agree
        let pre = phasors.prefault.unwrap();
        assert!((pre.va - phasors.fault.va).norm() < 1e-6);
        assert!((pre.va.norm() - 100.0 / SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_engine_prefault_absent_for_early_onset() {
        let record = test_record(768);
        let engine = PhasorEngine::new(&record);
        let window = FaultWindow::new(10, 576, 768).unwrap();
        let phasors = engine.extract(&record, &window).unwrap();
        assert!(phasors.prefault.is_none());
    }

    #[test]
    fn test_engine_short_interval_is_insufficient() {
        let record = test_record(768);
        let engine = PhasorEngine::new(&record);
        let window = FaultWindow::new(192, 220, 768).unwrap();
        let err = engine.extract(&record, &window).unwrap_err();
        assert!(matches!(err, FlareError::InsufficientData(_)));
    }
}
