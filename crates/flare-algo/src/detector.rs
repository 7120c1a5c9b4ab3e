//! Fault detection and classification.
//!
//! Scans a sliding one-cycle RMS window over each current channel to find
//! the disturbance interval, decides per-phase involvement from current
//! exceedance and voltage sag, infers ground involvement from the
//! zero-sequence current ratio, and maps the evidence onto the closed
//! fault-type set with a margin-derived confidence.

use flare_core::{
    ChannelId, Confidence, FaultClassification, FaultType, FaultWindow, Phase, Record,
};

use crate::phasor::{symmetrical_components, PhasorEngine};

/// Detection thresholds.
///
/// The classification literature gives illustrative values rather than
/// exact constants, so every threshold is a tunable field with the
/// defaults documented on [`DetectorConfig::default`]. Confidence is a
/// function of the margin between a deciding quantity and its threshold,
/// not a separate model.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Onset threshold as a multiple of the pre-event steady-state RMS
    pub threshold_factor: f64,
    /// Absolute floor for the current threshold, primary amps. Keeps an
    /// unloaded line from triggering on noise.
    pub min_threshold_a: f64,
    /// A phase counts as involved when its fault-window voltage RMS drops
    /// below this fraction of its pre-event RMS
    pub voltage_sag_fraction: f64,
    /// |I0|/|I1| above this implies a ground path
    pub ground_ratio_threshold: f64,
    /// |I2|/|I1| above this contradicts a balanced three-phase fault
    pub asym_ratio_threshold: f64,
    /// A deciding margin at or above this is conclusive
    pub strong_margin: f64,
    /// A deciding margin below this is marginal evidence
    pub marginal_margin: f64,
}

impl Default for DetectorConfig {
    /// Defaults: 1.5× RMS exceedance with a 10 A floor, 0.75 sag fraction,
    /// 0.1 sequence-ratio thresholds, margins conclusive at 1.5 and
    /// marginal below 1.2.
    fn default() -> Self {
        Self {
            threshold_factor: 1.5,
            min_threshold_a: 10.0,
            voltage_sag_fraction: 0.75,
            ground_ratio_threshold: 0.1,
            asym_ratio_threshold: 0.1,
            strong_margin: 1.5,
            marginal_margin: 1.2,
        }
    }
}

impl DetectorConfig {
    pub fn with_threshold_factor(mut self, factor: f64) -> Self {
        self.threshold_factor = factor;
        self
    }

    pub fn with_voltage_sag_fraction(mut self, fraction: f64) -> Self {
        self.voltage_sag_fraction = fraction;
        self
    }

    pub fn with_ground_ratio_threshold(mut self, threshold: f64) -> Self {
        self.ground_ratio_threshold = threshold;
        self
    }
}

/// Classifies one record. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct FaultDetector {
    config: DetectorConfig,
}

impl FaultDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Classify the event captured in `record`.
    ///
    /// Never fails: insufficient data and absent threshold crossings both
    /// degrade to the Unknown/Low verdict with no fault window, which
    /// tells downstream stages to skip location.
    pub fn classify(&self, record: &Record) -> FaultClassification {
        let cfg = &self.config;
        let spc = record.samples_per_cycle();
        let n = record.n_samples();
        if spc == 0 || n < 2 * spc {
            return FaultClassification::unknown();
        }

        // Sliding one-cycle RMS per current channel; the first window is
        // the pre-event steady state.
        let i_rms: Vec<Vec<f64>> = Phase::ALL
            .iter()
            .map(|&p| sliding_rms(record.channel(ChannelId::current(p)), spc))
            .collect();
        let thresholds: Vec<f64> = i_rms
            .iter()
            .map(|r| (r[0] * cfg.threshold_factor).max(cfg.min_threshold_a))
            .collect();

        // Onset: the first window-end index where any phase exceeds its
        // threshold.
        let n_windows = i_rms[0].len();
        let Some(onset_k) = (0..n_windows)
            .find(|&k| (0..3).any(|p| i_rms[p][k] > thresholds[p]))
        else {
            return FaultClassification::unknown();
        };
        let onset = onset_k + spc - 1;

        // Clearing: the first window past onset whose whole span is back
        // below threshold on every phase.
        let clear = ((onset_k + 1)..n_windows)
            .find(|&k| (0..3).all(|p| i_rms[p][k] < thresholds[p]))
            .map(|k| k.max(onset))
            .unwrap_or(n);

        let Ok(window) = FaultWindow::new(onset, clear, n) else {
            return FaultClassification::unknown();
        };

        // Sequence-current ratios over the fault window. A window too short
        // for one cycle means the record cannot support classification.
        let engine = PhasorEngine::new(record);
        let sym = match engine.extract(record, &window) {
            Ok(phasors) => symmetrical_components(&phasors.fault),
            Err(_) => return FaultClassification::unknown(),
        };

        // Per-phase involvement evidence over the fault interval.
        let mut involved = Vec::new();
        let mut supporting = Vec::new();
        let mut against_marginal = 0usize;
        for (p_idx, &phase) in Phase::ALL.iter().enumerate() {
            let i_fault = window_rms(&record.channel(ChannelId::current(phase))[onset..clear]);
            let v_pre = window_rms(&record.channel(ChannelId::voltage(phase))[..spc]);
            let v_fault = window_rms(&record.channel(ChannelId::voltage(phase))[onset..clear]);

            let current_margin = i_fault / thresholds[p_idx];
            let sag_level = cfg.voltage_sag_fraction * v_pre;
            // A fully collapsed (zero-RMS) voltage is the strongest sag
            // evidence, not a division fault.
            let voltage_margin = if sag_level > 0.0 {
                sag_level / v_fault.max(1e-9)
            } else {
                0.0
            };

            if current_margin > 1.0 || voltage_margin > 1.0 {
                involved.push(phase);
                supporting.push(current_margin.max(voltage_margin));
            } else {
                // Quiet phases only weaken confidence when they sit close
                // to a threshold.
                let clearance = (1.0 / current_margin).min(if voltage_margin > 0.0 {
                    1.0 / voltage_margin
                } else {
                    f64::INFINITY
                });
                if clearance < cfg.marginal_margin {
                    against_marginal += 1;
                }
            }
        }

        if involved.is_empty() {
            return FaultClassification::unknown();
        }

        // Ground involvement from the zero-sequence current ratio. NaN is
        // insufficient evidence, never ground.
        let ground_ratio = sym.i0_i1_ratio;
        let ratios_defined = sym.ratios_defined();
        let grounded = ratios_defined && ground_ratio > cfg.ground_ratio_threshold;

        let fault_type = match involved.as_slice() {
            [p] => single_phase_type(*p),
            [a, b] => two_phase_type(*a, *b, grounded),
            [_, _, _] => {
                if grounded {
                    FaultType::Abcg
                } else {
                    FaultType::Abc
                }
            }
            _ => FaultType::Unknown,
        };

        // Deciding margins beyond phase involvement: the ground decision,
        // and symmetry for three-phase faults.
        if ratios_defined {
            let ground_margin = if grounded || fault_type.involves_ground() {
                ground_ratio / cfg.ground_ratio_threshold
            } else {
                cfg.ground_ratio_threshold / ground_ratio.max(1e-12)
            };
            supporting.push(ground_margin);

            if matches!(fault_type, FaultType::Abc)
                && sym.i2_i1_ratio > cfg.asym_ratio_threshold
            {
                // Residual unbalance on a nominally symmetric fault
                supporting.push(cfg.asym_ratio_threshold / sym.i2_i1_ratio);
            }
        }

        let mut confidence = confidence_from_margins(&supporting, against_marginal, cfg);
        if !ratios_defined {
            confidence = confidence.degrade_to(Confidence::Medium);
        }

        FaultClassification {
            fault_type,
            phases: involved,
            window: Some(window),
            onset_ms: Some(window.onset_ms(record).value()),
            clear_ms: Some(window.clear_ms(record).value()),
            duration_ms: Some(window.duration_ms(record).value()),
            confidence,
        }
    }
}

fn single_phase_type(phase: Phase) -> FaultType {
    // A single involved conductor has no return path but ground.
    match phase {
        Phase::A => FaultType::Ag,
        Phase::B => FaultType::Bg,
        Phase::C => FaultType::Cg,
    }
}

fn two_phase_type(a: Phase, b: Phase, grounded: bool) -> FaultType {
    match (a.min(b), a.max(b), grounded) {
        (Phase::A, Phase::B, false) => FaultType::Ab,
        (Phase::B, Phase::C, false) => FaultType::Bc,
        (Phase::A, Phase::C, false) => FaultType::Ca,
        (Phase::A, Phase::B, true) => FaultType::Abg,
        (Phase::B, Phase::C, true) => FaultType::Bcg,
        (Phase::A, Phase::C, true) => FaultType::Cag,
        _ => FaultType::Unknown,
    }
}

/// Confidence from the margins of the deciding quantities.
///
/// High when every deciding margin is conclusive, Medium when one is
/// marginal or any sits between the bands, Low when two or more are
/// marginal.
fn confidence_from_margins(
    supporting: &[f64],
    against_marginal: usize,
    cfg: &DetectorConfig,
) -> Confidence {
    let marginal = supporting
        .iter()
        .filter(|m| **m < cfg.marginal_margin)
        .count()
        + against_marginal;
    let moderate = supporting
        .iter()
        .filter(|m| **m >= cfg.marginal_margin && **m < cfg.strong_margin)
        .count();

    if marginal >= 2 {
        Confidence::Low
    } else if marginal == 1 || moderate > 0 {
        Confidence::Medium
    } else {
        Confidence::High
    }
}

/// RMS of each sliding window of `window` samples; index k covers
/// `[k, k + window)`. Running sum of squares, one pass.
fn sliding_rms(samples: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || samples.len() < window {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(samples.len() - window + 1);
    let mut sum_sq: f64 = samples[..window].iter().map(|s| s * s).sum();
    out.push((sum_sq / window as f64).sqrt());
    for i in window..samples.len() {
        sum_sq += samples[i] * samples[i] - samples[i - window] * samples[i - window];
        out.push((sum_sq.max(0.0) / window as f64).sqrt());
    }
    out
}

/// RMS of one contiguous span.
fn window_rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f64).sqrt()
}
