//! Synthetic fault-record builder.
//!
//! Builds circuit-consistent event records for validation: the relay-point
//! loop voltage is constructed as V = d·Z1·I_loop + Rf·ΔI, so an exact
//! estimator recovers the injected distance and fault resistance. Waveform
//! texture (decaying DC offset at onset, additive noise) is layered on top
//! with a seeded generator for deterministic tests.

use num_complex::Complex64;
use std::f64::consts::{PI, SQRT_2};

use flare_core::{
    ChannelDefinition, ChannelId, Hertz, LineParameters, Phase, PhasorSet, Record,
};

/// Fault scenario shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// No disturbance; load flow for the whole record
    None,
    /// Single phase to ground
    PhaseToGround(Phase),
    /// Phase-to-phase, no ground path
    PhaseToPhase(Phase, Phase),
    /// Balanced three-phase
    ThreePhase,
}

/// Synthetic event parameters. Defaults mirror a 69 kV, 50 km line with a
/// 60% single-phase fault through 5 Ω, sampled at 3840 Hz for 200 ms.
#[derive(Debug, Clone)]
pub struct SyntheticFault {
    pub sample_rate_hz: f64,
    pub nominal_freq_hz: f64,
    pub duration_s: f64,
    pub onset_s: f64,
    pub clear_s: f64,
    /// Nominal phase-to-neutral voltage, RMS volts
    pub v_nominal_v: f64,
    /// Pre-fault load current, RMS amps
    pub load_current_a: f64,
    /// Fault-phase current magnitude, RMS amps
    pub fault_current_a: f64,
    pub distance_km: f64,
    pub fault_resistance_ohm: f64,
    pub line: LineParameters,
    pub scenario: Scenario,
    /// Additive noise sigma as a fraction of each channel's pre-fault peak
    pub noise_pct: f64,
    /// Decaying DC offset injected on the first faulted current, RMS amps
    pub dc_offset_a: f64,
    pub seed: u64,
}

impl SyntheticFault {
    /// Phase-A-to-ground fault on the 69 kV reference line.
    pub fn ag() -> Self {
        Self {
            sample_rate_hz: 3840.0,
            nominal_freq_hz: 60.0,
            duration_s: 0.2,
            onset_s: 0.05,
            clear_s: 0.15,
            v_nominal_v: 69_000.0 / 3.0_f64.sqrt(),
            load_current_a: 100.0,
            fault_current_a: 800.0,
            distance_km: 30.0,
            fault_resistance_ohm: 5.0,
            line: LineParameters::new(0.0839, 0.3927, 0.2530, 1.1780, 659.0),
            scenario: Scenario::PhaseToGround(Phase::A),
            noise_pct: 0.0,
            dc_offset_a: 300.0,
            seed: 42,
        }
    }

    /// Quiet record with load flow only.
    pub fn no_fault() -> Self {
        Self {
            scenario: Scenario::None,
            ..Self::ag()
        }
    }

    pub fn phase_to_phase(p: Phase, q: Phase) -> Self {
        Self {
            scenario: Scenario::PhaseToPhase(p, q),
            ..Self::ag()
        }
    }

    pub fn three_phase() -> Self {
        Self {
            scenario: Scenario::ThreePhase,
            fault_resistance_ohm: 0.5,
            ..Self::ag()
        }
    }

    pub fn with_noise(mut self, pct: f64) -> Self {
        self.noise_pct = pct;
        self
    }

    pub fn with_duration_s(mut self, duration_s: f64) -> Self {
        self.duration_s = duration_s;
        self
    }

    pub fn with_distance_km(mut self, d: f64) -> Self {
        self.distance_km = d;
        self
    }

    pub fn with_fault_resistance(mut self, rf: f64) -> Self {
        self.fault_resistance_ohm = rf;
        self
    }

    /// Pre-fault phasors (RMS convention, load lagging 30°).
    pub fn prefault_phasors(&self) -> PhasorSet {
        let v = self.v_nominal_v;
        let i = self.load_current_a;
        PhasorSet {
            va: polar(v, 0.0),
            vb: polar(v, -120.0),
            vc: polar(v, 120.0),
            ia: polar(i, -30.0),
            ib: polar(i, -150.0),
            ic: polar(i, 90.0),
        }
    }

    /// During-fault phasors, circuit-consistent with the configured
    /// distance and fault resistance.
    pub fn fault_phasors(&self) -> PhasorSet {
        let pre = self.prefault_phasors();
        let z1 = self.line.z1_per_km;
        let d = self.distance_km;
        let rf = self.fault_resistance_ohm;

        match self.scenario {
            Scenario::None => pre,
            Scenario::PhaseToGround(phase) => {
                let k0 = self.line.k0();
                let reference_deg = match phase {
                    Phase::A => 0.0,
                    Phase::B => -120.0,
                    Phase::C => 120.0,
                };
                let i_f = polar(self.fault_current_a, reference_deg - 36.0);
                let mut set = set_current(pre, phase, i_f);
                // Mild coupling bump on the healthy phases
                for other in Phase::ALL {
                    if other != phase {
                        let id = ChannelId::current(other);
                        let bumped = set.get(id) * 1.05;
                        set = set_current(set, other, bumped);
                    }
                }
                let i_loop = set.current(phase) + k0 * set.residual_current();
                let i_loop_pre = pre.current(phase) + k0 * pre.residual_current();
                let delta = i_loop - i_loop_pre;
                let v_f = d * z1 * i_loop + rf * delta;
                set_voltage(set, phase, v_f)
            }
            Scenario::PhaseToPhase(p, q) => {
                let v_drive = pre.voltage(p) - pre.voltage(q);
                let direction = v_drive / v_drive.norm();
                let i_f = self.fault_current_a * direction * polar(1.0, -70.0);

                let mut set = pre;
                set = set_current(set, p, pre.current(p) + i_f);
                set = set_current(set, q, pre.current(q) - i_f);

                let i_loop = set.current(p) - set.current(q);
                let i_loop_pre = pre.current(p) - pre.current(q);
                let delta = i_loop - i_loop_pre;
                let v_loop = d * z1 * i_loop + rf * delta;

                let midpoint = (pre.voltage(p) + pre.voltage(q)) / 2.0;
                set = set_voltage(set, p, midpoint + v_loop / 2.0);
                set_voltage(set, q, midpoint - v_loop / 2.0)
            }
            Scenario::ThreePhase => {
                let mut set = pre;
                for phase in Phase::ALL {
                    let direction = pre.voltage(phase) / pre.voltage(phase).norm();
                    let i_f = self.fault_current_a * direction * polar(1.0, -75.0);
                    set = set_current(set, phase, i_f);
                    let delta = i_f - pre.current(phase);
                    let v_f = d * z1 * i_f + rf * delta;
                    set = set_voltage(set, phase, v_f);
                }
                set
            }
        }
    }

    /// Synthesize the six channel waveforms, primary units.
    pub fn waveforms(&self) -> [Vec<f64>; 6] {
        let fs = self.sample_rate_hz;
        let n = (self.duration_s * fs).round() as usize;
        let n_onset = (self.onset_s * fs).round() as usize;
        let n_clear = (self.clear_s * fs).round() as usize;
        let omega = 2.0 * PI * self.nominal_freq_hz;

        let pre = self.prefault_phasors();
        let fault = self.fault_phasors();

        let mut rng = Lcg::new(self.seed);
        let mut channels: [Vec<f64>; 6] = std::array::from_fn(|_| Vec::with_capacity(n));

        for (slot, id) in ChannelId::ALL.iter().enumerate() {
            let x_pre = pre.get(*id);
            let x_fault = fault.get(*id);
            let sigma = self.noise_pct * SQRT_2 * x_pre.norm();
            for i in 0..n {
                let t = i as f64 / fs;
                let x = if i >= n_onset && i < n_clear { x_fault } else { x_pre };
                let mut s = SQRT_2 * x.norm() * (omega * t + x.arg()).cos();
                if sigma > 0.0 {
                    s += sigma * rng.gauss();
                }
                channels[slot].push(s);
            }
        }

        // Decaying DC offset on the first faulted current channel
        if let Some(phase) = self.first_faulted_phase() {
            let slot = ChannelId::ALL
                .iter()
                .position(|id| *id == ChannelId::current(phase))
                .expect("closed set");
            let tau = fs / self.nominal_freq_hz * 1.5;
            for i in n_onset..n_clear.min(n) {
                let decay = (-((i - n_onset) as f64) / tau).exp();
                channels[slot][i] += self.dc_offset_a * SQRT_2 * decay;
            }
        }

        channels
    }

    /// Build the record.
    pub fn build(&self) -> Record {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let trigger = start + chrono::Duration::microseconds((self.onset_s * 1e6) as i64);

        let definitions = ChannelId::ALL
            .iter()
            .enumerate()
            .map(|(i, id)| ChannelDefinition {
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

        Record::new(
            Hertz(self.sample_rate_hz),
            Hertz(self.nominal_freq_hz),
            start,
            trigger,
            self.waveforms(),
            definitions,
        )
        .expect("synthetic record is well-formed")
    }

    fn first_faulted_phase(&self) -> Option<Phase> {
        match self.scenario {
            Scenario::None => None,
            Scenario::PhaseToGround(p) => Some(p),
            Scenario::PhaseToPhase(p, _) => Some(p),
            Scenario::ThreePhase => Some(Phase::A),
        }
    }
}

fn polar(mag: f64, deg: f64) -> Complex64 {
    Complex64::from_polar(mag, deg.to_radians())
}

fn set_voltage(mut set: PhasorSet, phase: Phase, value: Complex64) -> PhasorSet {
    match phase {
        Phase::A => set.va = value,
        Phase::B => set.vb = value,
        Phase::C => set.vc = value,
    }
    set
}

fn set_current(mut set: PhasorSet, phase: Phase, value: Complex64) -> PhasorSet {
    match phase {
        Phase::A => set.ia = value,
        Phase::B => set.ib = value,
        Phase::C => set.ic = value,
    }
    set
}

/// Small deterministic generator for test noise. Quality is irrelevant
/// here; reproducibility is not.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
    }

    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Approximately standard normal (sum of twelve uniforms).
    fn gauss(&mut self) -> f64 {
        (0..12).map(|_| self.next_f64()).sum::<f64>() - 6.0
    }
}
