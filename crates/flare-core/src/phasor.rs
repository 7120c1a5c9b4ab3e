//! Phasor and symmetrical-component value types.
//!
//! A phasor is the fundamental-frequency complex coefficient of one channel
//! over one analysis window, in RMS magnitude convention. Two [`PhasorSet`]s
//! exist per analyzed record: one for the pre-fault window and one for the
//! fault window.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::record::{ChannelId, Phase};

/// Fundamental-frequency phasors for all six channels over one window.
///
/// Fixed shape: one complex value per channel, no lookup failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasorSet {
    pub va: Complex64,
    pub vb: Complex64,
    pub vc: Complex64,
    pub ia: Complex64,
    pub ib: Complex64,
    pub ic: Complex64,
}

impl PhasorSet {
    pub fn get(&self, id: ChannelId) -> Complex64 {
        match id {
            ChannelId::Va => self.va,
            ChannelId::Vb => self.vb,
            ChannelId::Vc => self.vc,
            ChannelId::Ia => self.ia,
            ChannelId::Ib => self.ib,
            ChannelId::Ic => self.ic,
        }
    }

    /// Voltage phasors in phase order A, B, C.
    pub fn voltages(&self) -> [Complex64; 3] {
        [self.va, self.vb, self.vc]
    }

    /// Current phasors in phase order A, B, C.
    pub fn currents(&self) -> [Complex64; 3] {
        [self.ia, self.ib, self.ic]
    }

    pub fn voltage(&self, phase: Phase) -> Complex64 {
        self.get(ChannelId::voltage(phase))
    }

    pub fn current(&self, phase: Phase) -> Complex64 {
        self.get(ChannelId::current(phase))
    }

    /// Residual (3·I0) current: the phasor sum of the three phase currents.
    pub fn residual_current(&self) -> Complex64 {
        self.ia + self.ib + self.ic
    }
}

/// Zero-, positive-, and negative-sequence components of one three-phase
/// quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceSet {
    pub zero: Complex64,
    pub positive: Complex64,
    pub negative: Complex64,
}

/// Symmetrical components of voltage and current for one window, plus the
/// derived sequence-current ratios.
///
/// The ratios are NaN when the positive-sequence current is below the
/// degeneracy guard; consumers must treat NaN as "insufficient evidence",
/// never as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymmetricalComponents {
    pub voltage: SequenceSet,
    pub current: SequenceSet,
    /// |I2| / |I1|, NaN when |I1| is degenerate
    pub i2_i1_ratio: f64,
    /// |I0| / |I1|, NaN when |I1| is degenerate
    pub i0_i1_ratio: f64,
}

impl SymmetricalComponents {
    /// Whether the sequence-current ratios carry usable evidence.
    pub fn ratios_defined(&self) -> bool {
        self.i2_i1_ratio.is_finite() && self.i0_i1_ratio.is_finite()
    }
}
