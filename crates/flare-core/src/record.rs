//! Calibrated event records.
//!
//! A [`Record`] is the full calibrated disturbance event: six analog
//! channels (Va, Vb, Vc, Ia, Ib, Ic) in primary-referred engineering units,
//! sampled uniformly at a fixed rate. Records are immutable after
//! construction and owned exclusively by one analysis run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{FlareError, FlareResult};
use crate::units::{Hertz, Milliseconds};

/// One of the three phase conductors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical quantity carried by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Voltage,
    Current,
}

/// The six analog channels of a record, as a closed set.
///
/// The original recording environment addressed channels through
/// string-keyed maps; a closed enum eliminates the missing-key failure
/// mode entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    Va,
    Vb,
    Vc,
    Ia,
    Ib,
    Ic,
}

impl ChannelId {
    pub const ALL: [ChannelId; 6] = [
        ChannelId::Va,
        ChannelId::Vb,
        ChannelId::Vc,
        ChannelId::Ia,
        ChannelId::Ib,
        ChannelId::Ic,
    ];

    /// The phase conductor this channel monitors.
    pub fn phase(&self) -> Phase {
        match self {
            ChannelId::Va | ChannelId::Ia => Phase::A,
            ChannelId::Vb | ChannelId::Ib => Phase::B,
            ChannelId::Vc | ChannelId::Ic => Phase::C,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelId::Va | ChannelId::Vb | ChannelId::Vc => ChannelKind::Voltage,
            ChannelId::Ia | ChannelId::Ib | ChannelId::Ic => ChannelKind::Current,
        }
    }

    /// Voltage channel for a phase.
    pub fn voltage(phase: Phase) -> ChannelId {
        match phase {
            Phase::A => ChannelId::Va,
            Phase::B => ChannelId::Vb,
            Phase::C => ChannelId::Vc,
        }
    }

    /// Current channel for a phase.
    pub fn current(phase: Phase) -> ChannelId {
        match phase {
            Phase::A => ChannelId::Ia,
            Phase::B => ChannelId::Ib,
            Phase::C => ChannelId::Ic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::Va => "Va",
            ChannelId::Vb => "Vb",
            ChannelId::Vc => "Vc",
            ChannelId::Ia => "Ia",
            ChannelId::Ib => "Ib",
            ChannelId::Ic => "Ic",
        }
    }

    fn slot(&self) -> usize {
        match self {
            ChannelId::Va => 0,
            ChannelId::Vb => 1,
            ChannelId::Vc => 2,
            ChannelId::Ia => 3,
            ChannelId::Ib => 4,
            ChannelId::Ic => 5,
        }
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable metadata for one analog channel as declared by the recorder.
///
/// `multiplier`/`offset` convert a raw stored sample to secondary
/// engineering units (`value = raw * multiplier + offset`); `ratio` is the
/// instrument-transformer ratio converting secondary to primary line-side
/// units. The ratio applied at load time is the operator-supplied CT/VT
/// ratio, which overrides the recorder's embedded `primary_ratio /
/// secondary_ratio` tap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDefinition {
    /// 1-based channel index from the configuration file
    pub index: usize,
    /// Channel name as recorded (e.g. "Va", "IA-1")
    pub name: String,
    /// Nominal phase label
    pub phase: Phase,
    /// Voltage or current
    pub kind: ChannelKind,
    /// Linear calibration multiplier (raw → secondary units)
    pub multiplier: f64,
    /// Linear calibration offset (raw → secondary units)
    pub offset: f64,
    /// Instrument-transformer ratio applied at load time (secondary → primary)
    pub ratio: f64,
    /// Primary ratio embedded in the configuration file (informational)
    pub primary_ratio: f64,
    /// Secondary ratio embedded in the configuration file (informational)
    pub secondary_ratio: f64,
}

impl ChannelDefinition {
    /// Validate the ratio invariant. The calibration multiplier may be any
    /// value including zero, but a non-positive transformer ratio cannot
    /// refer a measurement to the primary side.
    pub fn validate(&self) -> FlareResult<()> {
        if self.ratio <= 0.0 {
            return Err(FlareError::Config(format!(
                "channel {} ({}): transformer ratio must be > 0, got {}",
                self.index, self.name, self.ratio
            )));
        }
        Ok(())
    }

    /// Convert a raw stored sample to primary-referred engineering units.
    #[inline]
    pub fn to_primary(&self, raw: f64) -> f64 {
        (raw * self.multiplier + self.offset) * self.ratio
    }
}

/// The full calibrated event: six equal-length channels at a uniform
/// sample rate, plus recorder timestamps.
///
/// Immutable after construction; every derived entity (phasors,
/// classification, locations) is computed from it without mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    sample_rate: Hertz,
    nominal_freq: Hertz,
    /// Time of the first data sample
    start_time: NaiveDateTime,
    /// Recorder trigger time (the event timestamp surfaced in reports)
    trigger_time: NaiveDateTime,
    channels: Vec<Vec<f64>>,
    definitions: Vec<ChannelDefinition>,
    n_samples: usize,
}

impl Record {
    /// Build a record from six primary-referred channel sequences, ordered
    /// Va, Vb, Vc, Ia, Ib, Ic.
    ///
    /// Fails when the sample rate is non-positive, fewer than two samples
    /// are present, or the channels disagree on length.
    pub fn new(
        sample_rate: Hertz,
        nominal_freq: Hertz,
        start_time: NaiveDateTime,
        trigger_time: NaiveDateTime,
        channels: [Vec<f64>; 6],
        definitions: Vec<ChannelDefinition>,
    ) -> FlareResult<Self> {
        if sample_rate.value() <= 0.0 {
            return Err(FlareError::Parse(format!(
                "sample rate must be positive, got {}",
                sample_rate.value()
            )));
        }
        if nominal_freq.value() <= 0.0 {
            return Err(FlareError::Parse(format!(
                "nominal frequency must be positive, got {}",
                nominal_freq.value()
            )));
        }
        let n = channels[0].len();
        if n < 2 {
            return Err(FlareError::Parse(format!(
                "record must contain at least 2 samples, got {n}"
            )));
        }
        if let Some(bad) = channels.iter().position(|c| c.len() != n) {
            return Err(FlareError::Parse(format!(
                "channel {} has {} samples, expected {}",
                ChannelId::ALL[bad],
                channels[bad].len(),
                n
            )));
        }
        for def in &definitions {
            def.validate()?;
        }
        Ok(Self {
            sample_rate,
            nominal_freq,
            start_time,
            trigger_time,
            channels: channels.into_iter().collect(),
            definitions,
            n_samples: n,
        })
    }

    pub fn sample_rate(&self) -> Hertz {
        self.sample_rate
    }

    pub fn nominal_freq(&self) -> Hertz {
        self.nominal_freq
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn trigger_time(&self) -> NaiveDateTime {
        self.trigger_time
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn definitions(&self) -> &[ChannelDefinition] {
        &self.definitions
    }

    /// Samples of one channel, in primary-referred engineering units.
    pub fn channel(&self, id: ChannelId) -> &[f64] {
        &self.channels[id.slot()]
    }

    /// Number of samples covering one cycle of the nominal frequency.
    pub fn samples_per_cycle(&self) -> usize {
        self.sample_rate.samples_per_cycle(self.nominal_freq)
    }

    /// Total record duration.
    pub fn duration_ms(&self) -> Milliseconds {
        Milliseconds::from_samples(self.n_samples, self.sample_rate)
    }

    /// Elapsed time of a sample index from the start of the record.
    pub fn sample_ms(&self, index: usize) -> Milliseconds {
        Milliseconds::from_samples(index, self.sample_rate)
    }
}

/// Sample-index interval `[onset, clear)` identifying the disturbance.
///
/// Derived by the fault detector; never constructed independently of a
/// record scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultWindow {
    onset: usize,
    clear: usize,
}

impl FaultWindow {
    /// `onset <= clear <= n_samples` must hold.
    pub fn new(onset: usize, clear: usize, n_samples: usize) -> FlareResult<Self> {
        if onset > clear || clear > n_samples {
            return Err(FlareError::Other(format!(
                "invalid fault window [{onset}, {clear}) for {n_samples} samples"
            )));
        }
        Ok(Self { onset, clear })
    }

    pub fn onset(&self) -> usize {
        self.onset
    }

    pub fn clear(&self) -> usize {
        self.clear
    }

    pub fn len(&self) -> usize {
        self.clear - self.onset
    }

    pub fn is_empty(&self) -> bool {
        self.clear == self.onset
    }

    pub fn onset_ms(&self, record: &Record) -> Milliseconds {
        record.sample_ms(self.onset)
    }

    pub fn clear_ms(&self, record: &Record) -> Milliseconds {
        record.sample_ms(self.clear)
    }

    pub fn duration_ms(&self, record: &Record) -> Milliseconds {
        Milliseconds::from_samples(self.len(), record.sample_rate())
    }
}
