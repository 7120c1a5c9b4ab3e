//! # flare-core: Fault Record Data Model
//!
//! Fundamental data structures for transmission-line fault analysis:
//! calibrated event records, phasors and symmetrical components, fault
//! classifications, location results, and line parameters.
//!
//! ## Design Philosophy
//!
//! Every entity is created once by its owning pipeline stage and read-only
//! downstream:
//!
//! - **Record**: six calibrated analog channels (Va, Vb, Vc, Ia, Ib, Ic)
//!   in primary-referred engineering units
//! - **PhasorSet / SymmetricalComponents**: frequency-domain views over one
//!   analysis window
//! - **FaultClassification**: the detector's verdict (type, phases, window,
//!   confidence)
//! - **LocationResult**: one distance estimate per location method
//!
//! Channel identities, fault types, and location methods are closed enums
//! rather than string keys, so a "missing key" cannot occur at runtime.
//!
//! ## Integration
//!
//! The flare-io crate parses COMTRADE file pairs into [`Record`]s; the
//! flare-algo crate derives everything else. The
//! [`LineParameterProvider`] trait is the seam through which an outer
//! layer injects per-kilometer line impedances.

pub mod error;
pub mod fault;
pub mod line;
pub mod location;
pub mod phasor;
pub mod record;
pub mod settings;
pub mod units;

pub use error::{FlareError, FlareResult};
pub use fault::{Confidence, FaultClassification, FaultType};
pub use line::{LineParameterProvider, LineParameters};
pub use location::{LocationMethod, LocationResult};
pub use num_complex::Complex64;
pub use phasor::{PhasorSet, SequenceSet, SymmetricalComponents};
pub use record::{ChannelDefinition, ChannelId, ChannelKind, FaultWindow, Phase, Record};
pub use settings::AnalysisSettings;
pub use units::{Hertz, Kilometers, Milliseconds, Ohms};
