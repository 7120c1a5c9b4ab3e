//! # flare-algo: Fault Analysis Algorithms
//!
//! The analytic pipeline that turns a calibrated [`flare_core::Record`]
//! into a fault classification, phasor and symmetrical-component
//! quantities, and ranked distance-to-fault estimates.
//!
//! ## Pipeline
//!
//! ```text
//! Record ──► FaultDetector ──► FaultClassification (type, window, confidence)
//!    │              │
//!    └──► PhasorEngine ──► PhasorSets (pre-fault, fault) + SymmetricalComponents
//!                   │
//!                   └──► FaultLocator ──► LocationResult per method
//! ```
//!
//! Data flows strictly forward; every stage consumes the complete output of
//! the previous one, and a single analysis run owns all of its entities.
//! The four location methods are independent pure functions of the same
//! inputs and run in parallel.
//!
//! ## Modules
//!
//! - [`phasor`] - one-cycle DFT phasor extraction and the Fortescue transform
//! - [`detector`] - RMS-profile onset/clearing detection and classification
//! - [`locator`] - impedance-based location strategies (reactance, Takagi,
//!   modified Takagi, estimated two-end)
//! - [`pipeline`] - the one-shot [`pipeline::analyze`] entry point
//! - [`test_utils`] - synthetic, circuit-consistent fault-record builder

pub mod detector;
pub mod locator;
pub mod phasor;
pub mod pipeline;
pub mod test_utils;

pub use detector::{DetectorConfig, FaultDetector};
pub use locator::{
    fault_loop, recommended_method, FaultLocator, LocationInputs, LocationStrategy, LoopSignals,
};
pub use phasor::{
    fundamental_phasor, reconstruct_phases, sequence_components, symmetrical_components,
    PhasorEngine, WindowPhasors, CURRENT_EPSILON,
};
pub use pipeline::{analyze, AnalysisReport, Analyzer, RecordSummary};
