//! # flare-io: COMTRADE Record I/O
//!
//! Parses COMTRADE (IEEE C37.111-1991) configuration/data file pairs into
//! calibrated [`flare_core::Record`]s, and writes synthetic event pairs for
//! validation.
//!
//! ## Modules
//!
//! - [`comtrade`] - configuration and data file parsing, plus the ASCII writer
//! - [`loader`] - channel matching, calibration, and Record assembly
//!
//! File I/O is confined to this crate: the analytic core never touches the
//! filesystem, and the loader retains no handles after returning.

pub mod comtrade;
pub mod loader;

pub use comtrade::{AnalogChannelLine, ComtradeConfig, DataFormat, RawSamples};
pub use loader::{load_record, load_record_from_parts};
