//! COMTRADE (IEEE C37.111-1991) file-pair parsing and writing.
//!
//! A COMTRADE event is stored as a configuration file (`.cfg`) describing
//! the channels, sample rate, and timestamps, paired with a data file
//! (`.dat`) holding one row of raw samples per sample index in either
//! ASCII or 16-bit binary form.

mod cfg;
mod dat;
mod writer;

pub use cfg::{parse_config, AnalogChannelLine, ComtradeConfig, DataFormat};
pub use dat::{parse_ascii_data, parse_binary_data, RawSamples};
pub use writer::{write_ascii_event, EventWaveforms};
