//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "flare",
    about = "Transmission-line fault record analyzer",
    version
)]
pub struct Cli {
    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a COMTRADE event pair and report fault type and location
    Analyze {
        /// Configuration file (.cfg)
        cfg: PathBuf,
        /// Data file (.dat)
        dat: PathBuf,
        /// CT ratio, primary amps per 1 A secondary
        #[arg(long, default_value_t = 600.0)]
        ct_ratio: f64,
        /// VT ratio, primary volts per 115 V secondary
        #[arg(long, default_value_t = 600.0)]
        vt_ratio: f64,
        /// Line type, resolved through the built-in table (see `flare lines`)
        #[arg(long)]
        line_type: String,
        /// Line length in kilometers
        #[arg(long)]
        line_length: f64,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Parse a configuration file and print its header and channel table
    Inspect {
        /// Configuration file (.cfg)
        cfg: PathBuf,
    },
    /// List the built-in line types and their parameters
    Lines,
    /// Write a synthetic single-phase-to-ground event pair for validation
    Synth {
        /// Output directory for the .cfg/.dat pair
        #[arg(long, default_value = "sample_data")]
        out_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
