//! Unified error types for the flare ecosystem
//!
//! This module provides a common error type [`FlareError`] that can represent
//! errors from any stage of an analysis run. Stage-specific failures convert
//! to `FlareError` for uniform handling at API boundaries.
//!
//! # Example
//!
//! ```ignore
//! use flare_core::{FlareError, FlareResult};
//!
//! fn analyze_event(cfg: &str, dat: &str) -> FlareResult<()> {
//!     let record = load_record(cfg, dat)?;
//!     run_pipeline(&record)?;
//!     Ok(())
//! }
//! ```
//!
//! Numeric degeneracy (near-zero denominators in ratio or impedance
//! divisions) is intentionally absent: it is recovered in place with NaN
//! sentinels and lowered confidence, so only conditions that terminate a
//! stage appear in this enum.

use thiserror::Error;

/// Unified error type for all fault-analysis operations.
///
/// Each variant is attributable to a single pipeline stage; no stage masks
/// another stage's failure by fabricating default numeric results.
#[derive(Error, Debug)]
pub enum FlareError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or internally inconsistent configuration/data files.
    /// Fatal for the run; no partial Record is produced.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Fewer samples than a one-cycle window needs, or no usable analysis
    /// window. Non-fatal for the pipeline: classification degrades to
    /// Unknown/Low and location is skipped.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The line parameter provider has no entry for the requested type.
    /// The locator refuses to run rather than silently defaulting.
    #[error("Unsupported line type: {0}")]
    UnsupportedLineType(String),

    /// Operator-supplied configuration errors (non-positive ratios, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using FlareError.
pub type FlareResult<T> = Result<T, FlareError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for FlareError {
    fn from(err: anyhow::Error) -> Self {
        FlareError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for FlareError {
    fn from(s: String) -> Self {
        FlareError::Other(s)
    }
}

impl From<&str> for FlareError {
    fn from(s: &str) -> Self {
        FlareError::Other(s.to_string())
    }
}

// JSON serialization errors
impl From<serde_json::Error> for FlareError {
    fn from(err: serde_json::Error) -> Self {
        FlareError::Parse(err.to_string())
    }
}
