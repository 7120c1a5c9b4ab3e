//! Compile-time unit safety for the quantities the pipeline passes around.
//!
//! Prevents mixing incompatible units like hertz and kilometers at API
//! boundaries. Result structs keep plain `f64` fields with unit-suffixed
//! names; the newtypes guard the inputs that cross crate boundaries.
//!
//! All types use `#[repr(transparent)]` so they have the same memory layout
//! as `f64` and the wrappers optimize away.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Mul<$type> for f64 {
            type Output = $type;
            fn mul(self, rhs: $type) -> Self::Output {
                <$type>::new(self * rhs.0)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Absolute value
            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Minimum of two values
            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// Maximum of two values
            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Clamp value to range
            #[inline]
            pub fn clamp(self, min: Self, max: Self) -> Self {
                Self(self.0.clamp(min.0, max.0))
            }
        }
    };
}

/// Frequency in hertz (Hz)
///
/// Used for both the digitizer sample rate and the nominal system frequency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Hertz(pub f64);

impl_unit_ops!(Hertz, "Hz");

/// Distance along the line in kilometers (km)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilometers(pub f64);

impl_unit_ops!(Kilometers, "km");

/// Impedance magnitude or resistance in ohms (Ω)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Ohms(pub f64);

impl_unit_ops!(Ohms, "Ω");

/// Elapsed time in milliseconds (ms)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Milliseconds(pub f64);

impl_unit_ops!(Milliseconds, "ms");

impl Hertz {
    /// Period of one cycle at this frequency, in seconds.
    #[inline]
    pub fn period_s(self) -> f64 {
        1.0 / self.0
    }

    /// Number of samples covering one cycle of `fundamental` at this
    /// sample rate, rounded to the nearest integer.
    #[inline]
    pub fn samples_per_cycle(self, fundamental: Hertz) -> usize {
        (self.0 / fundamental.0).round() as usize
    }
}

impl Milliseconds {
    /// Elapsed time for `samples` samples at `rate`.
    #[inline]
    pub fn from_samples(samples: usize, rate: Hertz) -> Self {
        Milliseconds(samples as f64 / rate.0 * 1000.0)
    }
}
