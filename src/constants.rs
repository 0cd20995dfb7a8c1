//! # Constants and type definitions for sphharm
//!
//! This module centralizes the **numerical constants** of the extended-range
//! Legendre recurrences and the **type aliases** used across the crate.
//!
//! ## Overview
//!
//! - X-number scaling constants (`BIG`, `BIGI`, `BIGS`, `BIGSI`)
//! - Closed-form seeds of the Legendre recurrences (`ROOT3`, `ROOT15`)
//! - Default numerical tolerances (`THRESHOLD`, `THRESHOLD2`)
//! - Polar optimization defaults
//! - Unit aliases
//!
//! The X-number constants follow Fukushima (2012): a value is stored as
//! `x · BIG^ix` and renormalized whenever `|x|` leaves `[BIGSI, BIGS)`.
//! All four constants are exact powers of two so that rescaling never rounds.

// -------------------------------------------------------------------------------------------------
// Extended-range arithmetic
// -------------------------------------------------------------------------------------------------

/// Exponent (base 2) of [`BIG`].
pub const IND: i32 = 960;

/// `2^960`, the radix of the X-number exponent counter.
pub const BIG: f64 = f64::from_bits(((1023 + IND) as u64) << 52);

/// `2^-960`, the inverse of [`BIG`].
pub const BIGI: f64 = f64::from_bits(((1023 - IND) as u64) << 52);

/// `2^480`, upper renormalization bound of an X-number mantissa.
pub const BIGS: f64 = f64::from_bits(((1023 + IND / 2) as u64) << 52);

/// `2^-480`, lower renormalization bound of an X-number mantissa.
pub const BIGSI: f64 = f64::from_bits(((1023 - IND / 2) as u64) << 52);

/// √3, the normalization factor of P̄10 and P̄11
pub const ROOT3: f64 = 1.732_050_807_568_877_2;

/// √15
pub const ROOT15: f64 = 3.872_983_346_207_417;

// -------------------------------------------------------------------------------------------------
// Tolerances and tunables
// -------------------------------------------------------------------------------------------------

/// Default tight tolerance used to compare floats (grid origin, radii, ...).
pub const THRESHOLD: f64 = 100.0 * f64::EPSILON;

/// Default loose tolerance (user grid symmetry, constant longitude step).
pub const THRESHOLD2: f64 = 100_000.0 * f64::EPSILON;

/// Default additive term of the polar optimization threshold.
pub const POLAR_A1: u64 = 100;

/// Default slope of the polar optimization threshold (negative → disabled).
pub const POLAR_A2: f64 = -1.0;

/// 2π
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// π/2
pub const PI_2: f64 = std::f64::consts::FRAC_PI_2;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in radians
pub type Radian = f64;
/// Distance in meters (or any length unit consistent with the coefficients)
pub type Meter = f64;
/// Harmonic degree or order
pub type Degree = usize;

/// Returns `true` if `a` and `b` differ by at most `eps`.
#[inline]
pub fn is_nearly_equal(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}
