//! # Transform configuration
//!
//! This module defines the [`ShConfig`](crate::config::ShConfig) struct and its builder. It
//! replaces the process-wide tunables of classical spherical harmonic libraries by an explicit
//! value threaded through every transform call.
//!
//! ## Purpose
//!
//! [`ShConfig`] controls:
//!
//! - the **tolerances** used to recognise quadrature grids, FFT-compatible longitude sampling and
//!   equatorial symmetry (`threshold`, `threshold2`),
//! - the **polar optimization** (`polar_a1`, `polar_a2`), disabled by default,
//! - the **X-number dynamic switching** of the Legendre recurrences,
//! - the **longitude summation** strategy (FFT when possible, or always PSLR),
//! - the **thread pool** used for the parallel loop over harmonic orders,
//! - the optional **progress bar** (feature `progress`).
//!
//! ## Example
//!
//! ```rust
//! use sphharm::config::{LonSummation, ShConfig};
//!
//! let config = ShConfig::builder()
//!     .polar_a1(50)
//!     .polar_a2(0.01)
//!     .lon_summation(LonSummation::ForcePslr)
//!     .num_threads(2)
//!     .build()
//!     .unwrap();
//!
//! assert!(config.polar_optimization_enabled());
//! ```
//!
//! ## See also
//!
//! * [`crate::polar::skip_order`] – consumes `polar_a1`/`polar_a2`
//! * [`crate::lonsum`] – consumes `lon_summation`
//! * [`crate::parallel`] – consumes `num_threads`
use std::cmp::Ordering::{Equal, Greater, Less};

use crate::constants::{POLAR_A1, POLAR_A2, THRESHOLD, THRESHOLD2};
use crate::sh_errors::ShError;

/// Strategy used to sum the lumped coefficients along a latitude circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LonSummation {
    /// FFT whenever the longitude sampling permits it, PSLR otherwise.
    #[default]
    Auto,
    /// Always use the recursive PSLR algorithm.
    ForcePslr,
}

/// Tunable parameters of a spherical harmonic transform.
///
/// Fields
/// -----------------
/// * `threshold` – tight tolerance for float comparisons (grid origin, span, radii).
/// * `threshold2` – loose tolerance for user-grid symmetry and longitude step checks.
/// * `polar_a1`, `polar_a2` – order `m` is skipped at a latitude batch when
///   `m - nmax·cos(φ) > polar_a1 + polar_a2·nmax` holds for every latitude of the batch.
///   A negative `polar_a2` disables the optimization.
/// * `dynamic_switching` – leave the X-number arithmetic once all exponents settle at zero.
/// * `lon_summation` – see [`LonSummation`].
/// * `num_threads` – `None` runs on rayon's global pool, `Some(n)` on a dedicated pool.
/// * `show_progress` – draw a progress bar over latitude batches (feature `progress`).
///
/// See also
/// -----------------
/// * [`ShConfigBuilder`] – validating builder.
#[derive(Debug, Clone)]
pub struct ShConfig {
    pub threshold: f64,
    pub threshold2: f64,

    // --- Polar optimization ---
    pub polar_a1: u64,
    pub polar_a2: f64,

    // --- Numerics ---
    pub dynamic_switching: bool,
    pub lon_summation: LonSummation,

    // --- Execution ---
    pub num_threads: Option<usize>,
    pub show_progress: bool,
}

impl ShConfig {
    /// Construct a new [`ShConfig`] with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`ShConfigBuilder`] initialized with the default values.
    pub fn builder() -> ShConfigBuilder {
        ShConfigBuilder::new()
    }

    /// `true` if the polar optimization is active (`polar_a2 ≥ 0`).
    pub fn polar_optimization_enabled(&self) -> bool {
        self.polar_a2 >= 0.0
    }

    /// Threshold `a1 + a2·nmax` of the polar optimization.
    pub fn polar_threshold(&self, nmax: usize) -> f64 {
        self.polar_a1 as f64 + self.polar_a2 * nmax as f64
    }
}

impl Default for ShConfig {
    fn default() -> Self {
        ShConfig {
            threshold: THRESHOLD,
            threshold2: THRESHOLD2,

            polar_a1: POLAR_A1,
            polar_a2: POLAR_A2,

            dynamic_switching: true,
            lon_summation: LonSummation::Auto,

            num_threads: None,
            show_progress: false,
        }
    }
}

/// Builder for [`ShConfig`], with validation.
#[derive(Debug, Clone)]
pub struct ShConfigBuilder {
    config: ShConfig,
}

impl Default for ShConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShConfigBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            config: ShConfig::default(),
        }
    }

    pub fn threshold(mut self, v: f64) -> Self {
        self.config.threshold = v;
        self
    }
    pub fn threshold2(mut self, v: f64) -> Self {
        self.config.threshold2 = v;
        self
    }
    pub fn polar_a1(mut self, v: u64) -> Self {
        self.config.polar_a1 = v;
        self
    }
    pub fn polar_a2(mut self, v: f64) -> Self {
        self.config.polar_a2 = v;
        self
    }
    pub fn dynamic_switching(mut self, v: bool) -> Self {
        self.config.dynamic_switching = v;
        self
    }
    pub fn lon_summation(mut self, v: LonSummation) -> Self {
        self.config.lon_summation = v;
        self
    }
    pub fn num_threads(mut self, v: usize) -> Self {
        self.config.num_threads = Some(v);
        self
    }
    pub fn show_progress(mut self, v: bool) -> Self {
        self.config.show_progress = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff a <= b and comparable (i.e., not NaN).
    #[inline]
    fn le(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
    }

    /// Finalize the builder and produce a [`ShConfig`].
    ///
    /// Validation rules
    /// -----------------
    /// * `threshold > 0`, `threshold2 > 0`, both finite.
    /// * `threshold ≤ threshold2`.
    /// * `polar_a2` is not NaN (any negative value disables the optimization).
    /// * `num_threads ≥ 1` when set.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(ShConfig)` if all values are valid.
    /// * `Err(ShError::InvalidConfig)` otherwise.
    pub fn build(self) -> Result<ShConfig, ShError> {
        let c = &self.config;

        if !Self::gt0(c.threshold) || !c.threshold.is_finite() {
            return Err(ShError::InvalidConfig(
                "threshold must be finite and > 0".into(),
            ));
        }
        if !Self::gt0(c.threshold2) || !c.threshold2.is_finite() {
            return Err(ShError::InvalidConfig(
                "threshold2 must be finite and > 0".into(),
            ));
        }
        if !Self::le(c.threshold, c.threshold2) {
            return Err(ShError::InvalidConfig(
                "threshold must not exceed threshold2".into(),
            ));
        }
        if c.polar_a2.is_nan() {
            return Err(ShError::InvalidConfig("polar_a2 must not be NaN".into()));
        }
        if c.num_threads == Some(0) {
            return Err(ShError::InvalidConfig("num_threads must be >= 1".into()));
        }

        Ok(self.config)
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShConfig::default();
        assert_eq!(config.threshold, 100.0 * f64::EPSILON);
        assert_eq!(config.threshold2, 1e5 * f64::EPSILON);
        assert_eq!(config.polar_a1, 100);
        assert!(!config.polar_optimization_enabled());
        assert!(config.dynamic_switching);
        assert_eq!(config.lon_summation, LonSummation::Auto);
        assert_eq!(config.num_threads, None);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ShConfig::builder()
            .polar_a1(10)
            .polar_a2(0.5)
            .num_threads(3)
            .dynamic_switching(false)
            .build()
            .unwrap();
        assert!(config.polar_optimization_enabled());
        assert_eq!(config.polar_threshold(100), 60.0);
        assert_eq!(config.num_threads, Some(3));
        assert!(!config.dynamic_switching);
    }

    #[test]
    fn test_builder_rejects_invalid_values() {
        assert_eq!(
            ShConfig::builder().threshold(-1.0).build().unwrap_err(),
            ShError::InvalidConfig("threshold must be finite and > 0".into())
        );
        assert_eq!(
            ShConfig::builder().threshold(1e-3).threshold2(1e-6).build().unwrap_err(),
            ShError::InvalidConfig("threshold must not exceed threshold2".into())
        );
        assert!(ShConfig::builder().threshold2(f64::NAN).build().is_err());
        assert!(ShConfig::builder().polar_a2(f64::NAN).build().is_err());
        assert!(ShConfig::builder().num_threads(0).build().is_err());
    }
}
