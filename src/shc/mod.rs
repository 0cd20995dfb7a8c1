//! # Spherical harmonic coefficients
//!
//! [`ShCoeffs`] stores fully-normalized coefficients `C̄nm`, `S̄nm` up to a
//! maximum degree `nmax`, together with the scaling constant `mu` and the
//! reference radius `r` of the expansion
//!
//! ```text
//! f(r, φ, λ) = mu/r · Σ_n (r_ref/r)^n Σ_m P̄nm(sinφ) (C̄nm cos mλ + S̄nm sin mλ)
//! ```
//!
//! Storage is order-major: column `m` holds the degrees `n = m..=nmax`, so
//! a whole order is a contiguous slice. This is the layout the transforms
//! write into when each harmonic order is processed by its own task.
//!
//! ## Public API
//!
//! * construction: [`ShCoeffs::new`], [`ShCoeffs::from_fn`];
//! * access: [`ShCoeffs::c`], [`ShCoeffs::s`], [`ShCoeffs::set_c`], [`ShCoeffs::set_s`],
//!   [`ShCoeffs::c_column`], [`ShCoeffs::s_column`];
//! * [`ShCoeffs::rescale`] to a new `mu` and/or reference radius;
//! * degree variances and amplitudes, including differences of two sets;
//! * file formats in [`io_text`] (`mtx`, `tbl`, `dov`), [`io_gfc`] (ICGEM
//!   `gfc`, including time-variable models) and [`io_bin`] (`bin`).
//!
//! `S̄n0` do not contribute to any series and are kept at zero by every
//! reader and by the analysis.
pub mod io_bin;
pub mod io_gfc;
pub mod io_text;

use crate::constants::{Degree, Meter};
use crate::sh_errors::ShError;

/// Fully-normalized spherical harmonic coefficients up to degree `nmax`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShCoeffs {
    nmax: Degree,
    pub mu: f64,
    pub r: Meter,
    c: Vec<Vec<f64>>,
    s: Vec<Vec<f64>>,
}

impl ShCoeffs {
    /// Zero coefficients up to degree `nmax`.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::InvalidArgument)` if `mu` is not finite or `r` is not
    ///   finite and strictly positive.
    pub fn new(nmax: Degree, mu: f64, r: Meter) -> Result<Self, ShError> {
        if !mu.is_finite() {
            return Err(ShError::InvalidArgument(format!(
                "scaling constant mu = {mu} must be finite"
            )));
        }
        if !(r.is_finite() && r > 0.0) {
            return Err(ShError::InvalidArgument(format!(
                "reference radius r = {r} must be finite and positive"
            )));
        }
        let c = (0..=nmax).map(|m| vec![0.0; nmax + 1 - m]).collect();
        let s = (0..=nmax).map(|m| vec![0.0; nmax + 1 - m]).collect();
        Ok(ShCoeffs { nmax, mu, r, c, s })
    }

    /// Coefficients defined by `f(n, m) -> (C̄nm, S̄nm)`; `S̄n0` is forced to zero.
    pub fn from_fn(
        nmax: Degree,
        mu: f64,
        r: Meter,
        mut f: impl FnMut(usize, usize) -> (f64, f64),
    ) -> Result<Self, ShError> {
        let mut shcs = Self::new(nmax, mu, r)?;
        for m in 0..=nmax {
            for n in m..=nmax {
                let (c, s) = f(n, m);
                shcs.c[m][n - m] = c;
                shcs.s[m][n - m] = if m == 0 { 0.0 } else { s };
            }
        }
        Ok(shcs)
    }

    pub fn nmax(&self) -> Degree {
        self.nmax
    }

    /// Number of `(n, m)` pairs, `(nmax+1)(nmax+2)/2`.
    pub fn ncoeffs(&self) -> usize {
        (self.nmax + 1) * (self.nmax + 2) / 2
    }

    #[inline]
    pub fn c(&self, n: usize, m: usize) -> f64 {
        self.c[m][n - m]
    }

    #[inline]
    pub fn s(&self, n: usize, m: usize) -> f64 {
        self.s[m][n - m]
    }

    #[inline]
    pub fn set_c(&mut self, n: usize, m: usize, v: f64) {
        self.c[m][n - m] = v;
    }

    #[inline]
    pub fn set_s(&mut self, n: usize, m: usize, v: f64) {
        self.s[m][n - m] = v;
    }

    /// `C̄_{m..=nmax, m}`.
    #[inline]
    pub fn c_column(&self, m: usize) -> &[f64] {
        &self.c[m]
    }

    /// `S̄_{m..=nmax, m}`.
    #[inline]
    pub fn s_column(&self, m: usize) -> &[f64] {
        &self.s[m]
    }

    /// Mutable `(C̄, S̄)` columns of every order, for order-parallel writers.
    pub(crate) fn columns_mut(&mut self) -> impl Iterator<Item = (&mut Vec<f64>, &mut Vec<f64>)> {
        self.c.iter_mut().zip(self.s.iter_mut())
    }

    /// Set every coefficient to zero, keeping `mu` and `r`.
    pub fn reset(&mut self) {
        for (c, s) in self.columns_mut() {
            c.fill(0.0);
            s.fill(0.0);
        }
    }

    /// Re-express the coefficients with the constants `mu_new`, `r_new`:
    /// `C̄nm ← C̄nm · (mu/mu_new) · (r/r_new)^n`.
    pub fn rescale(&mut self, mu_new: f64, r_new: Meter) -> Result<(), ShError> {
        if !(mu_new.is_finite() && mu_new != 0.0) {
            return Err(ShError::InvalidArgument(format!(
                "new scaling constant mu = {mu_new} must be finite and non-zero"
            )));
        }
        if !(r_new.is_finite() && r_new > 0.0) {
            return Err(ShError::InvalidArgument(format!(
                "new reference radius r = {r_new} must be finite and positive"
            )));
        }
        let mu_ratio = self.mu / mu_new;
        let r_ratio = self.r / r_new;

        let mut factors = Vec::with_capacity(self.nmax + 1);
        let mut rpow = 1.0;
        for _ in 0..=self.nmax {
            factors.push(mu_ratio * rpow);
            rpow *= r_ratio;
        }
        for (m, (c, s)) in self.columns_mut().enumerate() {
            for (k, (ck, sk)) in c.iter_mut().zip(s.iter_mut()).enumerate() {
                *ck *= factors[m + k];
                *sk *= factors[m + k];
            }
        }
        self.mu = mu_new;
        self.r = r_new;
        Ok(())
    }

    /// Degree variances `σ²_n = Σ_m (C̄nm² + S̄nm²)`, `n = 0..=nmax`.
    pub fn degree_variances(&self) -> Vec<f64> {
        let mut dv = vec![0.0; self.nmax + 1];
        for m in 0..=self.nmax {
            for (k, (c, s)) in self.c[m].iter().zip(&self.s[m]).enumerate() {
                dv[m + k] += c * c + s * s;
            }
        }
        dv
    }

    /// Degree amplitudes `√σ²_n`.
    pub fn degree_amplitudes(&self) -> Vec<f64> {
        self.degree_variances().into_iter().map(f64::sqrt).collect()
    }

    /// Difference degree variances `Σ_m (ΔC̄nm² + ΔS̄nm²)` up to the lower of
    /// both maximum degrees.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::InvalidArgument)` if the two sets use different `mu` or `r`.
    pub fn difference_degree_variances(&self, other: &ShCoeffs) -> Result<Vec<f64>, ShError> {
        if self.mu != other.mu || self.r != other.r {
            return Err(ShError::InvalidArgument(
                "coefficient sets must share mu and r to be compared".into(),
            ));
        }
        let nmax = self.nmax.min(other.nmax);
        let mut ddv = vec![0.0; nmax + 1];
        for m in 0..=nmax {
            for n in m..=nmax {
                let dc = self.c(n, m) - other.c(n, m);
                let ds = self.s(n, m) - other.s(n, m);
                ddv[n] += dc * dc + ds * ds;
            }
        }
        Ok(ddv)
    }

    /// Difference degree amplitudes, square roots of
    /// [`ShCoeffs::difference_degree_variances`].
    pub fn difference_degree_amplitudes(&self, other: &ShCoeffs) -> Result<Vec<f64>, ShError> {
        Ok(self
            .difference_degree_variances(other)?
            .into_iter()
            .map(f64::sqrt)
            .collect())
    }
}

#[cfg(test)]
mod shc_test {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(nmax: usize) -> ShCoeffs {
        ShCoeffs::from_fn(nmax, 3.986004415e14, 6378136.3, |n, m| {
            (1.0 / (n + m + 1) as f64, 0.5 / (n + 1) as f64)
        })
        .unwrap()
    }

    #[test]
    fn test_layout_and_access() {
        let mut shcs = ShCoeffs::new(4, 1.0, 1.0).unwrap();
        assert_eq!(shcs.ncoeffs(), 15);
        assert_eq!(shcs.c_column(3).len(), 2);
        shcs.set_c(4, 3, 2.5);
        shcs.set_s(4, 3, -1.0);
        assert_eq!(shcs.c(4, 3), 2.5);
        assert_eq!(shcs.s_column(3), &[0.0, -1.0]);
        shcs.reset();
        assert_eq!(shcs.c(4, 3), 0.0);
    }

    #[test]
    fn test_from_fn_zeroes_sn0() {
        let shcs = sample(5);
        for n in 0..=5 {
            assert_eq!(shcs.s(n, 0), 0.0);
        }
        assert_eq!(shcs.s(3, 1), 0.125);
    }

    #[test]
    fn test_invalid_constants() {
        assert!(ShCoeffs::new(2, f64::NAN, 1.0).is_err());
        assert!(ShCoeffs::new(2, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_rescale() {
        let mut shcs = sample(6);
        let orig = shcs.clone();
        shcs.rescale(2.0 * orig.mu, 0.5 * orig.r).unwrap();
        for m in 0..=6 {
            for n in m..=6 {
                let f = 0.5 * 2f64.powi(n as i32);
                assert_relative_eq!(shcs.c(n, m), orig.c(n, m) * f, max_relative = 1e-15);
                assert_relative_eq!(shcs.s(n, m), orig.s(n, m) * f, max_relative = 1e-15);
            }
        }
        shcs.rescale(orig.mu, orig.r).unwrap();
        let dda = shcs.difference_degree_amplitudes(&orig).unwrap();
        assert!(dda.iter().all(|d| *d < 1e-15));
    }

    #[test]
    fn test_degree_variances() {
        let shcs = ShCoeffs::from_fn(2, 1.0, 1.0, |n, m| (n as f64, m as f64)).unwrap();
        // n = 1: C10 = 1, C11 = 1, S11 = 1
        // n = 2: C20 = 2, C21 = 2, S21 = 1, C22 = 2, S22 = 2
        assert_eq!(shcs.degree_variances(), vec![0.0, 3.0, 17.0]);
        assert_eq!(shcs.degree_amplitudes()[1], 3f64.sqrt());
    }

    #[test]
    fn test_difference_degree_variances() {
        let a = sample(4);
        let mut b = sample(6);
        b.set_c(3, 2, b.c(3, 2) + 1e-3);
        let ddv = a.difference_degree_variances(&b).unwrap();
        assert_eq!(ddv.len(), 5);
        assert_relative_eq!(ddv[3], 1e-6, max_relative = 1e-9);
        assert_eq!(ddv[2], 0.0);

        let other = ShCoeffs::new(4, 1.0, 1.0).unwrap();
        assert!(a.difference_degree_variances(&other).is_err());
    }
}
