//! FFT longitude summation with `realfft`.
//!
//! One plan per transform call, shared by every latitude row through an
//! [`Arc`]; each row brings its own spectrum, output and scratch buffers.
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::sh_errors::ShError;

/// Complex-to-real transform of lumped coefficients into a row of `nlon`
/// equally spaced values starting at `λ = 0`.
#[derive(Clone)]
pub struct FftSynthesis {
    plan: Arc<dyn ComplexToReal<f64>>,
}

impl FftSynthesis {
    pub fn new(nlon: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        FftSynthesis {
            plan: planner.plan_fft_inverse(nlon),
        }
    }

    pub fn len(&self) -> usize {
        self.plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.len() == 0
    }

    /// Write `Σ_{m ≤ nmax} a_m cos(mλ_j) + b_m sin(mλ_j)` into `out`.
    ///
    /// Bins above `nmax` (Nyquist included) stay zero; `nmax` must not exceed
    /// `(nlon − 1)/2`.
    pub fn row(
        &self,
        nmax: usize,
        pair: impl Fn(usize) -> (f64, f64),
        out: &mut [f64],
    ) -> Result<(), ShError> {
        let mut spectrum = self.plan.make_input_vec();
        for (m, bin) in spectrum.iter_mut().enumerate().take(nmax + 1) {
            let (a, b) = pair(m);
            let c = if m == 0 { 1.0 } else { 0.5 };
            *bin = Complex::new(a * c, -b * c);
        }
        spectrum[0].im = 0.0;

        let mut scratch = self.plan.make_scratch_vec();
        self.plan
            .process_with_scratch(&mut spectrum, out, &mut scratch)?;
        Ok(())
    }
}

/// Real-to-complex transform of a row of `nlon` values into the raw sums
/// `Σ_j f_j cos(mλ_j)` and `Σ_j f_j sin(mλ_j)`, `m = 0..=nmax`.
#[derive(Clone)]
pub struct FftAnalysis {
    plan: Arc<dyn RealToComplex<f64>>,
}

impl FftAnalysis {
    pub fn new(nlon: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        FftAnalysis {
            plan: planner.plan_fft_forward(nlon),
        }
    }

    /// Fill `cos_sum[m]` and `sin_sum[m]` for `m = 0..=nmax` from `row`.
    pub fn row(
        &self,
        row: &[f64],
        nmax: usize,
        cos_sum: &mut [f64],
        sin_sum: &mut [f64],
    ) -> Result<(), ShError> {
        let mut input = self.plan.make_input_vec();
        input.copy_from_slice(row);
        let mut spectrum = self.plan.make_output_vec();
        let mut scratch = self.plan.make_scratch_vec();
        self.plan
            .process_with_scratch(&mut input, &mut spectrum, &mut scratch)?;

        for m in 0..=nmax {
            cos_sum[m] = spectrum[m].re;
            sin_sum[m] = -spectrum[m].im;
        }
        Ok(())
    }
}
