//! Point analysis kernel.
//!
//! The orchestrator reduces every latitude row to its weighted Fourier sums
//! `(a, b)` (and `(a2, b2)` for the mirrored row), stored in a [`Lumped`].
//! The kernel projects them on `P̄nm` of its order. With
//! `amp = a + a2` and `amm = a − a2`, even `n + m` take `amp` and odd take
//! `amm`, so one Legendre column serves both hemispheres.
use crate::lanes::Batch;
use crate::legendre::{fill_column, RecursionTables};

use super::{Lumped, OrderScratch, PointRows};

/// Add the contribution of a batch of rows to the columns `c`, `s` of order `m`.
///
/// Lanes of `sums` that hold no row (padding, or the `a2`/`b2` of a row
/// without mirror) must be zero.
#[allow(clippy::too_many_arguments)]
pub fn sha_point_kernel(
    m: usize,
    nmax: usize,
    tables: &RecursionTables,
    rows: &PointRows,
    sums: &Lumped,
    dynamic_switching: bool,
    scratch: &mut OrderScratch,
    c: &mut [f64],
    s: &mut [f64],
) {
    scratch.coeffs.fill(tables, m);
    fill_column(
        m,
        nmax,
        &scratch.coeffs,
        &rows.t,
        &rows.sect,
        dynamic_switching,
        &mut scratch.column,
    );
    project(m, nmax, &scratch.column, sums, c, s);
}

/// `c[k] += Σ_lanes v[k]·(a ± a2)`, `s[k] += Σ_lanes v[k]·(b ± b2)`, the sign
/// following the parity of `n + m`. Lanes are summed in order.
pub(crate) fn project(m: usize, nmax: usize, values: &[Batch], sums: &Lumped, c: &mut [f64], s: &mut [f64]) {
    let amp = sums.a + sums.a2;
    let amm = sums.a - sums.a2;
    let bmp = sums.b + sums.b2;
    let bmm = sums.b - sums.b2;

    for n in m..=nmax {
        let k = n - m;
        let (ac, bc) = if (n + m) % 2 == 0 { (amp, bmp) } else { (amm, bmm) };
        c[k] += (values[k] * ac).sum();
        if m > 0 {
            s[k] += (values[k] * bc).sum();
        }
    }
}
