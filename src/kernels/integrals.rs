//! Integrals of `P̄nm(t)` over a band `t ∈ [t1, t2]`, `t = sinφ`.
//!
//! * zonal (`m = 0`): from un-normalized Legendre polynomials,
//!   `∫P̄n0 = (P_{n+1} − P_{n−1}) / √(2n+1)`;
//! * sectorial: `I11`, `I22` in closed form, then
//!   `Imm = gm·I_{m−2,m−2} + (t·P̄mm)|/(m+1)`, prepared once per band;
//! * tesseral: `I_{m+1,m} = −anm/(m+2)·(u²P̄mm)|` and
//!   `Inm = hm·bnm·I_{n−2,m} − anm/(n+1)·(u²P̄_{n−1,m})|`,
//!
//! where `x|` is `x(t2) − x(t1)`.
use crate::constants::{PI_2, ROOT15, ROOT3};
use crate::lanes::Batch;
use crate::legendre::{OrderCoefficients, RecursionTables};

use super::BandRows;

/// `out[n] = ∫ P̄n0`, `n = 0..=nmax`.
pub fn zonal_integrals(tables: &RecursionTables, t1: Batch, t2: Batch, nmax: usize, out: &mut [Batch]) {
    let (en, fn_, ri) = (&tables.en, &tables.fn_, &tables.ri);

    out[0] = t2 - t1;

    // un-normalized P_{n-1}, P_n at both edges
    let (mut p0_1, mut p1_1) = (Batch::splat(1.0), t1);
    let (mut p0_2, mut p1_2) = (Batch::splat(1.0), t2);
    for n in 1..=nmax {
        let p2_1 = (t1 * p1_1) * en[n + 1] - p0_1 * fn_[n + 1];
        let p2_2 = (t2 * p1_2) * en[n + 1] - p0_2 * fn_[n + 1];

        out[n] = ((p2_2 - p0_2) - (p2_1 - p0_1)) * ri[2 * n + 1];

        p0_1 = p1_1;
        p1_1 = p2_1;
        p0_2 = p1_2;
        p1_2 = p2_2;
    }
}

/// Fill `band.imm[m] = ∫ P̄mm`, `m = 1..=nmax`, from the prepared sectorial chains.
pub fn sectorial_integrals(tables: &RecursionTables, band: &mut BandRows, nmax: usize) {
    let (t1, t2, u1, u2) = (band.t1, band.t2, band.u1, band.u2);
    let pi2 = Batch::splat(PI_2);
    let three = Batch::splat(3.0);

    for m in 1..=nmax {
        band.imm[m] = match m {
            1 => ((t2 * u2 - (pi2 - band.lat2)) - (t1 * u1 - (pi2 - band.lat1))) * (ROOT3 / 2.0),
            2 => (t2 * (three - t2 * t2) - t1 * (three - t1 * t1)) * (ROOT15 / 6.0),
            _ => {
                let pmm1 = Batch::from_fn(|l| band.sect1[l].get(m).to_f64());
                let pmm2 = Batch::from_fn(|l| band.sect2[l].get(m).to_f64());
                band.imm[m - 2] * tables.gm[m] + (t2 * pmm2 - t1 * pmm1) * (1.0 / (m + 1) as f64)
            }
        };
    }
}

/// `out[k] = ∫ P̄_{m+k,m}`, `k = 0..=nmax−m`, for `m ≥ 1`.
///
/// Arguments
/// -----------------
/// * `coeffs` – recurrence coefficients filled for order `m`.
/// * `col1`, `col2` – `P̄_{m..=nmax, m}` at the lower and upper band edge.
#[allow(clippy::too_many_arguments)]
pub fn tesseral_integrals(
    m: usize,
    nmax: usize,
    coeffs: &OrderCoefficients,
    tables: &RecursionTables,
    band: &BandRows,
    col1: &[Batch],
    col2: &[Batch],
    out: &mut [Batch],
) {
    let (anm, bnm) = (&coeffs.anm, &coeffs.bnm);
    let u1s = band.u1 * band.u1;
    let u2s = band.u2 * band.u2;

    out[0] = band.imm[m];
    if m == nmax {
        return;
    }
    out[1] = -((u2s * col2[0] - u1s * col1[0]) * (anm[m + 1] / (m + 2) as f64));

    for n in (m + 2)..=nmax {
        let k = n - m;
        out[k] = out[k - 2] * (tables.hm[n] * bnm[n])
            - (u2s * col2[k - 1] - u1s * col1[k - 1]) * (anm[n] / (n + 1) as f64);
    }
}
