//! Cell synthesis kernel: block means of the series over latitude bands.
//!
//! The Legendre functions of the point kernel are replaced by their
//! integrals over each band. The division by the cell area and the
//! longitude integration are left to the orchestrator.
use crate::legendre::{fill_column, RecursionTables};
use crate::shc::ShCoeffs;

use super::integrals::{tesseral_integrals, zonal_integrals};
use super::{BandRows, Lumped, OrderScratch};

/// Lumped band integrals of order `m` for a batch of cell rows.
///
/// `scratch` must come from [`OrderScratch::try_new_bands`].
pub fn shs_cell_kernel(
    m: usize,
    nmax: usize,
    shcs: &ShCoeffs,
    tables: &RecursionTables,
    rows: &BandRows,
    dynamic_switching: bool,
    scratch: &mut OrderScratch,
) -> Lumped {
    band_integrals(m, nmax, tables, rows, dynamic_switching, scratch);

    let cm = shcs.c_column(m);
    let sm = shcs.s_column(m);
    let mut lc = Lumped::default();
    for n in m..=nmax {
        let k = n - m;
        let imn = scratch.integrals[k];
        let rp = rows.rpows[n + 1];
        let tc = rp * (imn * cm[k]);
        let ts = rp * (imn * sm[k]);
        lc.a += tc;
        lc.b += ts;

        if rows.mirror {
            if (n + m) % 2 == 0 {
                lc.a2 += tc;
                lc.b2 += ts;
            } else {
                lc.a2 = lc.a2 - tc;
                lc.b2 = lc.b2 - ts;
            }
        }
    }
    lc
}

/// Fill `scratch.integrals[k] = ∫ P̄_{m+k,m}` over the bands of `rows`.
pub(crate) fn band_integrals(
    m: usize,
    nmax: usize,
    tables: &RecursionTables,
    rows: &BandRows,
    dynamic_switching: bool,
    scratch: &mut OrderScratch,
) {
    if m == 0 {
        zonal_integrals(tables, rows.t1, rows.t2, nmax, &mut scratch.integrals);
        return;
    }
    scratch.coeffs.fill(tables, m);
    fill_column(
        m,
        nmax,
        &scratch.coeffs,
        &rows.t1,
        &rows.sect1,
        dynamic_switching,
        &mut scratch.column,
    );
    fill_column(
        m,
        nmax,
        &scratch.coeffs,
        &rows.t2,
        &rows.sect2,
        dynamic_switching,
        &mut scratch.column2,
    );
    tesseral_integrals(
        m,
        nmax,
        &scratch.coeffs,
        tables,
        rows,
        &scratch.column,
        &scratch.column2,
        &mut scratch.integrals,
    );
}

#[cfg(test)]
mod shs_cell_test {
    use super::*;
    use crate::lanes::{Batch, LANES};
    use approx::assert_relative_eq;

    fn band(tables: &RecursionTables, lat1: f64, lat2: f64) -> BandRows {
        let mut rows = BandRows::try_new(tables.nmax).unwrap();
        rows.prepare(
            tables,
            Batch::splat(lat1),
            Batch::splat(lat2),
            Batch::splat(1.0),
            1.0,
            [true; LANES],
            true,
        );
        rows
    }

    #[test]
    fn test_mirror_band_matches_reflected_band() {
        let nmax = 10;
        let tables = RecursionTables::new(nmax);
        let shcs = ShCoeffs::from_fn(nmax, 1.0, 1.0, |n, m| ((n + 2 * m) as f64 * 0.3, (n as f64).cos())).unwrap();
        let north = band(&tables, 0.2, 0.5);
        let south = band(&tables, -0.5, -0.2);
        let mut scratch = OrderScratch::try_new_bands(nmax).unwrap();

        for m in 0..=nmax {
            let n_lc = shs_cell_kernel(m, nmax, &shcs, &tables, &north, true, &mut scratch);
            let s_lc = shs_cell_kernel(m, nmax, &shcs, &tables, &south, true, &mut scratch);
            assert_relative_eq!(n_lc.a2[0], s_lc.a[0], epsilon = 1e-14, max_relative = 1e-12);
            assert_relative_eq!(n_lc.b2[0], s_lc.b[0], epsilon = 1e-14, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_constant_field_band_integral() {
        // only C00 = 1: the band integral of P̄00 is sinφ2 − sinφ1
        let nmax = 4;
        let tables = RecursionTables::new(nmax);
        let shcs = ShCoeffs::from_fn(nmax, 1.0, 1.0, |n, _| (if n == 0 { 1.0 } else { 0.0 }, 0.0)).unwrap();
        let rows = band(&tables, -0.1, 0.6);
        let mut scratch = OrderScratch::try_new_bands(nmax).unwrap();
        let lc = shs_cell_kernel(0, nmax, &shcs, &tables, &rows, true, &mut scratch);
        assert_relative_eq!(lc.a[0], 0.6f64.sin() - (-0.1f64).sin(), max_relative = 1e-15);
    }
}
