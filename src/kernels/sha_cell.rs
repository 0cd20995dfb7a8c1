//! Cell analysis kernel: projection of block means on the band integrals.
use crate::legendre::RecursionTables;

use super::sha_point::project;
use super::shs_cell::band_integrals;
use super::{BandRows, Lumped, OrderScratch};

/// Add the contribution of a batch of cell rows to the columns `c`, `s` of
/// order `m`. `sums` carries the longitude-integrated row sums, zero on lanes
/// without a row.
#[allow(clippy::too_many_arguments)]
pub fn sha_cell_kernel(
    m: usize,
    nmax: usize,
    tables: &RecursionTables,
    rows: &BandRows,
    sums: &Lumped,
    dynamic_switching: bool,
    scratch: &mut OrderScratch,
    c: &mut [f64],
    s: &mut [f64],
) {
    band_integrals(m, nmax, tables, rows, dynamic_switching, scratch);
    project(m, nmax, &scratch.integrals, sums, c, s);
}
