use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::trace;

use crate::config::ShConfig;
use crate::constants::DPI;
use crate::coords::PointGrid;
use crate::kernels::sha_point::sha_point_kernel;
use crate::kernels::{Lumped, OrderScratch, PointRows};
use crate::lanes::{Batch, LANES};
use crate::legendre::coefficients::try_zeroed;
use crate::legendre::RecursionTables;
use crate::lonsum::fft::FftAnalysis;
use crate::parallel::for_each_order;
use crate::polar::skip_order;
use crate::progress::BatchProgress;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;
use crate::symmetry::SymmetryLayout;

/// Weighted Fourier sums of one row: `(lane, mirror, a_m, b_m)`.
type RowSums = (usize, bool, Vec<f64>, Vec<f64>);

pub(super) fn analyze(
    grid: &PointGrid,
    w: &[f64],
    f: &[f64],
    nmax: usize,
    shcs: &mut ShCoeffs,
    config: &ShConfig,
) -> Result<(), ShError> {
    let layout = SymmetryLayout::for_point_grid(grid, config.threshold2);
    let nlon = grid.nlon();
    let tables = RecursionTables::new(nmax);
    let fft = FftAnalysis::new(nlon);
    let dlon = DPI / nlon as f64;
    let factor = grid.r[0] / (2.0 * DPI * shcs.mu);

    let mut rows = PointRows::try_new(nmax, 0)?;
    let mut sums: Vec<Lumped> = try_zeroed(nmax + 1)?;
    shcs.reset();
    let mut columns: Vec<_> = shcs.columns_mut().take(nmax + 1).collect();
    let mut progress = BatchProgress::new("sha_point", layout.nbatches(), config.show_progress);

    for batch in layout.batches() {
        let lat = Batch::from_fn(|l| grid.lat[batch.rows[l]]);
        rows.prepare(&tables, lat, Batch::splat(1.0), 1.0, batch.valid, batch.any_mirror());
        trace!(batch = batch.index, rows = ?batch.rows, "analysis batch");

        let targets: SmallVec<[(usize, usize, bool); 2 * LANES]> = batch.targets().collect();
        let spectra: Vec<RowSums> = targets
            .par_iter()
            .map(|&(l, row, mirror)| -> Result<RowSums, ShError> {
                let mut a: Vec<f64> = try_zeroed(nmax + 1)?;
                let mut b: Vec<f64> = try_zeroed(nmax + 1)?;
                fft.row(&f[row * nlon..(row + 1) * nlon], nmax, &mut a, &mut b)?;
                let weight = w[row] * dlon;
                a.iter_mut().chain(b.iter_mut()).for_each(|v| *v *= weight);
                Ok((l, mirror, a, b))
            })
            .collect::<Result<_, ShError>>()?;

        sums.fill(Lumped::default());
        for (l, mirror, a, b) in spectra {
            for (m, s) in sums.iter_mut().enumerate() {
                if mirror {
                    s.a2[l] = a[m];
                    s.b2[l] = b[m];
                } else {
                    s.a[l] = a[m];
                    s.b[l] = b[m];
                }
            }
        }

        let (rows, sums) = (&rows, &sums);
        for_each_order(
            &mut columns,
            || OrderScratch::try_new(nmax),
            |scratch, m, (c, s)| {
                if skip_order(m, nmax, &rows.u, &rows.valid, config) {
                    return;
                }
                sha_point_kernel(
                    m,
                    nmax,
                    &tables,
                    rows,
                    &sums[m],
                    config.dynamic_switching,
                    scratch,
                    c,
                    s,
                );
            },
        )?;
        progress.tick();
    }
    progress.finish();

    for (c, s) in columns.iter_mut() {
        c.iter_mut().chain(s.iter_mut()).for_each(|v| *v *= factor);
    }
    Ok(())
}
