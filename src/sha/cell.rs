use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::trace;

use crate::config::ShConfig;
use crate::constants::DPI;
use crate::coords::CellGrid;
use crate::kernels::sha_cell::sha_cell_kernel;
use crate::kernels::{BandRows, Lumped, OrderScratch};
use crate::lanes::{Batch, LANES};
use crate::legendre::coefficients::try_zeroed;
use crate::legendre::RecursionTables;
use crate::lonsum::fft::FftAnalysis;
use crate::parallel::for_each_order;
use crate::polar::skip_order_cells;
use crate::progress::BatchProgress;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;
use crate::symmetry::SymmetryLayout;

type RowSums = (usize, bool, Vec<f64>, Vec<f64>);

/// Replace the raw sums `A = Σ f_j cos mλ_j`, `B = Σ f_j sin mλ_j` over the
/// western cell edges `λ_j = jΔ` by the sums of `∫ cos mλ`, `∫ sin mλ` over
/// the cells.
fn integrate_row(a: &mut [f64], b: &mut [f64], width: f64) {
    a[0] *= width;
    b[0] = 0.0;
    for m in 1..a.len() {
        let mf = m as f64;
        let cm = ((mf * width).cos() - 1.0) / mf;
        let sm = (mf * width).sin() / mf;
        let (am, bm) = (a[m], b[m]);
        a[m] = am * sm + bm * cm;
        b[m] = -am * cm + bm * sm;
    }
}

pub(super) fn analyze(
    cells: &CellGrid,
    f: &[f64],
    nmax: usize,
    shcs: &mut ShCoeffs,
    config: &ShConfig,
) -> Result<(), ShError> {
    let layout = SymmetryLayout::for_cell_grid(cells, config.threshold2);
    let nlon = cells.nlon();
    let width = DPI / nlon as f64;
    let tables = RecursionTables::new(nmax);
    let fft = FftAnalysis::new(nlon);
    let factor = cells.r[0] / (2.0 * DPI * shcs.mu);

    let mut rows = BandRows::try_new(nmax)?;
    let mut sums: Vec<Lumped> = try_zeroed(nmax + 1)?;
    shcs.reset();
    let mut columns: Vec<_> = shcs.columns_mut().take(nmax + 1).collect();
    let mut progress = BatchProgress::new("sha_cell", layout.nbatches(), config.show_progress);

    for batch in layout.batches() {
        let latmin = Batch::from_fn(|l| cells.latmin[batch.rows[l]]);
        let latmax = Batch::from_fn(|l| cells.latmax[batch.rows[l]]);
        rows.prepare(
            &tables,
            latmin,
            latmax,
            Batch::splat(1.0),
            1.0,
            batch.valid,
            batch.any_mirror(),
        );
        trace!(batch = batch.index, rows = ?batch.rows, "cell analysis batch");

        let targets: SmallVec<[(usize, usize, bool); 2 * LANES]> = batch.targets().collect();
        let spectra: Vec<RowSums> = targets
            .par_iter()
            .map(|&(l, row, mirror)| -> Result<RowSums, ShError> {
                let mut a: Vec<f64> = try_zeroed(nmax + 1)?;
                let mut b: Vec<f64> = try_zeroed(nmax + 1)?;
                fft.row(&f[row * nlon..(row + 1) * nlon], nmax, &mut a, &mut b)?;
                integrate_row(&mut a, &mut b, width);
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
            || OrderScratch::try_new_bands(nmax),
            |scratch, m, (c, s)| {
                if skip_order_cells(m, nmax, &rows.lat1, &rows.lat2, &rows.valid, config) {
                    return;
                }
                sha_cell_kernel(
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
