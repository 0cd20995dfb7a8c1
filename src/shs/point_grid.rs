use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::ShConfig;
use crate::coords::PointGrid;
use crate::kernels::shs_point::{shs_point_kernels, Derivative};
use crate::kernels::{Lumped, OrderScratch, PointRows};
use crate::lanes::{Batch, LANES};
use crate::legendre::coefficients::try_zeroed;
use crate::legendre::RecursionTables;
use crate::lonsum::{select_point_path, RowSummation};
use crate::parallel::for_each_chunk;
use crate::polar::skip_order;
use crate::progress::BatchProgress;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;
use crate::symmetry::SymmetryLayout;

use super::series_scale;

/// One row-major `nlat × nlon` output per entry of `derivs`.
pub(super) fn synthesize(
    grid: &PointGrid,
    shcs: &ShCoeffs,
    nmax: usize,
    derivs: &[Derivative],
    config: &ShConfig,
) -> Result<Vec<Vec<f64>>, ShError> {
    let sampling = select_point_path(&grid.lon, nmax, config)?;
    let layout = SymmetryLayout::for_point_grid(grid, config.threshold2);
    let nlon = grid.nlon();
    let nder = derivs.len().max(1);
    debug!(
        nlat = grid.nlat(),
        nlon,
        nder,
        symmetric = layout.symmetric,
        nlatdo = layout.nlatdo,
        "point grid synthesis"
    );

    let tables = RecursionTables::new(nmax);
    let summation = RowSummation::new(&sampling);
    let scales: SmallVec<[f64; 9]> = derivs.iter().map(|d| series_scale(shcs, d.total())).collect();
    let extra = derivs.iter().map(|d| d.total()).max().unwrap_or(0);

    let mut f: Vec<Vec<f64>> = derivs
        .iter()
        .map(|_| try_zeroed(grid.npoints()))
        .collect::<Result<_, _>>()?;
    let mut rows = PointRows::try_new(nmax, extra)?;
    // order-major: the lumped sums of order `m` are `lumped[m * nder..(m + 1) * nder]`
    let mut lumped: Vec<Lumped> = try_zeroed((nmax + 1) * nder)?;
    let mut progress = BatchProgress::new("shs_point_grid", layout.nbatches(), config.show_progress);

    for batch in layout.batches() {
        let lat = Batch::from_fn(|l| grid.lat[batch.rows[l]]);
        let r = Batch::from_fn(|l| grid.r[batch.rows[l]]);
        rows.prepare(&tables, lat, r, shcs.r, batch.valid, batch.any_mirror());
        trace!(batch = batch.index, rows = ?batch.rows, "point batch");

        let rows = &rows;
        for_each_chunk(
            &mut lumped,
            nder,
            || OrderScratch::try_new(nmax),
            |scratch, m, slots| {
                if skip_order(m, nmax, &rows.u, &rows.valid, config) {
                    slots.fill(Lumped::default());
                } else {
                    shs_point_kernels(
                        m,
                        nmax,
                        shcs,
                        &tables,
                        rows,
                        derivs,
                        config.dynamic_switching,
                        scratch,
                        slots,
                    );
                }
            },
        )?;

        let targets: SmallVec<[(usize, usize, usize, bool); 2 * LANES]> = batch
            .targets()
            .flat_map(|(l, row, mirror)| (0..derivs.len()).map(move |i| (i, l, row, mirror)))
            .collect();
        let lumped = &lumped;
        let rendered: Vec<(usize, usize, Vec<f64>)> = targets
            .par_iter()
            .map(|&(i, l, row, mirror)| -> Result<(usize, usize, Vec<f64>), ShError> {
                let mut out: Vec<f64> = try_zeroed(nlon)?;
                summation.row(nmax, |m| lumped[m * nder + i].pair(l, mirror), &mut out)?;
                out.iter_mut().for_each(|v| *v *= scales[i]);
                Ok((i, row, out))
            })
            .collect::<Result<_, ShError>>()?;

        for (i, row, out) in rendered {
            f[i][row * nlon..(row + 1) * nlon].copy_from_slice(&out);
        }
        progress.tick();
    }
    progress.finish();
    Ok(f)
}
