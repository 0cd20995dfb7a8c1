use tracing::debug;

use crate::config::ShConfig;
use crate::coords::ScatteredCells;
use crate::kernels::shs_cell::shs_cell_kernel;
use crate::kernels::{BandRows, OrderScratch};
use crate::lanes::{Batch, LANES};
use crate::legendre::coefficients::try_zeroed;
use crate::legendre::RecursionTables;
use crate::lonsum::{fold_cell, LonPath};
use crate::parallel::for_each_chunk;
use crate::polar::skip_order_cells;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;

use super::series_scale;

pub(super) fn synthesize(
    cells: &ScatteredCells,
    shcs: &ShCoeffs,
    nmax: usize,
    config: &ShConfig,
) -> Result<Vec<f64>, ShError> {
    debug!(ncells = cells.len(), "scattered cell synthesis");
    let tables = RecursionTables::new(nmax);
    let scale = series_scale(shcs, 0);
    let mut f: Vec<f64> = try_zeroed(cells.len())?;

    for_each_chunk(
        &mut f,
        LANES,
        || Ok((BandRows::try_new(nmax)?, OrderScratch::try_new_bands(nmax)?)),
        |(rows, scratch), k, chunk| {
            let first = k * LANES;
            let len = chunk.len();
            let idx = |l: usize| first + l.min(len - 1);
            let latmin = Batch::from_fn(|l| cells.latmin[idx(l)]);
            let latmax = Batch::from_fn(|l| cells.latmax[idx(l)]);
            let r = Batch::from_fn(|l| cells.r[idx(l)]);
            let valid = std::array::from_fn(|l| l < len);
            rows.prepare(&tables, latmin, latmax, r, shcs.r, valid, false);

            let mut acc = [0.0; LANES];
            for m in 0..=nmax {
                if skip_order_cells(m, nmax, &rows.lat1, &rows.lat2, &rows.valid, config) {
                    continue;
                }
                let lc = shs_cell_kernel(m, nmax, shcs, &tables, rows, config.dynamic_switching, scratch);
                let mf = m as f64;
                for (l, v) in acc.iter_mut().enumerate().take(len) {
                    let (lo, hi) = (cells.lonmin[idx(l)], cells.lonmax[idx(l)]);
                    let (a, b) = fold_cell(m, lc.a[l], lc.b[l], hi - lo, LonPath::Pslr);
                    let (s, c) = (mf * 0.5 * (lo + hi)).sin_cos();
                    *v += a * c + b * s;
                }
            }

            let dt = rows.dt();
            for (l, v) in chunk.iter_mut().enumerate() {
                let area = dt[l] * (cells.lonmax[first + l] - cells.lonmin[first + l]);
                *v = scale * acc[l] / area;
            }
        },
    )?;
    Ok(f)
}
