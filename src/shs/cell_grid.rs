use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::ShConfig;
use crate::coords::CellGrid;
use crate::kernels::shs_cell::shs_cell_kernel;
use crate::kernels::{BandRows, Lumped, OrderScratch};
use crate::lanes::{Batch, LANES};
use crate::legendre::coefficients::try_zeroed;
use crate::legendre::RecursionTables;
use crate::lonsum::{fold_cell, select_cell_path, RowSummation};
use crate::parallel::for_each_order;
use crate::polar::skip_order_cells;
use crate::progress::BatchProgress;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;
use crate::symmetry::SymmetryLayout;

use super::series_scale;

pub(super) fn synthesize(
    grid: &CellGrid,
    shcs: &ShCoeffs,
    nmax: usize,
    config: &ShConfig,
) -> Result<Vec<f64>, ShError> {
    let sampling = select_cell_path(&grid.lonmin, &grid.lonmax, nmax, config)?;
    let layout = SymmetryLayout::for_cell_grid(grid, config.threshold2);
    let nlon = grid.nlon();
    debug!(
        nlat = grid.nlat(),
        nlon,
        symmetric = layout.symmetric,
        nlatdo = layout.nlatdo,
        "cell grid synthesis"
    );

    let tables = RecursionTables::new(nmax);
    let summation = RowSummation::new(&sampling);
    let scale = series_scale(shcs, 0);
    let (width, path) = (sampling.width, sampling.path);

    let mut f: Vec<f64> = try_zeroed(grid.ncells())?;
    let mut rows = BandRows::try_new(nmax)?;
    let mut lumped: Vec<Lumped> = try_zeroed(nmax + 1)?;
    let mut progress = BatchProgress::new("shs_cell_grid", layout.nbatches(), config.show_progress);

    for batch in layout.batches() {
        let latmin = Batch::from_fn(|l| grid.latmin[batch.rows[l]]);
        let latmax = Batch::from_fn(|l| grid.latmax[batch.rows[l]]);
        let r = Batch::from_fn(|l| grid.r[batch.rows[l]]);
        rows.prepare(&tables, latmin, latmax, r, shcs.r, batch.valid, batch.any_mirror());
        trace!(batch = batch.index, rows = ?batch.rows, "cell batch");

        let rows = &rows;
        for_each_order(
            &mut lumped,
            || OrderScratch::try_new_bands(nmax),
            |scratch, m, slot| {
                *slot = if skip_order_cells(m, nmax, &rows.lat1, &rows.lat2, &rows.valid, config) {
                    Lumped::default()
                } else {
                    shs_cell_kernel(m, nmax, shcs, &tables, rows, config.dynamic_switching, scratch)
                };
            },
        )?;

        let targets: SmallVec<[(usize, usize, bool); 2 * LANES]> = batch.targets().collect();
        let lumped = &lumped;
        let rendered: Vec<(usize, Vec<f64>)> = targets
            .par_iter()
            .map(|&(l, row, mirror)| -> Result<(usize, Vec<f64>), ShError> {
                let mut out: Vec<f64> = try_zeroed(nlon)?;
                summation.row(
                    nmax,
                    |m| {
                        let (a, b) = lumped[m].pair(l, mirror);
                        fold_cell(m, a, b, width, path)
                    },
                    &mut out,
                )?;
                let area = (grid.latmax[row].sin() - grid.latmin[row].sin()) * width;
                let row_scale = scale / area;
                out.iter_mut().for_each(|v| *v *= row_scale);
                Ok((row, out))
            })
            .collect::<Result<_, ShError>>()?;

        for (row, out) in rendered {
            f[row * nlon..(row + 1) * nlon].copy_from_slice(&out);
        }
        progress.tick();
    }
    progress.finish();
    Ok(f)
}

#[cfg(test)]
mod cell_grid_test {
    use super::*;
    use crate::config::LonSummation;
    use crate::coords::gauss_legendre_nodes;
    use crate::coords::ScatteredPoints;
    use crate::shs::point_scattered;
    use crate::kernels::shs_point::Derivative;
    use approx::assert_relative_eq;

    fn coeffs(nmax: usize) -> ShCoeffs {
        ShCoeffs::from_fn(nmax, 2.0, 1.0, |n, m| {
            (((n + 2 * m) as f64).cos() / (n + 1) as f64, ((n * m) as f64).sin() / (n + 1) as f64)
        })
        .unwrap()
    }

    /// Mean over a cell by a tensor Gauss–Legendre rule in `(φ, λ)`.
    fn cell_mean(shcs: &ShCoeffs, nmax: usize, lat: (f64, f64), lon: (f64, f64), r: f64) -> f64 {
        let (z, w) = gauss_legendre_nodes(24).unwrap();
        let (pm, ph) = (0.5 * (lat.0 + lat.1), 0.5 * (lat.1 - lat.0));
        let (lm, lh) = (0.5 * (lon.0 + lon.1), 0.5 * (lon.1 - lon.0));
        let mut nodes = Vec::new();
        for (zi, wi) in z.iter().zip(&w) {
            for (zj, wj) in z.iter().zip(&w) {
                let phi = pm + ph * zi;
                nodes.push((phi, lm + lh * zj, wi * wj * ph * lh * phi.cos()));
            }
        }
        let pts = ScatteredPoints::new(
            nodes.iter().map(|n| n.0).collect(),
            nodes.iter().map(|n| n.1).collect(),
            vec![r; nodes.len()],
        )
        .unwrap();
        let f = point_scattered::synthesize(&pts, shcs, nmax, &[Derivative::Value], &ShConfig::default())
            .unwrap()
            .remove(0);
        let integral: f64 = f.iter().zip(&nodes).map(|(v, n)| v * n.2).sum();
        integral / ((lat.1.sin() - lat.0.sin()) * (lon.1 - lon.0))
    }

    #[test]
    fn test_block_means_match_quadrature() {
        let nmax = 8;
        let shcs = coeffs(nmax);
        let grid = CellGrid::regular(6, 20, 1.5).unwrap();
        let config = ShConfig::default();
        let f = synthesize(&grid, &shcs, nmax, &config).unwrap();
        for i in 0..grid.nlat() {
            for j in [0, 7, 19] {
                let q = cell_mean(
                    &shcs,
                    nmax,
                    (grid.latmin[i], grid.latmax[i]),
                    (grid.lonmin[j], grid.lonmax[j]),
                    1.5,
                );
                assert_relative_eq!(f[i * 20 + j], q, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_fft_and_pslr_agree() {
        let nmax = 10;
        let shcs = coeffs(nmax);
        let grid = CellGrid::regular(7, 24, 1.0).unwrap();
        let fft = synthesize(&grid, &shcs, nmax, &ShConfig::default()).unwrap();
        let forced = ShConfig::builder().lon_summation(LonSummation::ForcePslr).build().unwrap();
        let pslr = synthesize(&grid, &shcs, nmax, &forced).unwrap();
        let fmax = fft.iter().fold(0.0f64, |a, v| a.max(v.abs()));
        for (a, b) in fft.iter().zip(&pslr) {
            assert!((a - b).abs() <= 1e-13 * fmax);
        }
    }
}
