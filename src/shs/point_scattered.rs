use smallvec::SmallVec;
use tracing::debug;

use crate::config::ShConfig;
use crate::coords::ScatteredPoints;
use crate::kernels::shs_point::{shs_point_kernels, Derivative};
use crate::kernels::{Lumped, OrderScratch, PointRows};
use crate::lanes::{Batch, LANES};
use crate::legendre::coefficients::try_zeroed;
use crate::legendre::RecursionTables;
use crate::parallel::for_each_chunk;
use crate::polar::skip_order;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;

use super::series_scale;

/// One value per point for every entry of `derivs`.
pub(super) fn synthesize(
    points: &ScatteredPoints,
    shcs: &ShCoeffs,
    nmax: usize,
    derivs: &[Derivative],
    config: &ShConfig,
) -> Result<Vec<Vec<f64>>, ShError> {
    let nder = derivs.len();
    debug!(npoints = points.len(), nder, "scattered point synthesis");
    if nder == 0 {
        return Ok(Vec::new());
    }
    let tables = RecursionTables::new(nmax);
    let scales: SmallVec<[f64; 9]> = derivs.iter().map(|d| series_scale(shcs, d.total())).collect();
    let extra = derivs.iter().map(|d| d.total()).max().unwrap_or(0);
    // point-major: the values of point `k` are `flat[k * nder..(k + 1) * nder]`
    let mut flat: Vec<f64> = try_zeroed(points.len() * nder)?;

    for_each_chunk(
        &mut flat,
        LANES * nder,
        || {
            Ok((
                PointRows::try_new(nmax, extra)?,
                OrderScratch::try_new(nmax)?,
                try_zeroed::<Lumped>(nder)?,
            ))
        },
        |(rows, scratch, lumped), k, chunk| {
            let first = k * LANES;
            let len = chunk.len() / nder;
            let idx = |l: usize| first + l.min(len - 1);
            let lat = Batch::from_fn(|l| points.lat[idx(l)]);
            let r = Batch::from_fn(|l| points.r[idx(l)]);
            let valid = std::array::from_fn(|l| l < len);
            rows.prepare(&tables, lat, r, shcs.r, valid, false);

            let mut acc: SmallVec<[f64; 9 * LANES]> = SmallVec::from_elem(0.0, LANES * nder);
            for m in 0..=nmax {
                if skip_order(m, nmax, &rows.u, &rows.valid, config) {
                    continue;
                }
                shs_point_kernels(
                    m,
                    nmax,
                    shcs,
                    &tables,
                    rows,
                    derivs,
                    config.dynamic_switching,
                    scratch,
                    lumped,
                );
                let mf = m as f64;
                for l in 0..len {
                    let (s, c) = (mf * points.lon[idx(l)]).sin_cos();
                    for (i, lc) in lumped.iter().enumerate() {
                        acc[l * nder + i] += lc.a[l] * c + lc.b[l] * s;
                    }
                }
            }
            for (j, v) in chunk.iter_mut().enumerate() {
                *v = scales[j % nder] * acc[j];
            }
        },
    )?;

    let mut f: Vec<Vec<f64>> = (0..nder)
        .map(|_| try_zeroed(points.len()))
        .collect::<Result<_, _>>()?;
    for (k, values) in flat.chunks_exact(nder).enumerate() {
        for (fi, v) in f.iter_mut().zip(values) {
            fi[k] = *v;
        }
    }
    Ok(f)
}

#[cfg(test)]
mod point_scattered_test {
    use super::*;
    use crate::coords::PointGrid;
    use approx::assert_relative_eq;

    #[test]
    fn test_scattered_matches_grid() {
        let nmax = 12;
        let shcs = ShCoeffs::from_fn(nmax, 1.0, 1.0, |n, m| (1.0 / (n + m + 1) as f64, 0.5 / (n + 1) as f64))
            .unwrap();
        let config = ShConfig::default();
        let grid = PointGrid::gauss_legendre(nmax, 1.3).unwrap();
        let fg = super::super::point_grid::synthesize(&grid, &shcs, nmax, &[Derivative::Value], &config)
            .unwrap()
            .remove(0);

        // every third grid point, in a shuffled order
        let nlon = grid.nlon();
        let picks: Vec<(usize, usize)> = (0..grid.nlat())
            .flat_map(|i| (0..nlon).step_by(3).map(move |j| (i, j)))
            .rev()
            .collect();
        let pts = ScatteredPoints::new(
            picks.iter().map(|&(i, _)| grid.lat[i]).collect(),
            picks.iter().map(|&(_, j)| grid.lon[j]).collect(),
            vec![1.3; picks.len()],
        )
        .unwrap();
        let fs = synthesize(&pts, &shcs, nmax, &[Derivative::Value], &config).unwrap().remove(0);
        for (v, &(i, j)) in fs.iter().zip(&picks) {
            assert_relative_eq!(*v, fg[i * grid.nlon() + j], epsilon = 1e-13);
        }
    }

    #[test]
    fn test_empty_set() {
        let shcs = ShCoeffs::new(2, 1.0, 1.0).unwrap();
        let pts = ScatteredPoints::new(vec![], vec![], vec![]).unwrap();
        let f = synthesize(&pts, &shcs, 2, &[Derivative::Value, Derivative::R], &ShConfig::default()).unwrap();
        assert_eq!(f.len(), 2);
        assert!(f.iter().all(Vec::is_empty));
    }
}
