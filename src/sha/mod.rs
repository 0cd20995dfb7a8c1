//! # Spherical harmonic analysis
//!
//! Recover `C̄nm`, `S̄nm` up to degree `nmax` from samples on a sphere:
//!
//! * [`sha_point`] integrates point values on a quadrature grid
//!   (Gauss–Legendre or Driscoll–Healy) with the grid weights;
//! * [`sha_cell`] integrates block means over a complete cell grid
//!   covering the sphere (an approximate quadrature).
//!
//! Both use one real FFT per latitude row, then spread the orders over the
//! rayon pool exactly like synthesis. The coefficients are computed on the
//! sphere of the samples, then rescaled to the reference radius held by the
//! output coefficients.
//!
//! Analysis always sums over longitude with the FFT: a quadrature grid
//! always carries enough equally spaced longitudes, so
//! [`crate::config::ShConfig::lon_summation`] is not consulted.
mod cell;
mod point;

use tracing::{debug, warn};

use crate::config::ShConfig;
use crate::constants::{is_nearly_equal, Degree, DPI, PI_2};
use crate::coords::{CellGrid, PointGrid};
use crate::parallel;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;

/// Analyse the point values `f` sampled on a quadrature grid.
///
/// Arguments
/// -----------------
/// * `grid` – Gauss–Legendre or Driscoll–Healy grid with a single radius.
/// * `f` – row-major `nlat × nlon` values.
/// * `nmax` – maximum degree of the analysis, at most the grid degree.
/// * `shcs` – output; `shcs.mu` and `shcs.r` are kept and define the scaling
///   of the result, every coefficient is overwritten (those above `nmax` are
///   set to zero).
///
/// Return
/// ----------
/// * `Err(ShError::InvalidGrid)` for a user grid or a grid without weights.
/// * `Err(ShError::DegreeTooHigh)` if `nmax` exceeds the grid degree or `shcs`.
/// * `Err(ShError::RadiusMismatch)` if the rows lie on different spheres.
/// * `Err(ShError::InvalidArgument)` for a wrong number of values or `mu = 0`.
///
/// # Example
///
/// ```rust
/// use sphharm::config::ShConfig;
/// use sphharm::coords::PointGrid;
/// use sphharm::sha::sha_point;
/// use sphharm::shc::ShCoeffs;
///
/// let grid = PointGrid::gauss_legendre(3, 1.0).unwrap();
/// let f = vec![2.0; grid.npoints()];
/// let mut shcs = ShCoeffs::new(3, 1.0, 1.0).unwrap();
/// sha_point(&grid, &f, 3, &mut shcs, &ShConfig::default()).unwrap();
/// assert!((shcs.c(0, 0) - 2.0).abs() < 1e-14);
/// ```
pub fn sha_point(
    grid: &PointGrid,
    f: &[f64],
    nmax: Degree,
    shcs: &mut ShCoeffs,
    config: &ShConfig,
) -> Result<(), ShError> {
    if !grid.kind.is_quadrature() {
        return Err(ShError::InvalidGrid(
            "point analysis needs a Gauss-Legendre or Driscoll-Healy grid".into(),
        ));
    }
    let (Some(gnmax), Some(w)) = (grid.nmax, grid.w.as_deref()) else {
        return Err(ShError::InvalidGrid(
            "quadrature grid without degree or weights".into(),
        ));
    };
    if nmax > gnmax {
        return Err(ShError::DegreeTooHigh {
            requested: nmax,
            available: gnmax,
        });
    }
    if gnmax > nmax {
        warn!(grid_nmax = gnmax, nmax, "analysis grid resolves higher degrees than requested");
    }
    check_output(nmax, shcs)?;
    check_values(f.len(), grid.npoints())?;
    let r0 = common_radius(&grid.r, config)?;

    debug!(kind = ?grid.kind, nmax, nlat = grid.nlat(), nlon = grid.nlon(), "point analysis");
    parallel::install(config, || point::analyze(grid, w, f, nmax, shcs, config))??;
    finish(shcs, r0)
}

/// Analyse the block means `f` of a cell grid covering the whole sphere.
///
/// The grid needs `nlat ≥ nmax + 1` rows from the north to the south pole
/// and `nlon ≥ 2·nmax + 1` contiguous, equally wide columns starting at
/// `λ = 0`.
///
/// Return
/// ----------
/// * `Err(ShError::InvalidGrid)` if the cells do not tile the sphere as
///   described above.
/// * see [`sha_point`] for the remaining errors.
pub fn sha_cell(
    cells: &CellGrid,
    f: &[f64],
    nmax: Degree,
    shcs: &mut ShCoeffs,
    config: &ShConfig,
) -> Result<(), ShError> {
    let (nlat, nlon) = (cells.nlat(), cells.nlon());
    if nlat < nmax + 1 || nlon < 2 * nmax + 1 {
        return Err(ShError::InvalidGrid(format!(
            "{nlat} x {nlon} cells cannot resolve degree {nmax}"
        )));
    }
    check_output(nmax, shcs)?;
    check_values(f.len(), cells.ncells())?;
    let r0 = common_radius(&cells.r, config)?;
    check_cell_tiling(cells, config)?;

    debug!(nmax, nlat, nlon, "cell analysis");
    parallel::install(config, || cell::analyze(cells, f, nmax, shcs, config))??;
    finish(shcs, r0)
}

fn check_output(nmax: Degree, shcs: &ShCoeffs) -> Result<(), ShError> {
    if nmax > shcs.nmax() {
        return Err(ShError::DegreeTooHigh {
            requested: nmax,
            available: shcs.nmax(),
        });
    }
    if !(shcs.mu.is_finite() && shcs.mu != 0.0) {
        return Err(ShError::InvalidArgument(format!(
            "scaling constant mu = {} must be finite and non-zero",
            shcs.mu
        )));
    }
    Ok(())
}

fn check_values(got: usize, expected: usize) -> Result<(), ShError> {
    if got != expected {
        return Err(ShError::InvalidArgument(format!(
            "expected {expected} sampled values, got {got}"
        )));
    }
    Ok(())
}

fn common_radius(r: &[f64], config: &ShConfig) -> Result<f64, ShError> {
    let r0 = r[0];
    if r.iter().all(|ri| is_nearly_equal(*ri, r0, config.threshold * r0)) {
        Ok(r0)
    } else {
        Err(ShError::RadiusMismatch)
    }
}

fn check_cell_tiling(cells: &CellGrid, config: &ShConfig) -> Result<(), ShError> {
    let eps = config.threshold;
    let (nlat, nlon) = (cells.nlat(), cells.nlon());
    let dlon = cells.lonmax[0] - cells.lonmin[0];

    let lon_ok = is_nearly_equal(cells.lonmin[0], 0.0, eps)
        && is_nearly_equal(cells.lonmax[nlon - 1], DPI, eps)
        && (0..nlon).all(|j| {
            is_nearly_equal(cells.lonmin[j], dlon * j as f64, config.threshold2)
                && is_nearly_equal(cells.lonmax[j] - cells.lonmin[j], dlon, config.threshold2)
        })
        && (1..nlon).all(|j| is_nearly_equal(cells.lonmax[j - 1], cells.lonmin[j], eps));
    if !lon_ok {
        return Err(ShError::InvalidGrid(
            "cell columns must be contiguous, equally wide and span [0, 2pi]".into(),
        ));
    }

    let lat_ok = is_nearly_equal(cells.latmax[0], PI_2, eps)
        && is_nearly_equal(cells.latmin[nlat - 1], -PI_2, eps)
        && (1..nlat).all(|i| is_nearly_equal(cells.latmin[i - 1], cells.latmax[i], eps));
    if !lat_ok {
        return Err(ShError::InvalidGrid(
            "cell rows must be contiguous from the north to the south pole".into(),
        ));
    }
    Ok(())
}

/// Coefficients are computed at radius `r0`; move them to the reference
/// radius the caller asked for.
fn finish(shcs: &mut ShCoeffs, r0: f64) -> Result<(), ShError> {
    let (mu, r_ref) = (shcs.mu, shcs.r);
    shcs.r = r0;
    shcs.rescale(mu, r_ref)
}

#[cfg(test)]
mod sha_test {
    use super::*;

    #[test]
    fn test_point_analysis_validation() {
        let config = ShConfig::default();
        let grid = PointGrid::gauss_legendre(4, 1.0).unwrap();
        let f = vec![0.0; grid.npoints()];
        let mut shcs = ShCoeffs::new(6, 1.0, 1.0).unwrap();

        assert_eq!(
            sha_point(&grid, &f, 5, &mut shcs, &config).unwrap_err(),
            ShError::DegreeTooHigh {
                requested: 5,
                available: 4
            }
        );
        let mut small = ShCoeffs::new(2, 1.0, 1.0).unwrap();
        assert_eq!(
            sha_point(&grid, &f, 3, &mut small, &config).unwrap_err(),
            ShError::DegreeTooHigh {
                requested: 3,
                available: 2
            }
        );
        assert!(matches!(
            sha_point(&grid, &f[1..], 4, &mut shcs, &config),
            Err(ShError::InvalidArgument(_))
        ));

        let mut bumpy = grid.clone();
        bumpy.r[2] = 1.1;
        assert_eq!(
            sha_point(&bumpy, &f, 4, &mut shcs, &config).unwrap_err(),
            ShError::RadiusMismatch
        );

        let custom = PointGrid::custom_sphere(vec![0.1, -0.1], vec![0.0, 1.0], 1.0).unwrap();
        assert!(matches!(
            sha_point(&custom, &[0.0; 4], 0, &mut shcs, &config),
            Err(ShError::InvalidGrid(_))
        ));

        let mut zero_mu = ShCoeffs::new(4, 0.0, 1.0).unwrap();
        assert!(matches!(
            sha_point(&grid, &f, 4, &mut zero_mu, &config),
            Err(ShError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_cell_analysis_validation() {
        let config = ShConfig::default();
        let mut shcs = ShCoeffs::new(4, 1.0, 1.0).unwrap();

        let coarse = CellGrid::regular(4, 9, 1.0).unwrap();
        assert!(matches!(
            sha_cell(&coarse, &vec![0.0; coarse.ncells()], 4, &mut shcs, &config),
            Err(ShError::InvalidGrid(_))
        ));

        let grid = CellGrid::regular(5, 9, 1.0).unwrap();
        let mut partial = grid.clone();
        partial.latmax[0] = 1.5;
        assert!(matches!(
            sha_cell(&partial, &vec![0.0; grid.ncells()], 4, &mut shcs, &config),
            Err(ShError::InvalidGrid(_))
        ));

        let mut gap = grid.clone();
        gap.lonmax[3] -= 0.01;
        assert!(matches!(
            sha_cell(&gap, &vec![0.0; grid.ncells()], 4, &mut shcs, &config),
            Err(ShError::InvalidGrid(_))
        ));

        assert!(sha_cell(&grid, &vec![0.0; grid.ncells()], 4, &mut shcs, &config).is_ok());
    }

    #[test]
    fn test_constant_field() {
        let config = ShConfig::default();
        let grid = PointGrid::driscoll_healy2(5, 3.0).unwrap();
        let f = vec![1.5; grid.npoints()];
        let mut shcs = ShCoeffs::new(5, 3.0, 3.0).unwrap();
        sha_point(&grid, &f, 5, &mut shcs, &config).unwrap();
        // f = mu/r · C00 on the sphere r = R
        assert!((shcs.c(0, 0) - 1.5).abs() < 1e-14);
        for n in 1..=5 {
            for m in 0..=n {
                assert!(shcs.c(n, m).abs() < 1e-14);
                assert!(shcs.s(n, m).abs() < 1e-14);
            }
        }
    }
}
