//! # Spherical harmonic synthesis
//!
//! Evaluate the series
//!
//! ```text
//! f(r, φ, λ) = mu/r · Σ_{n ≤ nmax} (R/r)^n Σ_m P̄nm(sinφ) (C̄nm cos mλ + S̄nm sin mλ)
//! ```
//!
//! at points ([`shs_point`], [`shs_point_derivative`]), as the gradient or
//! the second-order tensor at points ([`shs_point_grad1`], [`shs_point_grad2`])
//! or as block means over cells ([`shs_cell`]). `R` is the reference radius of the coefficients.
//!
//! Pipeline of a grid transform
//! -----------------
//! 1. longitude path ([`crate::lonsum`]) and symmetry layout ([`crate::symmetry`]);
//! 2. for every lane batch of processed rows, the orders are spread over the
//!    rayon pool, each order task filling its own lumped slot
//!    ([`crate::parallel::for_each_order`]);
//! 3. the rows of the batch (and their mirrors) are summed over longitude in
//!    parallel and written to the row-major output.
//!
//! Scattered points and cells are split into lane-sized chunks processed in
//! parallel, each chunk running the order loop sequentially.
//!
//! The output is identical for any number of threads.
mod cell_grid;
mod cell_scattered;
mod point_grid;
mod point_scattered;

pub use crate::kernels::shs_point::Derivative;

use tracing::debug;

use crate::config::ShConfig;
use crate::constants::{is_nearly_equal, Degree, PI_2};
use crate::coords::{CellSet, PointSet};
use crate::legendre::coefficients::try_zeroed;
use crate::parallel;
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;

/// Synthesize the values of `shcs` up to degree `nmax` at `points`.
///
/// Arguments
/// -----------------
/// * `points` – a [`crate::coords::PointGrid`] (output `nlat × nlon`, row-major)
///   or scattered points (one value per point).
/// * `shcs` – coefficients, `shcs.nmax() ≥ nmax`.
/// * `nmax` – maximum degree of the synthesis.
/// * `config` – transform parameters.
///
/// Return
/// ----------
/// * The synthesized values.
/// * `Err(ShError::DegreeTooHigh)` if `nmax` exceeds the coefficients.
/// * `Err(ShError::InvalidGrid)` if grid longitudes are not equally spaced.
/// * `Err(ShError::ScratchAllocation)` if an order task could not get its scratch.
///
/// # Example
///
/// ```rust
/// use sphharm::config::ShConfig;
/// use sphharm::coords::PointGrid;
/// use sphharm::shc::ShCoeffs;
/// use sphharm::shs::shs_point;
///
/// let shcs = ShCoeffs::from_fn(2, 1.0, 1.0, |n, _| (if n == 0 { 1.0 } else { 0.0 }, 0.0)).unwrap();
/// let grid = PointGrid::gauss_legendre(2, 1.0).unwrap();
/// let f = shs_point(&grid.into(), &shcs, 2, &ShConfig::default()).unwrap();
/// assert!(f.iter().all(|v| (v - 1.0).abs() < 1e-15));
/// ```
pub fn shs_point(
    points: &PointSet,
    shcs: &ShCoeffs,
    nmax: Degree,
    config: &ShConfig,
) -> Result<Vec<f64>, ShError> {
    shs_point_derivative(points, shcs, nmax, Derivative::Value, config)
}

/// [`shs_point`] for one member of the derivative family, see [`Derivative`].
///
/// Return
/// ----------
/// * `Err(ShError::InvalidArgument)` for a latitudinal or longitudinal
///   derivative requested at a pole.
pub fn shs_point_derivative(
    points: &PointSet,
    shcs: &ShCoeffs,
    nmax: Degree,
    deriv: Derivative,
    config: &ShConfig,
) -> Result<Vec<f64>, ShError> {
    let mut f = synthesize_points(points, shcs, nmax, &[deriv], config)?;
    Ok(f.pop().unwrap_or_default())
}

/// Gradient of the series in the local north-east-up frame, `[g_n, g_e, g_u]`.
///
/// ```text
/// g_n = (1/r) ∂f/∂φ,   g_e = 1/(r cosφ) ∂f/∂λ,   g_u = ∂f/∂r
/// ```
///
/// These are [`Derivative::Lat`], [`Derivative::Lon`] and [`Derivative::R`],
/// bit-identical to three [`shs_point_derivative`] calls but computed with a
/// single Legendre recurrence per order.
///
/// Return
/// ----------
/// * `Err(ShError::InvalidArgument)` if a point lies at a pole.
/// * see [`shs_point`] for the remaining errors.
pub fn shs_point_grad1(
    points: &PointSet,
    shcs: &ShCoeffs,
    nmax: Degree,
    config: &ShConfig,
) -> Result<[Vec<f64>; 3], ShError> {
    let f = synthesize_points(points, shcs, nmax, &GRAD1, config)?;
    let [gn, ge, gu]: [Vec<f64>; 3] = f
        .try_into()
        .map_err(|_| ShError::InvalidArgument("gradient synthesis lost a component".into()))?;
    Ok([gn, ge, gu])
}

/// Second-order tensor of the series in the local north-east-up frame.
///
/// The six independent components are returned as
/// `[t_nn, t_ne, t_nu, t_ee, t_eu, t_uu]`. With `V_φ`, `V_λ`, … the scaled
/// derivatives of [`Derivative`] (so `V_φ = (1/r) ∂f/∂φ`):
///
/// ```text
/// t_nn = V_φφ + V_r/r                 t_ee = V_λλ + V_r/r − tanφ V_φ/r
/// t_ne = V_φλ + tanφ V_λ/r            t_eu = V_rλ − V_λ/r
/// t_nu = V_rφ − V_φ/r                 t_uu = V_rr
/// ```
///
/// The trace is the Laplacian of the series and vanishes outside the masses.
/// All nine derivatives share one Legendre recurrence per order.
///
/// Return
/// ----------
/// * `Err(ShError::InvalidArgument)` if a point lies at a pole.
/// * see [`shs_point`] for the remaining errors.
pub fn shs_point_grad2(
    points: &PointSet,
    shcs: &ShCoeffs,
    nmax: Degree,
    config: &ShConfig,
) -> Result<[Vec<f64>; 6], ShError> {
    let f = synthesize_points(points, shcs, nmax, &GRAD2, config)?;
    let [v_lat, v_lon, v_r, v_latlat, v_latlon, v_lonlon, v_rlat, v_rlon, v_rr]: [Vec<f64>; 9] = f
        .try_into()
        .map_err(|_| ShError::InvalidArgument("tensor synthesis lost a component".into()))?;

    let npoints = points.npoints();
    let mut t: [Vec<f64>; 6] = Default::default();
    for ti in t.iter_mut() {
        *ti = try_zeroed(npoints)?;
    }
    for k in 0..npoints {
        let (lat, r) = point_lat_r(points, k);
        let tan = lat.tan();
        t[0][k] = v_latlat[k] + v_r[k] / r;
        t[1][k] = v_latlon[k] + tan * v_lon[k] / r;
        t[2][k] = v_rlat[k] - v_lat[k] / r;
        t[3][k] = v_lonlon[k] + v_r[k] / r - tan * v_lat[k] / r;
        t[4][k] = v_rlon[k] - v_lon[k] / r;
        t[5][k] = v_rr[k];
    }
    Ok(t)
}

const GRAD1: [Derivative; 3] = [Derivative::Lat, Derivative::Lon, Derivative::R];

const GRAD2: [Derivative; 9] = [
    Derivative::Lat,
    Derivative::Lon,
    Derivative::R,
    Derivative::LatLat,
    Derivative::LatLon,
    Derivative::LonLon,
    Derivative::RLat,
    Derivative::RLon,
    Derivative::RR,
];

/// Latitude and radius of point `k` in output order.
fn point_lat_r(points: &PointSet, k: usize) -> (f64, f64) {
    match points {
        PointSet::Grid(g) => {
            let i = k / g.nlon().max(1);
            (g.lat[i], g.r[i])
        }
        PointSet::Scattered(s) => (s.lat[k], s.r[k]),
    }
}

/// One output per derivative, all sharing the Legendre recurrence.
fn synthesize_points(
    points: &PointSet,
    shcs: &ShCoeffs,
    nmax: Degree,
    derivs: &[Derivative],
    config: &ShConfig,
) -> Result<Vec<Vec<f64>>, ShError> {
    check_degree(nmax, shcs)?;

    let lat = match points {
        PointSet::Grid(g) => &g.lat,
        PointSet::Scattered(s) => &s.lat,
    };
    if let Some(deriv) = derivs.iter().find(|d| d.is_angular()) {
        if lat.iter().any(|l| is_nearly_equal(l.abs(), PI_2, config.threshold)) {
            return Err(ShError::InvalidArgument(format!(
                "derivative {deriv:?} is undefined at the poles"
            )));
        }
    }

    debug!(nmax, ?derivs, npoints = points.npoints(), "point synthesis");
    parallel::install(config, || match points {
        PointSet::Grid(g) => point_grid::synthesize(g, shcs, nmax, derivs, config),
        PointSet::Scattered(s) => point_scattered::synthesize(s, shcs, nmax, derivs, config),
    })?
}

/// Synthesize the mean values of `shcs` up to degree `nmax` over `cells`.
///
/// A cell `[φ1, φ2] × [λ1, λ2]` receives
/// `∫∫ f cosφ dφ dλ / ((sinφ2 − sinφ1)(λ2 − λ1))`.
///
/// Return
/// ----------
/// * `Err(ShError::InvalidGrid)` for a cell of zero area or an irregular cell
///   grid (varying longitude step or cell width).
/// * see [`shs_point`] for the remaining errors.
pub fn shs_cell(
    cells: &CellSet,
    shcs: &ShCoeffs,
    nmax: Degree,
    config: &ShConfig,
) -> Result<Vec<f64>, ShError> {
    check_degree(nmax, shcs)?;

    let (latmin, latmax, lonmin, lonmax) = match cells {
        CellSet::Grid(g) => (&g.latmin, &g.latmax, &g.lonmin, &g.lonmax),
        CellSet::Scattered(s) => (&s.latmin, &s.latmax, &s.lonmin, &s.lonmax),
    };
    let flat = latmin.iter().zip(latmax).any(|(lo, hi)| lo.sin() == hi.sin());
    let narrow = lonmin.iter().zip(lonmax).any(|(lo, hi)| lo == hi);
    if flat || narrow {
        return Err(ShError::InvalidGrid("cells must have a non-zero area".into()));
    }

    debug!(nmax, ncells = cells.ncells(), "cell synthesis");
    parallel::install(config, || match cells {
        CellSet::Grid(g) => cell_grid::synthesize(g, shcs, nmax, config),
        CellSet::Scattered(s) => cell_scattered::synthesize(s, shcs, nmax, config),
    })?
}

fn check_degree(nmax: Degree, shcs: &ShCoeffs) -> Result<(), ShError> {
    if nmax > shcs.nmax() {
        return Err(ShError::DegreeTooHigh {
            requested: nmax,
            available: shcs.nmax(),
        });
    }
    Ok(())
}

/// `mu / R^{d+1}`, the factor between lumped sums and synthesized values.
fn series_scale(shcs: &ShCoeffs, d: usize) -> f64 {
    shcs.mu / shcs.r.powi(d as i32 + 1)
}
