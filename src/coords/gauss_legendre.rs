//! Gauss–Legendre quadrature grids.
//!
//! A Gauss–Legendre grid for degree `nmax` has `L = nmax + 1` latitudes at the
//! roots of the Legendre polynomial `P_L(sinφ)` and `2L` equally spaced
//! longitudes starting at `0`. It integrates exactly any band-limited function
//! of degree `≤ nmax` multiplied by a spherical harmonic of degree `≤ nmax`.
use std::f64::consts::PI;

use tracing::debug;

use crate::constants::{Degree, Meter};
use crate::sh_errors::ShError;

use super::{PointGrid, PointGridKind};

const GL_MAX_ITER: usize = 1000;

/// Shape `(nlat, nlon)` of the Gauss–Legendre grid for degree `nmax`.
pub fn gauss_legendre_shape(nmax: Degree) -> (usize, usize) {
    (nmax + 1, 2 * nmax + 2)
}

/// Roots `z_i` of `P_n` and the matching quadrature weights, `z` decreasing.
///
/// Each root is refined by Newton iterations from the Tricomi-like initial
/// guess `cos(π(i + 0.75)/(n + 0.5))`. The southern half is obtained by
/// symmetry, except for the root at `z = 0` (odd `n`) whose sign must not
/// be flipped.
///
/// Return
/// ----------
/// * `Err(ShError::NonConvergence)` if a root needs more than 1000 iterations
///   or turns non-finite.
pub fn gauss_legendre_nodes(n: usize) -> Result<(Vec<f64>, Vec<f64>), ShError> {
    if n == 0 {
        return Err(ShError::InvalidArgument(
            "the Gauss-Legendre rule needs at least one node".into(),
        ));
    }
    let nf = n as f64;
    let c1 = nf + 0.5;
    let mut z = vec![0.0; n];
    let mut w = vec![0.0; n];

    for i in 0..n.div_ceil(2) {
        let mut zi = (PI * ((i + 1) as f64 - 0.25) / c1).cos();
        let mut pp;
        let mut it = 0;
        loop {
            let (mut p1, mut p2) = (1.0, 0.0);
            for j in 1..=n {
                let p3 = p2;
                p2 = p1;
                p1 = ((2 * j - 1) as f64 * zi * p2 - (j - 1) as f64 * p3) / j as f64;
            }
            pp = nf * (zi * p1 - p2) / (zi * zi - 1.0);
            let z1 = zi;
            zi = z1 - p1 / pp;
            it += 1;
            if (zi - z1).abs() <= f64::EPSILON || it >= GL_MAX_ITER {
                break;
            }
        }
        if it >= GL_MAX_ITER || !zi.is_finite() {
            return Err(ShError::NonConvergence(format!(
                "Gauss-Legendre root {i} of P_{n} did not converge"
            )));
        }

        let south = n - 1 - i;
        w[south] = 2.0 / ((1.0 - zi * zi) * pp * pp);
        if south == i {
            // the equator
            z[i] = 0.0;
        } else {
            z[south] = -zi;
            z[i] = zi;
            w[i] = w[south];
        }
    }
    Ok((z, w))
}

impl PointGrid {
    /// Gauss–Legendre grid for degree `nmax` on the sphere of radius `r`.
    ///
    /// Latitudes run from north to south; longitudes are `λ_j = jπ/(nmax+1)`,
    /// `j = 0..2nmax+2`.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::InvalidGrid)` if `r` is not strictly positive.
    /// * `Err(ShError::NonConvergence)` from [`gauss_legendre_nodes`].
    pub fn gauss_legendre(nmax: Degree, r: Meter) -> Result<Self, ShError> {
        if !(r.is_finite() && r > 0.0) {
            return Err(ShError::InvalidGrid(format!(
                "spherical radius {r} must be finite and positive"
            )));
        }
        let (nlat, nlon) = gauss_legendre_shape(nmax);
        let (z, w) = gauss_legendre_nodes(nlat)?;

        let lat = z.iter().map(|zi| zi.asin()).collect();
        let step = PI / nlat as f64;
        let lon = (0..nlon).map(|j| step * j as f64).collect();

        debug!(nmax, nlat, nlon, "built Gauss-Legendre grid");

        Ok(PointGrid {
            kind: PointGridKind::GaussLegendre,
            lat,
            lon,
            r: vec![r; nlat],
            w: Some(w),
            nmax: Some(nmax),
        })
    }
}
