//! Driscoll–Healy quadrature grids.
//!
//! For degree `nmax` and `L = nmax + 1` both variants have `2L` equiangular
//! latitudes `φ_i = π/2 − iπ/(2L)`, `i = 0..2L`: the north pole is included,
//! the south pole is not. The first variant has `2L` longitudes with step
//! `π/L`, the second `4L` longitudes with step `π/(2L)`.
use std::f64::consts::PI;

use tracing::debug;

use crate::constants::{Degree, Meter, PI_2};
use crate::sh_errors::ShError;

use super::{PointGrid, PointGridKind};

/// Shape `(nlat, nlon)` of the Driscoll–Healy grid of the given kind.
pub fn driscoll_healy_shape(kind: PointGridKind, nmax: Degree) -> (usize, usize) {
    let l = nmax + 1;
    match kind {
        PointGridKind::DriscollHealy2 => (2 * l, 4 * l),
        _ => (2 * l, 2 * l),
    }
}

/// Latitudes and weights of a Driscoll–Healy grid.
///
/// `w_i = (2/L)·sinθ_i·Σ_{k=0}^{L−1} sin((2k+1)θ_i)/(2k+1)`, with `θ_i` the
/// co-latitude. The odd multiples `sin((2k+1)θ)` come from a Chebyshev
/// recurrence stepping two multiples at a time.
fn latitudes_weights(nmax: Degree) -> (Vec<f64>, Vec<f64>) {
    let l = nmax + 1;
    let nlat = 2 * l;
    let c = 2.0 / l as f64;
    let step = PI / (2.0 * l as f64);

    let mut lat = vec![0.0; nlat];
    let mut w = vec![0.0; nlat];

    for i in 0..=l {
        let clti = step * i as f64;
        lat[i] = PI_2 - clti;

        let sclti = clti.sin();
        w[i] = if nmax == 0 {
            c * sclti
        } else {
            let cclti2 = 2.0 * clti.cos();
            let (mut s0, mut s1) = (0.0, sclti);
            let mut sum = s1;
            for k in 1..l {
                let s2 = cclti2 * s1 - s0;
                s0 = s1;
                s1 = s2;
                let s2 = cclti2 * s1 - s0;
                sum += s2 / (2 * k + 1) as f64;
                s0 = s1;
                s1 = s2;
            }
            c * sclti * sum
        };

        // no south pole; the equator keeps its own sign
        if i == 0 || i == l {
            continue;
        }
        let south = nlat - i;
        lat[south] = -lat[i];
        w[south] = w[i];
    }
    lat[l] = 0.0;
    (lat, w)
}

impl PointGrid {
    /// Driscoll–Healy grid with `2(nmax+1)` longitudes.
    pub fn driscoll_healy1(nmax: Degree, r: Meter) -> Result<Self, ShError> {
        Self::driscoll_healy(PointGridKind::DriscollHealy1, nmax, r)
    }

    /// Driscoll–Healy grid with `4(nmax+1)` longitudes.
    pub fn driscoll_healy2(nmax: Degree, r: Meter) -> Result<Self, ShError> {
        Self::driscoll_healy(PointGridKind::DriscollHealy2, nmax, r)
    }

    fn driscoll_healy(kind: PointGridKind, nmax: Degree, r: Meter) -> Result<Self, ShError> {
        if !(r.is_finite() && r > 0.0) {
            return Err(ShError::InvalidGrid(format!(
                "spherical radius {r} must be finite and positive"
            )));
        }
        let (nlat, nlon) = driscoll_healy_shape(kind, nmax);
        let (lat, w) = latitudes_weights(nmax);

        let l = (nmax + 1) as f64;
        let step = match kind {
            PointGridKind::DriscollHealy2 => PI / (2.0 * l),
            _ => PI / l,
        };
        let lon = (0..nlon).map(|j| step * j as f64).collect();

        debug!(?kind, nmax, nlat, nlon, "built Driscoll-Healy grid");

        Ok(PointGrid {
            kind,
            lat,
            lon,
            r: vec![r; nlat],
            w: Some(w),
            nmax: Some(nmax),
        })
    }
}

#[cfg(test)]
mod driscoll_healy_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shapes() {
        let dh1 = PointGrid::driscoll_healy1(5, 1.0).unwrap();
        assert_eq!((dh1.nlat(), dh1.nlon()), (12, 12));
        let dh2 = PointGrid::driscoll_healy2(5, 1.0).unwrap();
        assert_eq!((dh2.nlat(), dh2.nlon()), (12, 24));
        assert_relative_eq!(dh2.lon[1], PI / 12.0);
    }

    #[test]
    fn test_latitudes() {
        let g = PointGrid::driscoll_healy1(5, 1.0).unwrap();
        assert_eq!(g.lat[0], PI_2);
        assert_eq!(g.lat[6], 0.0);
        for i in 1..6 {
            assert_eq!(g.lat[12 - i], -g.lat[i]);
            assert_relative_eq!(g.lat[i], PI_2 - i as f64 * PI / 12.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_chebyshev_weights_match_direct_sum() {
        let nmax = 9;
        let l = nmax + 1;
        let (lat, w) = latitudes_weights(nmax);
        for (i, (phi, wi)) in lat.iter().zip(&w).enumerate() {
            let theta = PI_2 - phi;
            let direct: f64 = (0..l)
                .map(|k| ((2 * k + 1) as f64 * theta).sin() / (2 * k + 1) as f64)
                .sum();
            let expected = 2.0 / l as f64 * theta.sin() * direct;
            assert!((wi - expected).abs() < 1e-13, "row {i}");
        }
        // the north pole carries no weight
        assert_eq!(w[0], 0.0);
    }
}
