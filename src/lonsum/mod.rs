//! # Longitude summation
//!
//! Turns the lumped coefficients `(a_m, b_m)` of one latitude row into values
//! along the row. Two interchangeable algorithms:
//!
//! * [`LonPath::Fft`] – one complex-to-real FFT per row ([`fft`]). Requires at
//!   least `2·nmax + 1` longitudes, a constant step, the first longitude at
//!   `0` and the row closing at `2π`.
//! * [`LonPath::Pslr`] – the cosine three-term recurrence of [`pslr`], for any
//!   constant step.
//!
//! The path is chosen once per transform by [`select_point_path`] or
//! [`select_cell_path`]; [`LonSummation::ForcePslr`] disables the FFT.
//!
//! Cell rows are block means: before summation the lumped coefficients are
//! integrated along each cell ([`fold_cell`]).
pub mod fft;
pub mod pslr;

use tracing::debug;

use crate::config::{LonSummation, ShConfig};
use crate::constants::{is_nearly_equal, DPI};
use crate::sh_errors::ShError;

use fft::FftSynthesis;

/// Longitude summation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LonPath {
    Fft,
    Pslr,
}

/// Longitude sampling of every row of a grid.
///
/// Fields
/// -----------------
/// * `path` – selected algorithm.
/// * `nlon` – values per row.
/// * `lon0` – longitude of the first value (`0` on the FFT path; the centre of
///   the first cell for PSLR over cells).
/// * `dlon` – step between consecutive values.
/// * `width` – longitudinal width of a cell (cells only, `0` for points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonSampling {
    pub path: LonPath,
    pub nlon: usize,
    pub lon0: f64,
    pub dlon: f64,
    pub width: f64,
}

fn constant_step(v: &[f64], step: f64, eps: f64) -> bool {
    v.windows(2).all(|w| is_nearly_equal(w[1] - w[0], step, eps))
}

fn fft_allowed(nlon: usize, nmax: usize, config: &ShConfig) -> bool {
    config.lon_summation == LonSummation::Auto && nlon > 1 && (nlon - 1) / 2 >= nmax
}

/// Choose the longitude path of a point grid with longitudes `lon`.
///
/// Return
/// ----------
/// * `Err(ShError::InvalidGrid)` if the longitude step is not constant
///   within `config.threshold2`.
pub fn select_point_path(
    lon: &[f64],
    nmax: usize,
    config: &ShConfig,
) -> Result<LonSampling, ShError> {
    let nlon = lon.len();
    let dlon = if nlon > 1 { lon[1] - lon[0] } else { 0.0 };
    if !constant_step(lon, dlon, config.threshold2) {
        return Err(ShError::InvalidGrid(
            "grid longitudes must have a constant step".into(),
        ));
    }

    let fft = fft_allowed(nlon, nmax, config)
        && is_nearly_equal(lon[0], 0.0, config.threshold)
        && is_nearly_equal(lon[nlon - 1] + dlon, DPI, config.threshold);
    let path = if fft { LonPath::Fft } else { LonPath::Pslr };
    debug!(?path, nlon, dlon, "longitude summation of point rows");

    Ok(LonSampling {
        path,
        nlon,
        lon0: lon.first().copied().unwrap_or(0.0),
        dlon,
        width: 0.0,
    })
}

/// Choose the longitude path of a cell grid with bounds `lonmin`, `lonmax`.
///
/// Return
/// ----------
/// * `Err(ShError::InvalidGrid)` if the cell spacing or the cell width is not
///   constant within `config.threshold2`.
pub fn select_cell_path(
    lonmin: &[f64],
    lonmax: &[f64],
    nmax: usize,
    config: &ShConfig,
) -> Result<LonSampling, ShError> {
    let nlon = lonmin.len();
    let width = lonmax[0] - lonmin[0];
    let dlon = if nlon > 1 { lonmin[1] - lonmin[0] } else { 0.0 };
    if !constant_step(lonmin, dlon, config.threshold2) || !constant_step(lonmax, dlon, config.threshold2)
    {
        return Err(ShError::InvalidGrid(
            "cell longitudes must have a constant step".into(),
        ));
    }

    let fft = fft_allowed(nlon, nmax, config)
        && is_nearly_equal(lonmin[0], 0.0, config.threshold)
        && is_nearly_equal(lonmax[nlon - 1], DPI, config.threshold)
        && is_nearly_equal(lonmax[0], lonmin[1], config.threshold);
    let (path, lon0) = if fft {
        (LonPath::Fft, 0.0)
    } else {
        (LonPath::Pslr, 0.5 * (lonmin[0] + lonmax[0]))
    };
    debug!(?path, nlon, dlon, width, "longitude summation of cell rows");

    Ok(LonSampling {
        path,
        nlon,
        lon0,
        dlon,
        width,
    })
}

/// Integrate `a cos(mλ) + b sin(mλ)` along a cell of width `width`.
///
/// * FFT path, cell starting at `λ_j`: returns `(A, B)` such that the cell
///   integral is `A cos(mλ_j) + B sin(mλ_j)`.
/// * PSLR path, cell centred at `λ_j`: both terms scale by `(2/m)·sin(mΔ/2)`.
#[inline]
pub fn fold_cell(m: usize, a: f64, b: f64, width: f64, path: LonPath) -> (f64, f64) {
    if m == 0 {
        return (a * width, b * width);
    }
    let mf = m as f64;
    match path {
        LonPath::Fft => {
            let cm = ((mf * width).cos() - 1.0) / mf;
            let sm = (mf * width).sin() / mf;
            (a * sm - b * cm, a * cm + b * sm)
        }
        LonPath::Pslr => {
            let m2 = 2.0 / mf;
            let f = m2 * (width / m2).sin();
            (a * f, b * f)
        }
    }
}

/// Row summation prepared once per transform.
#[derive(Clone)]
pub enum RowSummation {
    Fft(FftSynthesis),
    Pslr { lon0: f64, dlon: f64 },
}

impl RowSummation {
    pub fn new(sampling: &LonSampling) -> Self {
        match sampling.path {
            LonPath::Fft => RowSummation::Fft(FftSynthesis::new(sampling.nlon)),
            LonPath::Pslr => RowSummation::Pslr {
                lon0: sampling.lon0,
                dlon: sampling.dlon,
            },
        }
    }

    /// Overwrite `out` with the row synthesized from `pair(m) = (a_m, b_m)`.
    pub fn row(
        &self,
        nmax: usize,
        pair: impl Fn(usize) -> (f64, f64),
        out: &mut [f64],
    ) -> Result<(), ShError> {
        match self {
            RowSummation::Fft(fft) => fft.row(nmax, pair, out),
            RowSummation::Pslr { lon0, dlon } => {
                out.fill(0.0);
                pslr::pslr_row(nmax, pair, *lon0, *dlon, out);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod lonsum_test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn lons(nlon: usize) -> Vec<f64> {
        (0..nlon).map(|j| DPI / nlon as f64 * j as f64).collect()
    }

    #[test]
    fn test_point_path_selection() {
        let config = ShConfig::default();
        assert_eq!(select_point_path(&lons(21), 10, &config).unwrap().path, LonPath::Fft);
        // too few longitudes
        assert_eq!(select_point_path(&lons(20), 10, &config).unwrap().path, LonPath::Pslr);
        // shifted origin
        let shifted: Vec<f64> = lons(21).iter().map(|l| l + 0.1).collect();
        assert_eq!(select_point_path(&shifted, 10, &config).unwrap().path, LonPath::Pslr);
        // partial circle
        let partial: Vec<f64> = (0..30).map(|j| 0.01 * j as f64).collect();
        assert_eq!(select_point_path(&partial, 10, &config).unwrap().path, LonPath::Pslr);
        // single longitude
        let single = select_point_path(&[1.0], 10, &config).unwrap();
        assert_eq!(single.path, LonPath::Pslr);
        assert_eq!(single.lon0, 1.0);

        let forced = ShConfig::builder().lon_summation(LonSummation::ForcePslr).build().unwrap();
        assert_eq!(select_point_path(&lons(21), 10, &forced).unwrap().path, LonPath::Pslr);

        assert!(select_point_path(&[0.0, 0.1, 0.3], 1, &config).is_err());
    }

    #[test]
    fn test_cell_path_selection() {
        let config = ShConfig::default();
        let edges = lons(21);
        let mut lonmax: Vec<f64> = edges[1..].to_vec();
        lonmax.push(DPI);
        let s = select_cell_path(&edges, &lonmax, 10, &config).unwrap();
        assert_eq!(s.path, LonPath::Fft);
        assert_relative_eq!(s.width, DPI / 21.0, epsilon = 1e-15);

        // gaps between cells
        let narrow: Vec<f64> = edges.iter().map(|l| l + 0.1).collect();
        let s = select_cell_path(&edges, &narrow, 10, &config).unwrap();
        assert_eq!(s.path, LonPath::Pslr);
        assert_relative_eq!(s.lon0, 0.05, epsilon = 1e-15);
    }

    #[test]
    fn test_fold_cell_integrates_along_cell() {
        let (a, b, m, width) = (0.7, -0.4, 3, 0.2);
        let lon = 0.5;
        let exact = |x0: f64, x1: f64| {
            let mf = m as f64;
            a * ((mf * x1).sin() - (mf * x0).sin()) / mf
                - b * ((mf * x1).cos() - (mf * x0).cos()) / mf
        };
        let (fa, fb) = fold_cell(m, a, b, width, LonPath::Fft);
        let mf = m as f64;
        assert_relative_eq!(
            fa * (mf * lon).cos() + fb * (mf * lon).sin(),
            exact(lon, lon + width),
            epsilon = 1e-15
        );
        let (pa, pb) = fold_cell(m, a, b, width, LonPath::Pslr);
        assert_relative_eq!(
            pa * (mf * lon).cos() + pb * (mf * lon).sin(),
            exact(lon - width / 2.0, lon + width / 2.0),
            epsilon = 1e-15
        );
        assert_eq!(fold_cell(0, 2.0, 0.0, PI, LonPath::Fft), (2.0 * PI, 0.0));
    }
}
