//! Spherical harmonic analysis and synthesis on the sphere.
//!
//! Synthesis ([`shs`]) evaluates a series of fully-normalized spherical
//! harmonics at points or as block means over cells; analysis ([`sha`])
//! recovers the coefficients from point values on quadrature grids or from
//! block means. Legendre functions are evaluated with extended-range
//! arithmetic ([`legendre`]) and stay accurate to degrees of several tens of
//! thousands. Harmonic orders run in parallel on rayon, and results do not
//! depend on the thread count.
pub mod config;
pub mod constants;
pub mod coords;
pub mod kernels;
pub mod lanes;
pub mod legendre;
pub mod lonsum;
pub mod parallel;
pub mod polar;
pub mod progress;
pub mod sh_errors;
pub mod sha;
pub mod shc;
pub mod shs;
pub mod symmetry;

pub use config::{LonSummation, ShConfig};
pub use coords::{CellGrid, CellSet, PointGrid, PointSet, ScatteredCells, ScatteredPoints};
pub use sh_errors::ShError;
pub use shc::ShCoeffs;
pub use shs::Derivative;

#[cfg(test)]
pub(crate) mod unit_test_global {
    use std::sync::LazyLock;

    use crate::shc::ShCoeffs;

    /// Degree-30 coefficients with a Kaula-like decay, deterministic.
    pub(crate) static KAULA_30: LazyLock<ShCoeffs> = LazyLock::new(|| {
        ShCoeffs::from_fn(30, 3.986_004_415e14, 6_378_136.3, |n, m| {
            let sigma = 1e-5 / ((n * n + 1) as f64);
            let x = (n * 31 + m * 17) as f64;
            (sigma * x.sin(), sigma * (0.7 * x).cos())
        })
        .unwrap()
    });
}
