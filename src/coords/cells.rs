//! Regular cell grids.
use std::f64::consts::PI;

use crate::constants::{Meter, DPI, PI_2};
use crate::sh_errors::ShError;

use super::CellGrid;

/// Latitude edges `π/2 − kπ/nlat`, `k = 0..=nlat`, exactly antisymmetric.
fn latitude_edges(nlat: usize) -> Vec<f64> {
    let step = PI / nlat as f64;
    let mut edges: Vec<f64> = (0..=nlat).map(|k| PI_2 - step * k as f64).collect();
    for k in 0..=nlat / 2 {
        edges[nlat - k] = -edges[k];
    }
    if nlat % 2 == 0 {
        edges[nlat / 2] = 0.0;
    }
    edges
}

impl CellGrid {
    /// Equiangular grid of `nlat × nlon` cells covering the whole sphere.
    ///
    /// Rows run from the north pole to the south pole, columns eastwards from
    /// `λ = 0`. Neighbouring cells share their edges exactly and the latitude
    /// edges are symmetric about the equator.
    pub fn regular(nlat: usize, nlon: usize, r: Meter) -> Result<Self, ShError> {
        if nlat == 0 || nlon == 0 {
            return Err(ShError::InvalidGrid(
                "a cell grid needs at least one row and one column".into(),
            ));
        }
        let edges = latitude_edges(nlat);
        let dlon = DPI / nlon as f64;
        let lon_edges: Vec<f64> = (0..=nlon).map(|j| dlon * j as f64).collect();

        CellGrid::new(
            edges[1..].to_vec(),
            edges[..nlat].to_vec(),
            lon_edges[..nlon].to_vec(),
            lon_edges[1..].to_vec(),
            vec![r; nlat],
        )
    }
}
