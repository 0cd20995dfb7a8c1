//! # Equatorial symmetry
//!
//! `P̄nm(−t) = (−1)^{n+m} P̄nm(t)`: one Legendre evaluation serves a latitude
//! and its mirror image. A grid whose latitudes (and radii) are symmetric
//! about the equator is therefore processed over one hemisphere only, the
//! other hemisphere being filled from a second, sign-alternating accumulator.
//!
//! [`SymmetryLayout`] decides, once per transform, whether a grid is
//! symmetric and how many rows are actually processed (`nlatdo`).
//! [`SymmetryLayout::classify`] then tells, per processed row, whether and
//! where its mirror row is written, and [`SymmetryLayout::batches`] groups the
//! processed rows into lane batches, padding the last one.
//!
//! Special rows
//! -----------------
//! * Driscoll–Healy grids have a north pole but no south pole. They are
//!   treated as a symmetric grid of `nlat + 1` rows whose missing south pole is
//!   never written: row `0` has no mirror and row `i` mirrors to `nlat − i`.
//! * A row on the equator (odd row count) is its own mirror and is written
//!   once, so that a near-zero value never gets its sign flipped.
use crate::constants::is_nearly_equal;
use crate::coords::{CellGrid, PointGrid, PointGridKind};
use crate::lanes::LANES;

/// Symmetry decision for one geometry.
///
/// Fields
/// -----------------
/// * `symmetric` – the mirror accumulators are used.
/// * `nlat` – number of rows of the geometry.
/// * `nlat_eff` – `nlat`, plus the missing south pole of Driscoll–Healy grids.
/// * `nlatdo` – number of rows processed explicitly.
/// * `even` – `nlat_eff` is even (no row on the equator).
/// * `dh` – Driscoll–Healy layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetryLayout {
    pub symmetric: bool,
    pub nlat: usize,
    pub nlat_eff: usize,
    pub nlatdo: usize,
    pub even: bool,
    pub dh: bool,
}

/// Classification of one processed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowClass {
    pub process: bool,
    pub mirror: Option<usize>,
}

/// A lane batch of processed rows.
///
/// Padding lanes repeat the last valid row and are flagged in `valid`; they
/// are evaluated but never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBatch {
    pub index: usize,
    pub rows: [usize; LANES],
    pub valid: [bool; LANES],
    pub mirrors: [Option<usize>; LANES],
}

impl RowBatch {
    pub fn any_mirror(&self) -> bool {
        self.mirrors
            .iter()
            .zip(&self.valid)
            .any(|(m, &v)| v && m.is_some())
    }

    /// `(lane, output row)` for every valid row and every mirror row.
    pub fn targets(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        (0..LANES)
            .filter(move |&l| self.valid[l])
            .flat_map(move |l| {
                std::iter::once((l, self.rows[l], false))
                    .chain(self.mirrors[l].map(|row| (l, row, true)))
            })
    }
}

fn values_symmetric(v: &[f64], center: f64, eps: f64) -> bool {
    let n = v.len();
    let middle = n / 2;
    let pairs_ok = (0..middle).all(|i| is_nearly_equal(v[i] - center, center - v[n - 1 - i], eps));
    pairs_ok && (n % 2 == 0 || is_nearly_equal(v[middle], center, eps))
}

fn radii_symmetric(r: &[f64], eps: f64) -> bool {
    let n = r.len();
    let scale = r.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    (0..n / 2).all(|i| is_nearly_equal(r[i], r[n - 1 - i], eps * scale))
}

impl SymmetryLayout {
    fn with_symmetry(nlat: usize, nlat_eff: usize, symmetric: bool, dh: bool) -> Self {
        let even = !dh && nlat_eff % 2 == 0;
        let nlatdo = if symmetric {
            (nlat_eff + 1 - usize::from(even)) / 2
        } else {
            nlat
        };
        SymmetryLayout {
            symmetric,
            nlat,
            nlat_eff,
            nlatdo,
            even,
            dh,
        }
    }

    /// Layout of a point grid.
    ///
    /// Quadrature grids are symmetric by construction as long as their radii
    /// are; user grids must have latitudes and radii symmetric within
    /// `threshold2`. A single row is never symmetric.
    pub fn for_point_grid(grid: &PointGrid, threshold2: f64) -> Self {
        let nlat = grid.nlat();
        let dh = grid.kind.is_driscoll_healy();
        let nlat_eff = if dh { nlat + 1 } else { nlat };

        let symmetric = nlat_eff > 1
            && match grid.kind {
                PointGridKind::GaussLegendre => radii_symmetric(&grid.r, threshold2),
                PointGridKind::DriscollHealy1 | PointGridKind::DriscollHealy2 => {
                    radii_symmetric(&grid.r[1..], threshold2)
                }
                PointGridKind::Custom => {
                    values_symmetric(&grid.lat, 0.0, threshold2)
                        && radii_symmetric(&grid.r, threshold2)
                }
            };
        Self::with_symmetry(nlat, nlat_eff, symmetric, dh)
    }

    /// Layout of a cell grid: cell `i` mirrors cell `nlat − 1 − i` when
    /// `latmax[i] = −latmin[nlat−1−i]` for every row.
    pub fn for_cell_grid(grid: &CellGrid, threshold2: f64) -> Self {
        let nlat = grid.nlat();
        let symmetric = nlat > 1
            && (0..nlat).all(|i| {
                is_nearly_equal(grid.latmax[i], -grid.latmin[nlat - 1 - i], threshold2)
            })
            && radii_symmetric(&grid.r, threshold2);
        Self::with_symmetry(nlat, nlat, symmetric, false)
    }

    /// Layout without symmetry, e.g. for scattered sets.
    pub fn unsymmetric(nlat: usize) -> Self {
        Self::with_symmetry(nlat, nlat, false, false)
    }

    pub fn classify(&self, i: usize) -> RowClass {
        let process = i < self.nlatdo;
        let mirror = if !process
            || !self.symmetric
            || (self.dh && i == 0)
            || (!self.even && i + 1 == self.nlatdo)
        {
            None
        } else {
            Some(self.nlat_eff - 1 - i)
        };
        RowClass { process, mirror }
    }

    /// Number of lane batches covering the processed rows.
    pub fn nbatches(&self) -> usize {
        self.nlatdo.div_ceil(LANES)
    }

    /// Lane batches over the processed rows, in row order.
    pub fn batches(&self) -> impl Iterator<Item = RowBatch> + '_ {
        (0..self.nbatches()).map(move |b| {
            let first = b * LANES;
            let last = (first + LANES).min(self.nlatdo) - 1;
            let mut batch = RowBatch {
                index: b,
                rows: [last; LANES],
                valid: [false; LANES],
                mirrors: [None; LANES],
            };
            for (l, i) in (first..=last).enumerate() {
                batch.rows[l] = i;
                batch.valid[l] = true;
                batch.mirrors[l] = self.classify(i).mirror;
            }
            batch
        })
    }
}

#[cfg(test)]
mod symmetry_test {
    use super::*;
    use crate::constants::THRESHOLD2;

    #[test]
    fn test_gauss_legendre_odd_rows_keep_equator() {
        let grid = PointGrid::gauss_legendre(4, 1.0).unwrap();
        let layout = SymmetryLayout::for_point_grid(&grid, THRESHOLD2);
        assert!(layout.symmetric);
        assert!(!layout.even);
        assert_eq!(layout.nlatdo, 3);
        assert_eq!(layout.classify(0).mirror, Some(4));
        assert_eq!(layout.classify(1).mirror, Some(3));
        assert_eq!(layout.classify(2).mirror, None);
        assert!(!layout.classify(3).process);
    }

    #[test]
    fn test_gauss_legendre_even_rows() {
        let grid = PointGrid::gauss_legendre(5, 1.0).unwrap();
        let layout = SymmetryLayout::for_point_grid(&grid, THRESHOLD2);
        assert_eq!(layout.nlatdo, 3);
        assert_eq!(layout.classify(2).mirror, Some(3));
    }

    #[test]
    fn test_driscoll_healy_pole_and_equator() {
        let grid = PointGrid::driscoll_healy1(3, 1.0).unwrap();
        let layout = SymmetryLayout::for_point_grid(&grid, THRESHOLD2);
        // rows: pole, 3 northern rows, equator, 3 southern rows
        assert_eq!(layout.nlat, 8);
        assert_eq!(layout.nlat_eff, 9);
        assert_eq!(layout.nlatdo, 5);
        assert_eq!(layout.classify(0).mirror, None);
        assert_eq!(layout.classify(1).mirror, Some(7));
        assert_eq!(layout.classify(3).mirror, Some(5));
        assert_eq!(layout.classify(4).mirror, None);
    }

    #[test]
    fn test_custom_grids() {
        let sym = PointGrid::custom_sphere(vec![0.5, 0.1, -0.1, -0.5], vec![0.0], 1.0).unwrap();
        assert!(SymmetryLayout::for_point_grid(&sym, THRESHOLD2).symmetric);

        let asym = PointGrid::custom_sphere(vec![0.5, 0.1, -0.2], vec![0.0], 1.0).unwrap();
        let layout = SymmetryLayout::for_point_grid(&asym, THRESHOLD2);
        assert!(!layout.symmetric);
        assert_eq!(layout.nlatdo, 3);
        assert_eq!(layout.classify(0).mirror, None);

        let radii = PointGrid::custom(vec![0.5, -0.5], vec![0.0], vec![1.0, 2.0]).unwrap();
        assert!(!SymmetryLayout::for_point_grid(&radii, THRESHOLD2).symmetric);

        let single = PointGrid::custom_sphere(vec![0.0], vec![0.0], 1.0).unwrap();
        assert!(!SymmetryLayout::for_point_grid(&single, THRESHOLD2).symmetric);
    }

    #[test]
    fn test_cell_grid_symmetry() {
        let grid = CellGrid::regular(5, 4, 1.0).unwrap();
        let layout = SymmetryLayout::for_cell_grid(&grid, THRESHOLD2);
        assert!(layout.symmetric);
        assert_eq!(layout.nlatdo, 3);
        assert_eq!(layout.classify(0).mirror, Some(4));
        assert_eq!(layout.classify(2).mirror, None);

        let single = CellGrid::regular(1, 4, 1.0).unwrap();
        assert!(!SymmetryLayout::for_cell_grid(&single, THRESHOLD2).symmetric);
    }

    #[test]
    fn test_batches_cover_processed_rows_once() {
        let grid = PointGrid::gauss_legendre(12, 1.0).unwrap();
        let layout = SymmetryLayout::for_point_grid(&grid, THRESHOLD2);
        let mut written = vec![0; grid.nlat()];
        for batch in layout.batches() {
            for (_, row, _) in batch.targets() {
                written[row] += 1;
            }
            // padding repeats the last valid row
            for l in 0..LANES {
                if !batch.valid[l] {
                    assert_eq!(batch.rows[l], layout.nlatdo - 1);
                }
            }
        }
        assert!(written.iter().all(|&w| w == 1));
    }
}
