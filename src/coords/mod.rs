//! # Evaluation geometries
//!
//! Points and cells at which spherical harmonic synthesis is evaluated, or from
//! which analysis integrates.
//!
//! Geometries
//! -----------------
//! * [`PointGrid`] – latitude/longitude grid with one spherical radius per
//!   latitude row, either a quadrature grid ([`PointGridKind::GaussLegendre`],
//!   [`PointGridKind::DriscollHealy1`], [`PointGridKind::DriscollHealy2`]) carrying its
//!   integration weights, or a user grid ([`PointGridKind::Custom`]).
//! * [`ScatteredPoints`] – one `(lat, lon, r)` triple per point.
//! * [`CellGrid`] – grid of latitude/longitude cells (block means).
//! * [`ScatteredCells`] – independent cells.
//!
//! Latitudes are in radians within `[-π/2, π/2]`, longitudes in radians.
//! Quadrature grids are ordered from north to south. Grid outputs are
//! row-major `nlat × nlon` arrays.
//!
//! See also
//! ------------
//! * [`gauss_legendre`] – Gauss–Legendre nodes, weights and grids.
//! * [`driscoll_healy`] – Driscoll–Healy grids.
//! * [`cells`] – regular cell grids.
pub mod cells;
pub mod driscoll_healy;
pub mod gauss_legendre;

pub use gauss_legendre::gauss_legendre_nodes;

use crate::constants::{Degree, Meter, Radian, PI_2};
use crate::sh_errors::ShError;

/// Family of a point grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointGridKind {
    GaussLegendre,
    DriscollHealy1,
    DriscollHealy2,
    Custom,
}

impl PointGridKind {
    pub fn is_driscoll_healy(self) -> bool {
        matches!(
            self,
            PointGridKind::DriscollHealy1 | PointGridKind::DriscollHealy2
        )
    }

    pub fn is_quadrature(self) -> bool {
        !matches!(self, PointGridKind::Custom)
    }
}

/// Latitude/longitude grid of points.
///
/// Fields
/// -----------------
/// * `kind` – grid family.
/// * `lat` – latitudes of the rows.
/// * `lon` – longitudes of the columns.
/// * `r` – spherical radius of each row.
/// * `w` – quadrature weights per row (quadrature grids only).
/// * `nmax` – degree the quadrature grid was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGrid {
    pub kind: PointGridKind,
    pub lat: Vec<Radian>,
    pub lon: Vec<Radian>,
    pub r: Vec<Meter>,
    pub w: Option<Vec<f64>>,
    pub nmax: Option<Degree>,
}

impl PointGrid {
    /// User-defined grid.
    ///
    /// Arguments
    /// -----------------
    /// * `lat` – row latitudes, any order.
    /// * `lon` – column longitudes.
    /// * `r` – one spherical radius per row.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::InvalidGrid)` if an array is empty, if `r` and `lat`
    ///   differ in length, if a latitude lies outside `[-π/2, π/2]` or a radius
    ///   is not strictly positive.
    pub fn custom(lat: Vec<Radian>, lon: Vec<Radian>, r: Vec<Meter>) -> Result<Self, ShError> {
        if lat.is_empty() || lon.is_empty() {
            return Err(ShError::InvalidGrid(
                "a grid needs at least one latitude and one longitude".into(),
            ));
        }
        if r.len() != lat.len() {
            return Err(ShError::InvalidGrid(format!(
                "expected {} radii (one per latitude), got {}",
                lat.len(),
                r.len()
            )));
        }
        check_latitudes(&lat)?;
        check_radii(&r)?;
        Ok(PointGrid {
            kind: PointGridKind::Custom,
            lat,
            lon,
            r,
            w: None,
            nmax: None,
        })
    }

    /// User grid with a single radius for every row.
    pub fn custom_sphere(lat: Vec<Radian>, lon: Vec<Radian>, r: Meter) -> Result<Self, ShError> {
        let radii = vec![r; lat.len()];
        Self::custom(lat, lon, radii)
    }

    pub fn nlat(&self) -> usize {
        self.lat.len()
    }

    pub fn nlon(&self) -> usize {
        self.lon.len()
    }

    pub fn npoints(&self) -> usize {
        self.nlat() * self.nlon()
    }

    /// Copy of the grid with every row moved to radius `r`.
    pub fn with_radius(&self, r: Meter) -> Self {
        let mut grid = self.clone();
        grid.r.iter_mut().for_each(|ri| *ri = r);
        grid
    }
}

/// Scattered points, one value per point.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteredPoints {
    pub lat: Vec<Radian>,
    pub lon: Vec<Radian>,
    pub r: Vec<Meter>,
}

impl ScatteredPoints {
    pub fn new(lat: Vec<Radian>, lon: Vec<Radian>, r: Vec<Meter>) -> Result<Self, ShError> {
        if lat.len() != lon.len() || lat.len() != r.len() {
            return Err(ShError::InvalidGrid(format!(
                "scattered points need equally long arrays, got lat = {}, lon = {}, r = {}",
                lat.len(),
                lon.len(),
                r.len()
            )));
        }
        check_latitudes(&lat)?;
        check_radii(&r)?;
        Ok(ScatteredPoints { lat, lon, r })
    }

    pub fn len(&self) -> usize {
        self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }
}

/// Any point geometry accepted by point synthesis.
#[derive(Debug, Clone, PartialEq)]
pub enum PointSet {
    Grid(PointGrid),
    Scattered(ScatteredPoints),
}

impl PointSet {
    /// Number of output values.
    pub fn npoints(&self) -> usize {
        match self {
            PointSet::Grid(g) => g.npoints(),
            PointSet::Scattered(s) => s.len(),
        }
    }
}

impl From<PointGrid> for PointSet {
    fn from(g: PointGrid) -> Self {
        PointSet::Grid(g)
    }
}

impl From<ScatteredPoints> for PointSet {
    fn from(s: ScatteredPoints) -> Self {
        PointSet::Scattered(s)
    }
}

/// Grid of cells: row `i` spans `[latmin[i], latmax[i]]`, column `j` spans
/// `[lonmin[j], lonmax[j]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    pub latmin: Vec<Radian>,
    pub latmax: Vec<Radian>,
    pub lonmin: Vec<Radian>,
    pub lonmax: Vec<Radian>,
    pub r: Vec<Meter>,
}

impl CellGrid {
    pub fn new(
        latmin: Vec<Radian>,
        latmax: Vec<Radian>,
        lonmin: Vec<Radian>,
        lonmax: Vec<Radian>,
        r: Vec<Meter>,
    ) -> Result<Self, ShError> {
        if latmin.is_empty() || lonmin.is_empty() {
            return Err(ShError::InvalidGrid(
                "a cell grid needs at least one row and one column".into(),
            ));
        }
        if latmin.len() != latmax.len() || latmin.len() != r.len() {
            return Err(ShError::InvalidGrid(
                "latmin, latmax and r must have the same length".into(),
            ));
        }
        if lonmin.len() != lonmax.len() {
            return Err(ShError::InvalidGrid(
                "lonmin and lonmax must have the same length".into(),
            ));
        }
        check_latitudes(&latmin)?;
        check_latitudes(&latmax)?;
        check_cell_bounds(&latmin, &latmax, "latitude")?;
        check_cell_bounds(&lonmin, &lonmax, "longitude")?;
        check_radii(&r)?;
        Ok(CellGrid {
            latmin,
            latmax,
            lonmin,
            lonmax,
            r,
        })
    }

    pub fn nlat(&self) -> usize {
        self.latmin.len()
    }

    pub fn nlon(&self) -> usize {
        self.lonmin.len()
    }

    pub fn ncells(&self) -> usize {
        self.nlat() * self.nlon()
    }
}

/// Independent cells, one mean value per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteredCells {
    pub latmin: Vec<Radian>,
    pub latmax: Vec<Radian>,
    pub lonmin: Vec<Radian>,
    pub lonmax: Vec<Radian>,
    pub r: Vec<Meter>,
}

impl ScatteredCells {
    pub fn new(
        latmin: Vec<Radian>,
        latmax: Vec<Radian>,
        lonmin: Vec<Radian>,
        lonmax: Vec<Radian>,
        r: Vec<Meter>,
    ) -> Result<Self, ShError> {
        let n = latmin.len();
        if [latmax.len(), lonmin.len(), lonmax.len(), r.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(ShError::InvalidGrid(
                "scattered cells need equally long arrays".into(),
            ));
        }
        check_latitudes(&latmin)?;
        check_latitudes(&latmax)?;
        check_cell_bounds(&latmin, &latmax, "latitude")?;
        check_cell_bounds(&lonmin, &lonmax, "longitude")?;
        check_radii(&r)?;
        Ok(ScatteredCells {
            latmin,
            latmax,
            lonmin,
            lonmax,
            r,
        })
    }

    pub fn len(&self) -> usize {
        self.latmin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latmin.is_empty()
    }
}

/// Any cell geometry accepted by cell synthesis.
#[derive(Debug, Clone, PartialEq)]
pub enum CellSet {
    Grid(CellGrid),
    Scattered(ScatteredCells),
}

impl CellSet {
    pub fn ncells(&self) -> usize {
        match self {
            CellSet::Grid(g) => g.ncells(),
            CellSet::Scattered(s) => s.len(),
        }
    }
}

impl From<CellGrid> for CellSet {
    fn from(g: CellGrid) -> Self {
        CellSet::Grid(g)
    }
}

impl From<ScatteredCells> for CellSet {
    fn from(s: ScatteredCells) -> Self {
        CellSet::Scattered(s)
    }
}

/// Maximum degree resolvable by a quadrature grid with `nlat` rows.
///
/// * Gauss–Legendre: `nlat - 1`.
/// * Driscoll–Healy: `(nlat - 2) / 2`.
pub fn nmax_from_nlat(kind: PointGridKind, nlat: usize) -> Result<Degree, ShError> {
    match kind {
        PointGridKind::GaussLegendre if nlat >= 1 => Ok(nlat - 1),
        PointGridKind::DriscollHealy1 | PointGridKind::DriscollHealy2
            if nlat >= 2 && nlat % 2 == 0 =>
        {
            Ok((nlat - 2) / 2)
        }
        PointGridKind::Custom => Err(ShError::InvalidGrid(
            "a custom grid has no associated quadrature degree".into(),
        )),
        _ => Err(ShError::InvalidGrid(format!(
            "{nlat} latitudes do not form a {kind:?} grid"
        ))),
    }
}

fn check_latitudes(lat: &[Radian]) -> Result<(), ShError> {
    // a few ulps of slack at the poles
    let limit = PI_2 * (1.0 + 4.0 * f64::EPSILON);
    if let Some(bad) = lat.iter().find(|l| !l.is_finite() || l.abs() > limit) {
        return Err(ShError::InvalidGrid(format!(
            "latitude {bad} lies outside [-pi/2, pi/2]"
        )));
    }
    Ok(())
}

fn check_radii(r: &[Meter]) -> Result<(), ShError> {
    if let Some(bad) = r.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
        return Err(ShError::InvalidGrid(format!(
            "spherical radius {bad} must be finite and positive"
        )));
    }
    Ok(())
}

fn check_cell_bounds(min: &[f64], max: &[f64], what: &str) -> Result<(), ShError> {
    if let Some((lo, hi)) = min.iter().zip(max).find(|(lo, hi)| !(lo <= hi)) {
        return Err(ShError::InvalidGrid(format!(
            "cell {what} bounds are reversed: min = {lo}, max = {hi}"
        )));
    }
    Ok(())
}
