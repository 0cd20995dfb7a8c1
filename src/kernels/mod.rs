//! # Per-order kernels
//!
//! For one harmonic order `m` and one batch of latitudes, a kernel runs the
//! degree recurrence and folds the Legendre values (or their integrals over a
//! latitude band) with the coefficients into [`Lumped`] accumulators. The
//! mirrored accumulators `a2`, `b2` collect the same terms with the sign
//! `(−1)^{n+m}` (times `(−1)` for an odd latitudinal derivative) and yield
//! the row mirrored about the equator.
//!
//! Modules
//! -----------------
//! * [`shs_point`] – synthesis at points, with the derivative family.
//! * [`shs_cell`] – synthesis of block means over cells.
//! * [`sha_point`] – analysis with quadrature weights.
//! * [`sha_cell`] – analysis of block means.
//! * [`integrals`] – integrals of `P̄nm` over latitude bands.
//!
//! Batch context
//! -----------------
//! [`PointRows`] and [`BandRows`] hold what depends on the latitude batch only
//! (trigonometric values, sectorial chains, radius powers). They are built
//! once per batch and shared read-only by every order task. [`OrderScratch`]
//! is the private scratch of an order task and is the only memory touched in
//! the degree loop.
pub mod integrals;
pub mod sha_cell;
pub mod sha_point;
pub mod shs_cell;
pub mod shs_point;

use std::collections::TryReserveError;

use crate::lanes::{Batch, LANES};
use crate::legendre::coefficients::try_zeroed;
use crate::legendre::{OrderCoefficients, RecursionTables, Sectorials};

/// Degree sums of one order for a latitude batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Lumped {
    pub a: Batch,
    pub b: Batch,
    pub a2: Batch,
    pub b2: Batch,
}

impl Lumped {
    /// `(a, b)` of lane `l`, or `(a2, b2)` for the mirrored row.
    #[inline]
    pub fn pair(&self, l: usize, mirror: bool) -> (f64, f64) {
        if mirror {
            (self.a2[l], self.b2[l])
        } else {
            (self.a[l], self.b[l])
        }
    }

    /// Multiply every accumulator by `s` lane-wise.
    #[inline]
    pub fn scale(&mut self, s: Batch) {
        self.a = self.a * s;
        self.b = self.b * s;
        self.a2 = self.a2 * s;
        self.b2 = self.b2 * s;
    }
}

/// Private scratch of an order task.
#[derive(Debug, Clone)]
pub struct OrderScratch {
    pub coeffs: OrderCoefficients,
    pub column: Vec<Batch>,
    pub column2: Vec<Batch>,
    pub integrals: Vec<Batch>,
}

impl OrderScratch {
    pub fn try_new(nmax: usize) -> Result<Self, TryReserveError> {
        Ok(OrderScratch {
            coeffs: OrderCoefficients::try_new(nmax)?,
            column: try_zeroed(nmax + 1)?,
            column2: Vec::new(),
            integrals: Vec::new(),
        })
    }

    /// Scratch for band kernels: Legendre columns at both band edges and the
    /// integrals over the band.
    pub fn try_new_bands(nmax: usize) -> Result<Self, TryReserveError> {
        let mut scratch = Self::try_new(nmax)?;
        scratch.column2 = try_zeroed(nmax + 1)?;
        scratch.integrals = try_zeroed(nmax + 1)?;
        Ok(scratch)
    }
}

/// `out[k] = ratio^k`, `k = 0..len`, lane-wise.
pub fn radius_powers(ratio: Batch, out: &mut [Batch]) {
    let mut p = Batch::splat(1.0);
    for v in out.iter_mut() {
        *v = p;
        p = p * ratio;
    }
}

/// Batch context of point rows.
///
/// Fields
/// -----------------
/// * `t`, `u` – `sinφ`, `cosφ`.
/// * `tan`, `u_rec` – `tanφ`, `1/cosφ` (latitudinal and longitudinal derivatives).
/// * `valid` – lanes holding a real row.
/// * `mirror` – at least one lane has a mirrored row.
/// * `sect` – sectorial chains per lane.
/// * `rpows` – `(R/r)^k` per lane.
#[derive(Debug, Clone)]
pub struct PointRows {
    pub t: Batch,
    pub u: Batch,
    pub tan: Batch,
    pub u_rec: Batch,
    pub valid: [bool; LANES],
    pub mirror: bool,
    pub sect: Vec<Sectorials>,
    pub rpows: Vec<Batch>,
}

impl PointRows {
    /// Allocate the context; `rpows` gets `nmax + 2 + extra` entries.
    pub fn try_new(nmax: usize, extra: usize) -> Result<Self, TryReserveError> {
        let mut sect = Vec::new();
        sect.try_reserve_exact(LANES)?;
        for _ in 0..LANES {
            sect.push(Sectorials::try_new(nmax)?);
        }
        Ok(PointRows {
            t: Batch::zero(),
            u: Batch::zero(),
            tan: Batch::zero(),
            u_rec: Batch::zero(),
            valid: [false; LANES],
            mirror: false,
            sect,
            rpows: try_zeroed(nmax + 2 + extra)?,
        })
    }

    /// Prepare the context for latitudes `lat`, radii `r` and reference radius `rref`.
    pub fn prepare(
        &mut self,
        tables: &RecursionTables,
        lat: Batch,
        r: Batch,
        rref: f64,
        valid: [bool; LANES],
        mirror: bool,
    ) {
        self.t = lat.map(f64::sin);
        self.u = lat.map(f64::cos);
        self.tan = self.t.zip_map(self.u, |t, u| t / u);
        self.u_rec = self.u.map(|u| 1.0 / u);
        self.valid = valid;
        self.mirror = mirror;
        for (l, s) in self.sect.iter_mut().enumerate() {
            s.prepare(self.u[l], &tables.dm, tables.nmax);
        }
        radius_powers(r.map(|rl| rref / rl), &mut self.rpows);
    }
}

/// Batch context of latitude bands `[lat1, lat2]`.
///
/// Index `1` refers to the southern edge (`latmin`), index `2` to the
/// northern edge (`latmax`).
#[derive(Debug, Clone)]
pub struct BandRows {
    pub lat1: Batch,
    pub lat2: Batch,
    pub t1: Batch,
    pub u1: Batch,
    pub t2: Batch,
    pub u2: Batch,
    pub valid: [bool; LANES],
    pub mirror: bool,
    pub sect1: Vec<Sectorials>,
    pub sect2: Vec<Sectorials>,
    /// `∫ P̄mm` over the band, `m = 0..=nmax` (`imm[0]` unused).
    pub imm: Vec<Batch>,
    pub rpows: Vec<Batch>,
}

impl BandRows {
    pub fn try_new(nmax: usize) -> Result<Self, TryReserveError> {
        let mut sect1 = Vec::new();
        let mut sect2 = Vec::new();
        sect1.try_reserve_exact(LANES)?;
        sect2.try_reserve_exact(LANES)?;
        for _ in 0..LANES {
            sect1.push(Sectorials::try_new(nmax)?);
            sect2.push(Sectorials::try_new(nmax)?);
        }
        Ok(BandRows {
            lat1: Batch::zero(),
            lat2: Batch::zero(),
            t1: Batch::zero(),
            u1: Batch::zero(),
            t2: Batch::zero(),
            u2: Batch::zero(),
            valid: [false; LANES],
            mirror: false,
            sect1,
            sect2,
            imm: try_zeroed(nmax + 1)?,
            rpows: try_zeroed(nmax + 2)?,
        })
    }

    /// Prepare the context for bands `[latmin, latmax]` at radii `r`.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare(
        &mut self,
        tables: &RecursionTables,
        latmin: Batch,
        latmax: Batch,
        r: Batch,
        rref: f64,
        valid: [bool; LANES],
        mirror: bool,
    ) {
        self.lat1 = latmin;
        self.lat2 = latmax;
        self.t1 = latmin.map(f64::sin);
        self.u1 = latmin.map(f64::cos);
        self.t2 = latmax.map(f64::sin);
        self.u2 = latmax.map(f64::cos);
        self.valid = valid;
        self.mirror = mirror;
        for l in 0..LANES {
            self.sect1[l].prepare(self.u1[l], &tables.dm, tables.nmax);
            self.sect2[l].prepare(self.u2[l], &tables.dm, tables.nmax);
        }
        integrals::sectorial_integrals(tables, self, tables.nmax);
        radius_powers(r.map(|rl| rref / rl), &mut self.rpows);
    }

    /// `sinφ2 − sinφ1`, the band area on the unit sphere per radian of longitude.
    pub fn dt(&self) -> Batch {
        self.t2 - self.t1
    }
}
