//! Point synthesis kernel and its derivative family.
//!
//! A [`Derivative`] selects one quantity
//!
//! ```text
//! (1/r)^{dlat+dlon} · (1/cosφ)^{dlon} · ∂^{dr+dlat+dlon} f / ∂r^{dr} ∂φ^{dlat} ∂λ^{dlon}
//! ```
//!
//! with `dr + dlat + dlon ≤ 2`. The radial order changes the degree
//! amplitude and the radius power, the latitudinal order the Legendre factor,
//! the longitudinal order rotates the lumped pair after the degree loop.
use crate::lanes::Batch;
use crate::legendre::{fill_column, RecursionTables};
use crate::sh_errors::ShError;
use crate::shc::ShCoeffs;

use super::{Lumped, OrderScratch, PointRows};

/// Quantity synthesized by the point kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Derivative {
    #[default]
    Value,
    R,
    RR,
    Lat,
    LatLat,
    Lon,
    LonLon,
    RLat,
    RLon,
    LatLon,
}

impl Derivative {
    pub const ALL: [Derivative; 10] = [
        Derivative::Value,
        Derivative::R,
        Derivative::RR,
        Derivative::Lat,
        Derivative::LatLat,
        Derivative::Lon,
        Derivative::LonLon,
        Derivative::RLat,
        Derivative::RLon,
        Derivative::LatLon,
    ];

    /// Derivative from its orders `(dr, dlat, dlon)`.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::UnsupportedDerivative)` for combinations outside the family.
    pub fn from_orders(dr: u8, dlat: u8, dlon: u8) -> Result<Self, ShError> {
        Self::ALL
            .into_iter()
            .find(|d| d.orders() == (dr, dlat, dlon))
            .ok_or(ShError::UnsupportedDerivative { dr, dlat, dlon })
    }

    /// `(dr, dlat, dlon)`.
    pub fn orders(self) -> (u8, u8, u8) {
        match self {
            Derivative::Value => (0, 0, 0),
            Derivative::R => (1, 0, 0),
            Derivative::RR => (2, 0, 0),
            Derivative::Lat => (0, 1, 0),
            Derivative::LatLat => (0, 2, 0),
            Derivative::Lon => (0, 0, 1),
            Derivative::LonLon => (0, 0, 2),
            Derivative::RLat => (1, 1, 0),
            Derivative::RLon => (1, 0, 1),
            Derivative::LatLon => (0, 1, 1),
        }
    }

    /// `dr + dlat + dlon`.
    pub fn total(self) -> usize {
        let (dr, dlat, dlon) = self.orders();
        (dr + dlat + dlon) as usize
    }

    /// `true` if the quantity involves `1/cosφ` and is undefined at the poles.
    pub fn is_angular(self) -> bool {
        let (_, dlat, dlon) = self.orders();
        dlat + dlon > 0
    }

    /// Degree amplitude of the radial derivative.
    #[inline]
    fn amplitude(dr: u8, n: usize) -> f64 {
        let nf = n as f64;
        match dr {
            0 => 1.0,
            1 => nf + 1.0,
            _ => (nf + 1.0) * (nf + 2.0),
        }
    }
}

/// Lumped coefficients of order `m` for a batch of point rows.
///
/// Arguments
/// -----------------
/// * `rows` – batch context; `rows.rpows` must hold `(R/r)^k` up to
///   `k = nmax + 1 + deriv.total()`.
/// * `scratch` – the order task's scratch, overwritten.
///
/// Return
/// ----------
/// * Lumped sums without the factor `mu/R^{d+1}`.
#[allow(clippy::too_many_arguments)]
pub fn shs_point_kernel(
    m: usize,
    nmax: usize,
    shcs: &ShCoeffs,
    tables: &RecursionTables,
    rows: &PointRows,
    deriv: Derivative,
    dynamic_switching: bool,
    scratch: &mut OrderScratch,
) -> Lumped {
    let mut out = [Lumped::default()];
    shs_point_kernels(m, nmax, shcs, tables, rows, &[deriv], dynamic_switching, scratch, &mut out);
    out[0]
}

/// [`shs_point_kernel`] for several derivatives sharing one Legendre column.
///
/// `out[i]` receives the lumped sums of `derivs[i]`, each bit-identical to a
/// separate [`shs_point_kernel`] call. `rows.rpows` must cover the largest
/// total order in `derivs`.
#[allow(clippy::too_many_arguments)]
pub fn shs_point_kernels(
    m: usize,
    nmax: usize,
    shcs: &ShCoeffs,
    tables: &RecursionTables,
    rows: &PointRows,
    derivs: &[Derivative],
    dynamic_switching: bool,
    scratch: &mut OrderScratch,
    out: &mut [Lumped],
) {
    scratch.coeffs.fill(tables, m);
    if derivs.iter().any(|d| d.orders().1 > 0) {
        scratch.coeffs.fill_enm(tables, m);
    }
    fill_column(
        m,
        nmax,
        &scratch.coeffs,
        &rows.t,
        &rows.sect,
        dynamic_switching,
        &mut scratch.column,
    );

    for (&deriv, lc) in derivs.iter().zip(out.iter_mut()) {
        *lc = degree_sums(m, nmax, shcs, rows, deriv, &scratch.coeffs.enm, &scratch.column);
    }
}

/// Degree loop of one derivative over a filled Legendre column.
fn degree_sums(
    m: usize,
    nmax: usize,
    shcs: &ShCoeffs,
    rows: &PointRows,
    deriv: Derivative,
    enm: &[f64],
    col: &[Batch],
) -> Lumped {
    let (dr, dlat, dlon) = deriv.orders();
    let d = deriv.total();

    let cm = shcs.c_column(m);
    let sm = shcs.s_column(m);
    let mm = (m * m) as f64;
    let u_rec2 = rows.u_rec * rows.u_rec;

    let mut lc = Lumped::default();
    for n in m..=nmax {
        let k = n - m;
        let p = col[k];
        let q = match dlat {
            0 => p,
            _ => {
                let pm1 = if k == 0 { Batch::zero() } else { col[k - 1] };
                let dp = rows.u_rec * (pm1 * enm[n]) - (rows.tan * p) * (n as f64);
                if dlat == 1 {
                    dp
                } else {
                    rows.tan * dp + p * (u_rec2 * mm - Batch::splat((n * (n + 1)) as f64))
                }
            }
        };

        let ampl = Derivative::amplitude(dr, n);
        let rp = rows.rpows[n + 1 + d];
        let tc = rp * ((q * cm[k]) * ampl);
        let ts = rp * ((q * sm[k]) * ampl);
        lc.a += tc;
        lc.b += ts;

        if rows.mirror {
            if (n + m + dlat as usize) % 2 == 0 {
                lc.a2 += tc;
                lc.b2 += ts;
            } else {
                lc.a2 = lc.a2 - tc;
                lc.b2 = lc.b2 - ts;
            }
        }
    }

    let mf = m as f64;
    match dlon {
        0 => {}
        1 => {
            let rot = |a: Batch, b: Batch| ((b * mf) * rows.u_rec, (-(a * mf)) * rows.u_rec);
            (lc.a, lc.b) = rot(lc.a, lc.b);
            (lc.a2, lc.b2) = rot(lc.a2, lc.b2);
        }
        _ => lc.scale(u_rec2 * (-mm)),
    }
    if dr == 1 {
        lc.scale(Batch::splat(-1.0));
    }
    lc
}
