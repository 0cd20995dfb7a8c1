//! # Extended-range Legendre evaluation
//!
//! Fully-normalized associated Legendre functions `P̄nm(sinφ)` underflow long
//! before `nmax` reaches the thousands: the sectorial seed `P̄mm ∝ cosᵐφ` drops
//! below the smallest subnormal double for large `m` near the poles, although
//! the tesseral values reached later in the degree loop are perfectly
//! representable. This module carries such values as **X-numbers**
//! (Fukushima, 2012): a mantissa `x` and an integer exponent counter `ix`
//! representing `x · BIG^ix`, where `BIG = 2^960`.
//!
//! Layout
//! -----------------
//! * [`XNum`] – the extended-range scalar with its renormalization rule.
//! * [`Sectorials`] – the chain `P̄11, P̄22, …` of one latitude, prepared once
//!   per latitude and consumed by every order.
//! * [`fill_column`] – evaluates the column `P̄_{m..=nmax, m}` for a whole
//!   [`Batch`] of latitudes, leaving the X-number arithmetic for the plain
//!   recurrence once every lane has settled ("dynamic switching").
//! * [`plain_column`] – the same column computed in plain `f64`, used as a
//!   reference where no underflow occurs.
//!
//! Dynamic switching
//! -----------------
//! The plain step `z = (anm·t)·x − bnm·y` is exactly the X-number step with
//! `ix = iy = 0` minus the renormalization. Once both exponent counters are
//! zero for every lane of the batch the magnitudes only grow towards `O(1)`
//! again, so the X-number path would not renormalize anymore either. The
//! switched column is therefore bit-identical to the column computed with
//! X-numbers throughout, and the switch never reverts within one order.
use crate::constants::{BIG, BIGI, BIGS, BIGSI, ROOT3};
use crate::lanes::{Batch, LANES};

use super::coefficients::OrderCoefficients;

/// Extended-range scalar `x · BIG^ix`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct XNum {
    pub x: f64,
    pub ix: i32,
}

impl XNum {
    #[inline]
    pub fn new(x: f64, ix: i32) -> Self {
        XNum { x, ix }
    }

    /// Bring the mantissa back into `[BIGSI, BIGS)` with one rescale step.
    ///
    /// A single step is enough because every recurrence multiplies by factors
    /// of moderate size between two normalizations.
    #[inline]
    pub fn normalized(self) -> Self {
        let w = self.x.abs();
        if w >= BIGS {
            XNum {
                x: self.x * BIGI,
                ix: self.ix + 1,
            }
        } else if w < BIGSI {
            XNum {
                x: self.x * BIG,
                ix: self.ix - 1,
            }
        } else {
            self
        }
    }

    /// Convert back to `f64`, flushing anything below `BIGI²` to zero.
    #[inline]
    pub fn to_f64(self) -> f64 {
        match self.ix {
            0 => self.x,
            -1 => self.x * BIGI,
            ix if ix < -1 => 0.0,
            _ => self.x * BIG,
        }
    }

    /// One tesseral step `z = w·x − b·y`, with `w = anm·t`, `self = x`, `prev = y`.
    ///
    /// Operands whose exponent counters differ by one are brought to the
    /// larger scale before the subtraction; a difference of two or more makes
    /// the smaller operand negligible.
    #[inline]
    pub fn tesseral_step(self, prev: XNum, w: f64, b: f64) -> XNum {
        let (z, iz) = match self.ix - prev.ix {
            0 => (w * self.x - b * prev.x, self.ix),
            1 => (w * self.x - b * (prev.x * BIGI), self.ix),
            -1 => (w * (self.x * BIGI) - b * prev.x, prev.ix),
            d if d > 1 => (w * self.x, self.ix),
            _ => (-b * prev.x, prev.ix),
        };
        XNum::new(z, iz).normalized()
    }
}

/// Sectorial chain of one latitude: `ps[k]·BIG^ips[k] = P̄_{k+1,k+1}(φ)`.
#[derive(Debug, Clone, Default)]
pub struct Sectorials {
    ps: Vec<f64>,
    ips: Vec<i32>,
}

impl Sectorials {
    /// Allocate room for orders `1..=nmax`.
    pub fn try_new(nmax: usize) -> Result<Self, std::collections::TryReserveError> {
        Ok(Sectorials {
            ps: super::coefficients::try_zeroed(nmax.max(1))?,
            ips: super::coefficients::try_zeroed(nmax.max(1))?,
        })
    }

    /// Build the chain for `u = cosφ` using `dm` from the recursion tables.
    ///
    /// Arguments
    /// -----------------
    /// * `u` – cosine of the latitude (≥ 0).
    /// * `dm` – sectorial step coefficients `dm[n] = √((2n+3)/(2n+2))`.
    /// * `nmax` – highest order to prepare.
    pub fn prepare(&mut self, u: f64, dm: &[f64], nmax: usize) {
        if nmax == 0 {
            return;
        }
        let mut x = ROOT3 * u;
        let mut ix = 0;
        self.ps[0] = x;
        self.ips[0] = ix;
        for n in 1..nmax {
            let xn = XNum::new((dm[n] * u) * x, ix).normalized();
            x = xn.x;
            ix = xn.ix;
            self.ps[n] = x;
            self.ips[n] = ix;
        }
    }

    /// `P̄mm` as an X-number (`m ≥ 1`).
    #[inline]
    pub fn get(&self, m: usize) -> XNum {
        XNum::new(self.ps[m - 1], self.ips[m - 1])
    }
}

/// Fill `out[k]` with `P̄_{m+k,m}` for `k = 0..=nmax-m` and every lane of the batch.
///
/// Arguments
/// -----------------
/// * `coeffs` – recurrence coefficients already filled for order `m`.
/// * `t` – `sinφ` per lane.
/// * `sect` – one prepared [`Sectorials`] per lane (unused for `m = 0`).
/// * `dynamic_switching` – leave the X-number arithmetic once every lane has
///   both exponent counters at zero.
/// * `out` – at least `nmax - m + 1` entries.
///
/// Underflowed values come out as exact zeros while the X-number state keeps
/// running, so later degrees recover their true magnitude.
pub fn fill_column(
    m: usize,
    nmax: usize,
    coeffs: &OrderCoefficients,
    t: &Batch,
    sect: &[Sectorials],
    dynamic_switching: bool,
    out: &mut [Batch],
) {
    let (anm, bnm) = (&coeffs.anm, &coeffs.bnm);

    if m == 0 {
        out[0] = Batch::splat(1.0);
        if nmax == 0 {
            return;
        }
        out[1] = t.map(|tl| ROOT3 * tl);
        plain_tail(2, nmax, 0, anm, bnm, t, out);
        return;
    }

    let mut x: [XNum; LANES] = std::array::from_fn(|l| sect[l].get(m));
    let mut y = [XNum::default(); LANES];
    out[0] = Batch::from_fn(|l| x[l].to_f64());
    if m == nmax {
        return;
    }

    // semisectorial
    for l in 0..LANES {
        y[l] = x[l];
        x[l] = XNum::new((anm[m + 1] * t[l]) * y[l].x, y[l].ix).normalized();
    }
    out[1] = Batch::from_fn(|l| x[l].to_f64());

    let mut n = m + 2;
    while n <= nmax {
        let (a, b) = (anm[n], bnm[n]);
        let mut settled = true;
        for l in 0..LANES {
            let z = x[l].tesseral_step(y[l], a * t[l], b);
            y[l] = x[l];
            x[l] = z;
            out[n - m][l] = z.to_f64();
            settled &= x[l].ix == 0 && y[l].ix == 0;
        }
        n += 1;
        if dynamic_switching && settled {
            break;
        }
    }

    if n <= nmax {
        let p0 = Batch::from_fn(|l| y[l].x);
        let p1 = Batch::from_fn(|l| x[l].x);
        out[n - m - 2] = p0;
        out[n - m - 1] = p1;
        plain_tail(n, nmax, m, anm, bnm, t, out);
    }
}

/// Plain recurrence for degrees `from..=nmax`, seeded by `out[from-m-2]` and `out[from-m-1]`.
#[inline]
fn plain_tail(
    from: usize,
    nmax: usize,
    m: usize,
    anm: &[f64],
    bnm: &[f64],
    t: &Batch,
    out: &mut [Batch],
) {
    for n in from..=nmax {
        let (a, b) = (anm[n], bnm[n]);
        let p1 = out[n - m - 1];
        let p0 = out[n - m - 2];
        out[n - m] = Batch::from_fn(|l| (a * t[l]) * p1[l] - b * p0[l]);
    }
}

/// Reference column `P̄_{m..=nmax, m}(sinφ)` evaluated in plain `f64`.
///
/// Same operation order as [`fill_column`]; only valid while nothing
/// underflows, i.e. for moderate `m` or latitudes away from the poles.
pub fn plain_column(
    m: usize,
    nmax: usize,
    coeffs: &OrderCoefficients,
    dm: &[f64],
    t: f64,
    u: f64,
) -> Vec<f64> {
    let mut out = vec![0.0; nmax - m + 1];
    let (anm, bnm) = (&coeffs.anm, &coeffs.bnm);

    if m == 0 {
        out[0] = 1.0;
        if nmax == 0 {
            return out;
        }
        out[1] = ROOT3 * t;
    } else {
        let mut pmm = ROOT3 * u;
        for d in dm.iter().take(m).skip(1) {
            pmm *= d * u;
        }
        out[0] = pmm;
        if m == nmax {
            return out;
        }
        out[1] = (anm[m + 1] * t) * pmm;
    }
    for n in (m + 2)..=nmax {
        out[n - m] = (anm[n] * t) * out[n - m - 1] - bnm[n] * out[n - m - 2];
    }
    out
}
