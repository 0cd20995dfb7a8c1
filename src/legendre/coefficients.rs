//! Recursion coefficients of the fully-normalized Legendre functions.
//!
//! [`RecursionTables`] holds everything that depends on `nmax` only and is
//! computed once per transform call. [`OrderCoefficients`] holds the
//! degree-indexed coefficients of one harmonic order and is refilled for every
//! order inside the parallel loop, so it is part of the per-thread scratch.
use std::collections::TryReserveError;

/// Degree-indexed tables shared by every harmonic order of one transform.
///
/// * `r[k] = √k`, `ri[k] = 1/√k` for `k = 0..=2·nmax+3` (`ri[0] = 0`).
/// * `dm[n] = √((2n+3)/(2n+2))`, the sectorial step `P̄_{n+1,n+1} = dm[n]·cosφ·P̄_{nn}` (`n ≥ 1`).
/// * `en[n] = (2n-1)/n`, `fn_[n] = (n-1)/n`: recurrence of un-normalized Legendre polynomials
///   (`n = 2..=nmax+1`).
/// * `gm[n]`, `hm[n]`: recurrences of the integrals of P̄nm over a latitude band.
#[derive(Debug, Clone)]
pub struct RecursionTables {
    pub nmax: usize,
    pub r: Vec<f64>,
    pub ri: Vec<f64>,
    pub dm: Vec<f64>,
    pub en: Vec<f64>,
    pub fn_: Vec<f64>,
    pub gm: Vec<f64>,
    pub hm: Vec<f64>,
}

impl RecursionTables {
    pub fn new(nmax: usize) -> Self {
        let (r, ri) = r_ri(nmax);
        let dm = dm(nmax, &r, &ri);
        let (en, fn_) = en_fn(nmax + 1);
        let (gm, hm) = gm_hm(nmax, &r, &ri);

        RecursionTables {
            nmax,
            r,
            ri,
            dm,
            en,
            fn_,
            gm,
            hm,
        }
    }
}

fn r_ri(nmax: usize) -> (Vec<f64>, Vec<f64>) {
    let len = 2 * nmax + 4;
    let mut r = vec![0.0; len];
    let mut ri = vec![0.0; len];
    for k in 1..len {
        r[k] = (k as f64).sqrt();
        ri[k] = 1.0 / r[k];
    }
    (r, ri)
}

fn dm(nmax: usize, r: &[f64], ri: &[f64]) -> Vec<f64> {
    let mut dm = vec![0.0; nmax + 1];
    for n in 1..=nmax {
        dm[n] = r[2 * n + 3] * ri[2 * n + 2];
    }
    dm
}

fn en_fn(nmax: usize) -> (Vec<f64>, Vec<f64>) {
    let mut en = vec![0.0; nmax + 1];
    let mut fn_ = vec![0.0; nmax + 1];
    for n in 2..=nmax {
        let nf = n as f64;
        en[n] = (2.0 * nf - 1.0) / nf;
        fn_[n] = (nf - 1.0) / nf;
    }
    (en, fn_)
}

fn gm_hm(nmax: usize, r: &[f64], ri: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut gm = vec![0.0; nmax + 1];
    let mut hm = vec![0.0; nmax + 1];
    for n in 0..=nmax {
        // hm is only consumed for n >= m + 2 >= 2
        hm[n] = (n as f64 - 2.0) / (n as f64 + 1.0);
        if n >= 3 {
            gm[n] = 1.0 / (2.0 * n as f64 + 2.0) * r[n] * r[2 * n + 1] * r[2 * n - 1] * ri[n - 1];
        }
    }
    (gm, hm)
}

/// Three-term recurrence coefficients of one harmonic order `m`.
///
/// After [`OrderCoefficients::fill`]:
/// * `anm[m+1] = √(2m+3)` seeds the semisectorial step, `bnm[m+1] = 0`;
/// * `anm[n]`, `bnm[n]` for `n = m+2..=nmax` drive
///   `P̄nm = anm[n]·sinφ·P̄_{n-1,m} − bnm[n]·P̄_{n-2,m}`;
/// * every entry with `n ≤ m` is zero.
///
/// `enm` (first latitudinal derivative) is only filled by [`OrderCoefficients::fill_enm`].
#[derive(Debug, Clone, Default)]
pub struct OrderCoefficients {
    pub m: usize,
    pub anm: Vec<f64>,
    pub bnm: Vec<f64>,
    pub enm: Vec<f64>,
}

impl OrderCoefficients {
    /// Allocate the scratch for degrees up to `nmax`, reporting allocation failures.
    pub fn try_new(nmax: usize) -> Result<Self, TryReserveError> {
        Ok(OrderCoefficients {
            m: 0,
            anm: try_zeroed(nmax + 1)?,
            bnm: try_zeroed(nmax + 1)?,
            enm: try_zeroed(nmax + 1)?,
        })
    }

    pub fn fill(&mut self, tables: &RecursionTables, m: usize) {
        let nmax = tables.nmax;
        let (r, ri) = (&tables.r, &tables.ri);
        self.m = m;

        let upper = (m + 1).min(nmax + 1);
        self.anm[..upper].fill(0.0);
        self.bnm[..upper].fill(0.0);
        if m >= nmax {
            return;
        }

        self.anm[m + 1] = r[2 * m + 3];
        self.bnm[m + 1] = 0.0;

        for n in (m + 2)..=nmax {
            let w = r[2 * n + 1] * ri[n - m] * ri[n + m];
            self.anm[n] = r[2 * n - 1] * w;
            self.bnm[n] = r[n - m - 1] * r[n + m - 1] * ri[2 * n - 3] * w;
        }
    }

    /// `enm[n] = √((2n+1)(n−m)(n+m)/(2n−1))` for `n > m`, `enm[m] = 0`.
    pub fn fill_enm(&mut self, tables: &RecursionTables, m: usize) {
        let nmax = tables.nmax;
        let (r, ri) = (&tables.r, &tables.ri);

        self.enm[..=m.min(nmax)].fill(0.0);
        for n in (m + 1)..=nmax {
            self.enm[n] = r[2 * n + 1] * r[n - m] * r[n + m] * ri[2 * n - 1];
        }
    }
}

pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, T::default());
    Ok(v)
}

#[cfg(test)]
mod coefficients_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_r_ri() {
        let t = RecursionTables::new(5);
        assert_eq!(t.r.len(), 14);
        assert_eq!(t.r[0], 0.0);
        assert_eq!(t.ri[0], 0.0);
        assert_eq!(t.r[4], 2.0);
        assert_eq!(t.ri[4], 0.5);
    }

    #[test]
    fn test_anm_bnm_closed_form() {
        let nmax = 40;
        let tables = RecursionTables::new(nmax);
        let mut oc = OrderCoefficients::try_new(nmax).unwrap();

        for m in [0, 1, 7, 38, 39, 40] {
            oc.fill(&tables, m);
            for n in 0..=m.min(nmax) {
                assert_eq!(oc.anm[n], 0.0);
                assert_eq!(oc.bnm[n], 0.0);
            }
            if m < nmax {
                assert_relative_eq!(oc.anm[m + 1], ((2 * m + 3) as f64).sqrt());
            }
            for n in (m + 2)..=nmax {
                let (nf, mf) = (n as f64, m as f64);
                let a = ((2.0 * nf - 1.0) * (2.0 * nf + 1.0) / ((nf - mf) * (nf + mf))).sqrt();
                let b = ((2.0 * nf + 1.0) * (nf + mf - 1.0) * (nf - mf - 1.0)
                    / ((nf - mf) * (nf + mf) * (2.0 * nf - 3.0)))
                    .sqrt();
                assert_relative_eq!(oc.anm[n], a, max_relative = 1e-14);
                assert_relative_eq!(oc.bnm[n], b, max_relative = 1e-14);
            }
        }
    }

    #[test]
    fn test_refill_clears_previous_order() {
        let tables = RecursionTables::new(10);
        let mut oc = OrderCoefficients::try_new(10).unwrap();
        oc.fill(&tables, 2);
        oc.fill(&tables, 6);
        for n in 0..=6 {
            assert_eq!(oc.anm[n], 0.0);
            assert_eq!(oc.bnm[n], 0.0);
        }
    }

    #[test]
    fn test_dm_en_fn_hm() {
        let tables = RecursionTables::new(6);
        assert_relative_eq!(tables.dm[1], (5.0f64 / 4.0).sqrt(), max_relative = 1e-15);
        assert_eq!(tables.en.len(), 8);
        assert_eq!(tables.en[2], 1.5);
        assert_eq!(tables.fn_[2], 0.5);
        assert_eq!(tables.en[7], 13.0 / 7.0);
        assert_eq!(tables.hm[5], 0.5);
        assert_eq!(tables.gm[2], 0.0);
        assert!(tables.gm[3] > 0.0);
    }

    #[test]
    fn test_enm() {
        let tables = RecursionTables::new(8);
        let mut oc = OrderCoefficients::try_new(8).unwrap();
        oc.fill_enm(&tables, 3);
        assert_eq!(oc.enm[3], 0.0);
        let expected = (11.0f64 * 2.0 * 8.0 / 9.0).sqrt();
        assert_relative_eq!(oc.enm[5], expected, max_relative = 1e-14);
    }
}
