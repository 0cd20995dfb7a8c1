//! PSLR longitude summation (Balmino et al., 2012).
//!
//! Along a row of equally spaced longitudes `λ_j = λ_0 + jΔλ` the order-`m`
//! contribution `d_j = a·cos(mλ_j) + b·sin(mλ_j)` obeys
//!
//! ```text
//! d_{j+1} = 2cos(mΔλ)·d_j − d_{j−1}
//! ```
//!
//! so only the first two longitudes need trigonometric functions.

/// Add `Σ_m a_m cos(mλ_j) + b_m sin(mλ_j)` to `out[j]`, `λ_j = lon0 + j·dlon`.
///
/// `pair(m)` returns `(a_m, b_m)`; orders are summed in increasing order.
pub fn pslr_row(
    nmax: usize,
    pair: impl Fn(usize) -> (f64, f64),
    lon0: f64,
    dlon: f64,
    out: &mut [f64],
) {
    let nlon = out.len();
    if nlon == 0 {
        return;
    }
    for m in 0..=nmax {
        let (a, b) = pair(m);
        let mf = m as f64;

        let (s, c) = (mf * lon0).sin_cos();
        let mut d0 = a * c + b * s;
        out[0] += d0;
        if nlon == 1 {
            continue;
        }

        let (s, c) = (mf * (lon0 + dlon)).sin_cos();
        let mut d1 = a * c + b * s;
        out[1] += d1;
        if nlon == 2 {
            continue;
        }

        let cm2 = 2.0 * (mf * dlon).cos();
        for v in out.iter_mut().skip(2) {
            let d2 = cm2 * d1 - d0;
            *v += d2;
            d0 = d1;
            d1 = d2;
        }
    }
}

/// `Σ_m a_m cos(mλ) + b_m sin(mλ)` at a single longitude.
pub fn point_sum(nmax: usize, pair: impl Fn(usize) -> (f64, f64), lon: f64) -> f64 {
    let mut out = [0.0];
    pslr_row(nmax, pair, lon, 0.0, &mut out);
    out[0]
}
