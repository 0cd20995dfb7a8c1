//! # Polar optimization
//!
//! Near the poles `P̄nm(sinφ)` decays like `cosᵐφ`, so high orders contribute
//! nothing representable to a latitude close to a pole. An order `m` is
//! skipped for a latitude batch when
//!
//! ```text
//! m − nmax·cosφ > polar_a1 + polar_a2·nmax
//! ```
//!
//! holds for **every** valid lane of the batch. A batch where one lane still
//! needs the order computes it for all lanes. The optimization is off while
//! `polar_a2 < 0` (the default).
use crate::config::ShConfig;
use crate::lanes::{Batch, LANES};

/// `true` if order `m` may be skipped for every valid lane of a point batch.
///
/// Arguments
/// -----------------
/// * `u` – `cosφ` per lane.
/// * `valid` – lanes holding a real latitude (padding lanes are ignored).
pub fn skip_order(m: usize, nmax: usize, u: &Batch, valid: &[bool; LANES], config: &ShConfig) -> bool {
    if !config.polar_optimization_enabled() || !valid.iter().any(|&v| v) {
        return false;
    }
    let threshold = config.polar_threshold(nmax);
    let (mf, nf) = (m as f64, nmax as f64);
    u.all_masked(valid, |ul| mf - nf * ul > threshold)
}

/// Largest `cosφ` over a latitude band, `1` if the band contains the equator.
#[inline]
pub fn band_max_cos(latmin: f64, latmax: f64) -> f64 {
    if latmin <= 0.0 && latmax >= 0.0 {
        1.0
    } else {
        latmin.cos().max(latmax.cos())
    }
}

/// [`skip_order`] for a batch of latitude bands, using the largest `cosφ`
/// reached inside each band.
pub fn skip_order_cells(
    m: usize,
    nmax: usize,
    latmin: &Batch,
    latmax: &Batch,
    valid: &[bool; LANES],
    config: &ShConfig,
) -> bool {
    let u = latmin.zip_map(*latmax, band_max_cos);
    skip_order(m, nmax, &u, valid, config)
}
