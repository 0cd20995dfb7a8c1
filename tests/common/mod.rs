#![allow(dead_code)]

use camino::Utf8PathBuf;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sphharm::ShCoeffs;

pub const GM: f64 = 3.986_004_415e14;
pub const R: f64 = 6_378_136.3;

/// Coefficients with a Kaula-like decay and uniform random signs, `C00 = 1`.
pub fn random_coeffs(nmax: usize, seed: u64) -> ShCoeffs {
    let mut rng = StdRng::seed_from_u64(seed);
    ShCoeffs::from_fn(nmax, GM, R, |n, m| {
        if n == 0 {
            return (1.0, 0.0);
        }
        let sigma = 1e-5 / (n * n) as f64;
        let c = sigma * rng.random_range(-1.0..1.0);
        let s = if m == 0 { 0.0 } else { sigma * rng.random_range(-1.0..1.0) };
        (c, s)
    })
    .unwrap()
}

pub fn data_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Fresh directory under the system temp dir, unique per test name.
pub fn scratch_dir(test: &str) -> Utf8PathBuf {
    let base = Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap();
    let dir = base.join(format!("sphharm-{test}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0.0, |acc, (x, y)| acc.max((x - y).abs()))
}

/// Largest coefficient difference over degrees `0..=nmax`.
pub fn max_coeff_diff(a: &ShCoeffs, b: &ShCoeffs, nmax: usize) -> f64 {
    let mut worst: f64 = 0.0;
    for n in 0..=nmax {
        for m in 0..=n {
            worst = worst
                .max((a.c(n, m) - b.c(n, m)).abs())
                .max((a.s(n, m) - b.s(n, m)).abs());
        }
    }
    worst
}

/// Route the library's tracing output to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
