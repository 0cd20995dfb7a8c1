mod common;

use sphharm::coords::{CellGrid, CellSet, PointGrid, PointSet};
use sphharm::shs::{shs_cell, shs_point, shs_point_derivative};
use sphharm::{Derivative, LonSummation, ShConfig};

use common::{max_abs, max_abs_diff, random_coeffs};

#[test]
fn mirrored_rows_match_direct_evaluation_bitwise() {
    let nmax = 33;
    let shcs = random_coeffs(nmax, 42);
    let config = ShConfig::default();
    let grid = PointGrid::gauss_legendre(nmax, shcs.r).unwrap();
    let nlon = grid.nlon();
    let nlat = grid.nlat();

    for deriv in [Derivative::Value, Derivative::Lat, Derivative::RLon, Derivative::LatLat] {
        let f = shs_point_derivative(&grid.clone().into(), &shcs, nmax, deriv, &config).unwrap();
        for north in [0, 5, nlat / 2 - 1] {
            let south = nlat - 1 - north;
            let single = PointGrid::custom_sphere(vec![-grid.lat[north]], grid.lon.clone(), shcs.r).unwrap();
            let direct = shs_point_derivative(&single.into(), &shcs, nmax, deriv, &config).unwrap();
            assert_eq!(
                &f[south * nlon..(south + 1) * nlon],
                &direct[..],
                "{deriv:?}, row {south}"
            );
        }
    }
}

#[test]
fn thread_count_is_bit_identical() {
    let nmax = 64;
    let shcs = random_coeffs(nmax, 1);
    let one = ShConfig::builder().num_threads(1).build().unwrap();
    let many = ShConfig::builder().num_threads(5).build().unwrap();

    let points: PointSet = PointGrid::driscoll_healy2(nmax, shcs.r + 250.0).unwrap().into();
    assert_eq!(
        shs_point(&points, &shcs, nmax, &one).unwrap(),
        shs_point(&points, &shcs, nmax, &many).unwrap()
    );

    let cells: CellSet = CellGrid::regular(2 * nmax + 2, 4 * nmax + 4, shcs.r).unwrap().into();
    assert_eq!(
        shs_cell(&cells, &shcs, nmax, &one).unwrap(),
        shs_cell(&cells, &shcs, nmax, &many).unwrap()
    );

    let grid = PointGrid::gauss_legendre(nmax, shcs.r).unwrap();
    let f = shs_point(&grid.clone().into(), &shcs, nmax, &one).unwrap();
    let mut a = sphharm::ShCoeffs::new(nmax, shcs.mu, shcs.r).unwrap();
    let mut b = a.clone();
    sphharm::sha::sha_point(&grid, &f, nmax, &mut a, &one).unwrap();
    sphharm::sha::sha_point(&grid, &f, nmax, &mut b, &many).unwrap();
    assert_eq!(a, b);
}

#[test]
fn fft_and_pslr_agree() {
    let nmax = 90;
    let shcs = random_coeffs(nmax, 9);
    let fft = ShConfig::default();
    let pslr = ShConfig::builder().lon_summation(LonSummation::ForcePslr).build().unwrap();

    for deriv in [Derivative::Value, Derivative::R, Derivative::RR] {
        let points: PointSet = PointGrid::gauss_legendre(nmax, shcs.r).unwrap().into();
        let a = shs_point_derivative(&points, &shcs, nmax, deriv, &fft).unwrap();
        let b = shs_point_derivative(&points, &shcs, nmax, deriv, &pslr).unwrap();
        assert!(max_abs_diff(&a, &b) <= 1e-13 * max_abs(&a), "{deriv:?}");
    }
}

#[test]
fn polar_optimization_is_harmless() {
    common::init_tracing();
    let nmax = 200;
    let shcs = random_coeffs(nmax, 77);
    let plain = ShConfig::default();
    let polar = ShConfig::builder().polar_a1(50).polar_a2(0.0).build().unwrap();
    assert!(!plain.polar_optimization_enabled());
    assert!(polar.polar_optimization_enabled());

    let points: PointSet = PointGrid::gauss_legendre(nmax, shcs.r).unwrap().into();
    let a = shs_point(&points, &shcs, nmax, &plain).unwrap();
    let b = shs_point(&points, &shcs, nmax, &polar).unwrap();
    assert!(max_abs_diff(&a, &b) <= 1e-14 * max_abs(&a));

    let cells: CellSet = CellGrid::regular(nmax + 1, 2 * nmax + 2, shcs.r).unwrap().into();
    let a = shs_cell(&cells, &shcs, nmax, &plain).unwrap();
    let b = shs_cell(&cells, &shcs, nmax, &polar).unwrap();
    assert!(max_abs_diff(&a, &b) <= 1e-14 * max_abs(&a));
}
