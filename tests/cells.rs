mod common;

use approx::assert_relative_eq;
use sphharm::coords::{CellGrid, ScatteredCells};
use sphharm::sha::sha_cell;
use sphharm::shs::shs_cell;
use sphharm::{ShCoeffs, ShConfig};

use common::{max_abs, max_abs_diff, random_coeffs};

#[test]
fn constant_means_analyse_to_c00() {
    let config = ShConfig::default();
    let cells = CellGrid::regular(10, 20, 2.0).unwrap();
    let f = vec![0.25; cells.ncells()];
    let mut shcs = ShCoeffs::new(6, 1.0, 2.0).unwrap();
    sha_cell(&cells, &f, 6, &mut shcs, &config).unwrap();

    assert_relative_eq!(shcs.c(0, 0), 0.5, epsilon = 1e-15);
    for n in 1..=6 {
        for m in 0..=n {
            assert!(shcs.c(n, m).abs() < 1e-15, "C{n},{m} = {:e}", shcs.c(n, m));
            assert!(shcs.s(n, m).abs() < 1e-15);
        }
    }
}

#[test]
fn fine_cells_approximately_recover_low_degrees() {
    common::init_tracing();
    let config = ShConfig::default();
    let nmax = 4;
    let shcs = random_coeffs(nmax, 31);
    let cells = CellGrid::regular(180, 360, shcs.r).unwrap();

    let means = shs_cell(&cells.clone().into(), &shcs, nmax, &config).unwrap();
    let mut out = ShCoeffs::new(nmax, shcs.mu, shcs.r).unwrap();
    sha_cell(&cells, &means, nmax, &mut out, &config).unwrap();

    let amplitudes = shcs.degree_amplitudes();
    let dda = shcs.difference_degree_amplitudes(&out).unwrap();
    assert!(dda[0] < 1e-14);
    for n in 1..=nmax {
        assert!(dda[n] < 1e-2 * amplitudes[n], "degree {n}: {:e} vs {:e}", dda[n], amplitudes[n]);
    }
}

#[test]
fn scattered_cells_match_the_grid() {
    let config = ShConfig::default();
    let nmax = 30;
    let shcs = random_coeffs(nmax, 4);
    let grid = CellGrid::regular(24, 48, shcs.r + 100.0).unwrap();
    let g = shs_cell(&grid.clone().into(), &shcs, nmax, &config).unwrap();

    let (mut latmin, mut latmax, mut lonmin, mut lonmax) = (vec![], vec![], vec![], vec![]);
    for i in 0..grid.nlat() {
        for j in 0..grid.nlon() {
            latmin.push(grid.latmin[i]);
            latmax.push(grid.latmax[i]);
            lonmin.push(grid.lonmin[j]);
            lonmax.push(grid.lonmax[j]);
        }
    }
    let r = vec![shcs.r + 100.0; latmin.len()];
    let scattered = ScatteredCells::new(latmin, latmax, lonmin, lonmax, r).unwrap();
    let s = shs_cell(&scattered.into(), &shcs, nmax, &config).unwrap();
    assert!(max_abs_diff(&g, &s) <= 1e-12 * max_abs(&g));
}
