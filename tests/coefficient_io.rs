mod common;

use sphharm::shc::io_text::TableOrdering;
use sphharm::{ShCoeffs, ShError};

use common::{data_path, random_coeffs, scratch_dir};

#[test]
fn reference_files_agree() {
    let mtx = ShCoeffs::read_mtx(&data_path("reference-degree10.mtx"), 10).unwrap();
    let tbl = ShCoeffs::read_tbl(&data_path("reference-degree10.tbl"), 10).unwrap();
    assert_eq!(mtx, tbl);
    assert_eq!(mtx.c(0, 0), 1.0);
    assert_eq!(mtx.c(2, 0), -4.84165371736e-4);
    assert_eq!(mtx.s(2, 2), -1.40016683654e-6);
    assert_eq!(mtx.r, 6_378_136.3);

    let low = ShCoeffs::read_tbl(&data_path("reference-degree10.tbl"), 4).unwrap();
    assert_eq!(low.nmax(), 4);
    assert_eq!(low.c(4, 0), mtx.c(4, 0));

    assert_eq!(
        ShCoeffs::read_mtx(&data_path("reference-degree10.mtx"), 11).unwrap_err(),
        ShError::DegreeTooHigh {
            requested: 11,
            available: 10
        }
    );
}

#[test]
fn gfc_and_dov_files_match_the_table() {
    let tbl = ShCoeffs::read_tbl(&data_path("reference-degree10.tbl"), 10).unwrap();
    let gfc = ShCoeffs::read_gfc(&data_path("reference-degree10.gfc"), 10, None).unwrap();
    let dov = ShCoeffs::read_dov(&data_path("reference-degree10.dov"), 10).unwrap();
    assert_eq!(gfc, tbl);
    assert_eq!(dov, tbl);

    // a static model ignores the epoch
    let dated = ShCoeffs::read_gfc(&data_path("reference-degree10.gfc"), 6, Some("20240615.0930")).unwrap();
    assert_eq!(dated, ShCoeffs::read_tbl(&data_path("reference-degree10.tbl"), 6).unwrap());

    assert_eq!(
        ShCoeffs::read_gfc(&data_path("reference-degree10.gfc"), 12, None).unwrap_err(),
        ShError::DegreeTooHigh {
            requested: 12,
            available: 10
        }
    );
    assert!(matches!(
        ShCoeffs::read_gfc(&data_path("reference-degree10.gfc"), 10, Some("2024-06-15")),
        Err(ShError::InvalidArgument(_))
    ));
}

#[test]
fn files_round_trip_through_disk() {
    let dir = scratch_dir("io");
    let shcs = random_coeffs(30, 99);

    let mtx = dir.join("coeffs.mtx");
    shcs.write_mtx(&mtx, 30).unwrap();
    assert_eq!(ShCoeffs::read_mtx(&mtx, 30).unwrap(), shcs);

    for ordering in [TableOrdering::OrderMajor, TableOrdering::DegreeMajor] {
        let tbl = dir.join("coeffs.tbl");
        shcs.write_tbl(&tbl, 30, ordering).unwrap();
        assert_eq!(ShCoeffs::read_tbl(&tbl, 30).unwrap(), shcs);
    }

    let bin = dir.join("coeffs.bin");
    shcs.write_bin(&bin, 30).unwrap();
    assert_eq!(ShCoeffs::read_bin(&bin, 30).unwrap(), shcs);

    let truncated = ShCoeffs::read_bin(&bin, 12).unwrap();
    let expected = ShCoeffs::read_mtx(&mtx, 12).unwrap();
    assert_eq!(truncated, expected);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = scratch_dir("missing");
    let err = ShCoeffs::read_tbl(&dir.join("absent.tbl"), 2).unwrap_err();
    assert!(matches!(err, ShError::IoError(_)));
    std::fs::remove_dir_all(&dir).unwrap();
}
