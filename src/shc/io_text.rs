//! # Text coefficient formats
//!
//! Two whitespace-delimited formats share the same one-line header
//!
//! ```text
//! nmax mu r
//! ```
//!
//! * **mtx** – `nmax + 1` rows of `nmax + 1` values. Entry `(row, col)` is
//!   `C̄_{row,col}` when `row ≥ col` and `S̄_{col,row+1}` otherwise, so the lower
//!   triangle holds the cosine coefficients and the strict upper triangle the
//!   sine coefficients of orders `≥ 1`.
//! * **tbl** – one `n m C̄nm S̄nm` record per line, in any order.
//! * **dov** – one `n m value` record per line; a non-negative `m` stores
//!   `C̄nm`, a negative `m` stores `S̄n|m|`.
//!
//! Both readers accept files of a higher degree than requested: extra rows,
//! columns and records are skipped. Records are parsed with `nom`.
use std::fmt::Write as _;
use std::fs;

use camino::Utf8Path;
use itertools::Itertools;
use nom::{
    character::complete::{i64 as dec_i64, space0, space1, u64 as dec_u64},
    multi::many1,
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use tracing::debug;

use crate::sh_errors::ShError;

use super::ShCoeffs;

/// Record ordering used by [`ShCoeffs::write_tbl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableOrdering {
    /// `m` outer, `n` inner.
    #[default]
    OrderMajor,
    /// `n` outer, `m` inner.
    DegreeMajor,
}

fn parse_header(input: &str) -> IResult<&str, (u64, f64, f64)> {
    (
        preceded(space0, dec_u64),
        preceded(space1, double),
        preceded(space1, double),
    )
        .parse(input)
}

fn parse_row(input: &str) -> IResult<&str, Vec<f64>> {
    many1(preceded(space0, double)).parse(input)
}

fn parse_record(input: &str) -> IResult<&str, (u64, u64, f64, f64)> {
    (
        preceded(space0, dec_u64),
        preceded(space1, dec_u64),
        preceded(space1, double),
        preceded(space1, double),
    )
        .parse(input)
}

fn parse_dov_record(input: &str) -> IResult<&str, (u64, i64, f64)> {
    (
        preceded(space0, dec_u64),
        preceded(space1, dec_i64),
        preceded(space1, double),
    )
        .parse(input)
}

/// Run `parser` on a full line, rejecting anything but trailing whitespace.
fn parse_line<'a, T>(
    line: &'a str,
    parser: impl Fn(&'a str) -> IResult<&'a str, T>,
) -> Result<T, ShError> {
    match parser(line) {
        Ok((rest, value)) if rest.trim().is_empty() => Ok(value),
        _ => Err(ShError::NomParsingError(line.to_string())),
    }
}

/// Content lines, blank lines removed.
fn content_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().filter(|line| !line.trim().is_empty())
}

/// Parse the header and prepare an empty set of degree `nmax`.
fn header_to_shcs<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    nmax: usize,
) -> Result<(ShCoeffs, usize), ShError> {
    let header = lines
        .next()
        .ok_or_else(|| ShError::NomParsingError("missing header line".into()))?;
    let (nmax_file, mu, r) = parse_line(header, parse_header)?;
    let nmax_file = nmax_file as usize;
    if nmax > nmax_file {
        return Err(ShError::DegreeTooHigh {
            requested: nmax,
            available: nmax_file,
        });
    }
    Ok((ShCoeffs::new(nmax, mu, r)?, nmax_file))
}

impl ShCoeffs {
    /// Parse the `mtx` format up to degree `nmax`.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::DegreeTooHigh)` if the header degree is lower than `nmax`.
    /// * `Err(ShError::NomParsingError)` on a malformed line, a missing row or a
    ///   row with fewer than `nmax + 1` values.
    pub fn parse_mtx(content: &str, nmax: usize) -> Result<Self, ShError> {
        let mut lines = content_lines(content);
        let (mut shcs, _) = header_to_shcs(&mut lines, nmax)?;

        for row in 0..=nmax {
            let line = lines.next().ok_or_else(|| {
                ShError::NomParsingError(format!("missing matrix row {row}"))
            })?;
            let values = parse_line(line, parse_row)?;
            if values.len() < nmax + 1 {
                return Err(ShError::NomParsingError(format!(
                    "matrix row {row} holds {} values, at least {} are required",
                    values.len(),
                    nmax + 1
                )));
            }
            for (col, v) in values.into_iter().take(nmax + 1).enumerate() {
                if row >= col {
                    shcs.set_c(row, col, v);
                } else {
                    shcs.set_s(col, row + 1, v);
                }
            }
        }
        Ok(shcs)
    }

    /// Parse the `tbl` format up to degree `nmax`.
    ///
    /// Records with `n > nmax` are skipped, `S̄n0` values are ignored.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::DegreeTooHigh)` if the header degree is lower than `nmax`.
    /// * `Err(ShError::NomParsingError)` on a malformed record or `m > n`.
    pub fn parse_tbl(content: &str, nmax: usize) -> Result<Self, ShError> {
        let mut lines = content_lines(content);
        let (mut shcs, nmax_file) = header_to_shcs(&mut lines, nmax)?;

        for line in lines {
            let (n, m, c, s) = parse_line(line, parse_record)?;
            let (n, m) = (n as usize, m as usize);
            if m > n || n > nmax_file {
                return Err(ShError::NomParsingError(line.to_string()));
            }
            if n > nmax {
                continue;
            }
            shcs.set_c(n, m, c);
            if m > 0 {
                shcs.set_s(n, m, s);
            }
        }
        Ok(shcs)
    }

    /// Parse the `dov` format up to degree `nmax`.
    ///
    /// Records with `n > nmax` are skipped; `n -0 value` is ignored like `S̄n0`.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::DegreeTooHigh)` if the header degree is lower than `nmax`.
    /// * `Err(ShError::NomParsingError)` on a malformed record or `|m| > n`.
    pub fn parse_dov(content: &str, nmax: usize) -> Result<Self, ShError> {
        let mut lines = content_lines(content);
        let (mut shcs, nmax_file) = header_to_shcs(&mut lines, nmax)?;

        for line in lines {
            let (n, m, v) = parse_line(line, parse_dov_record)?;
            let n = n as usize;
            let order = m.unsigned_abs() as usize;
            if order > n || n > nmax_file {
                return Err(ShError::NomParsingError(line.to_string()));
            }
            if n > nmax {
                continue;
            }
            let sine = line.split_whitespace().nth(1).is_some_and(|t| t.starts_with('-'));
            match (sine, order) {
                (false, _) => shcs.set_c(n, order, v),
                (true, 0) => {}
                (true, _) => shcs.set_s(n, order, v),
            }
        }
        Ok(shcs)
    }

    /// Read an `mtx` file up to degree `nmax`.
    pub fn read_mtx(path: &Utf8Path, nmax: usize) -> Result<Self, ShError> {
        let content = fs::read_to_string(path)?;
        debug!(%path, nmax, "reading mtx coefficients");
        Self::parse_mtx(&content, nmax)
    }

    /// Read a `tbl` file up to degree `nmax`.
    pub fn read_tbl(path: &Utf8Path, nmax: usize) -> Result<Self, ShError> {
        let content = fs::read_to_string(path)?;
        debug!(%path, nmax, "reading tbl coefficients");
        Self::parse_tbl(&content, nmax)
    }

    /// Read a `dov` file up to degree `nmax`.
    pub fn read_dov(path: &Utf8Path, nmax: usize) -> Result<Self, ShError> {
        let content = fs::read_to_string(path)?;
        debug!(%path, nmax, "reading dov coefficients");
        Self::parse_dov(&content, nmax)
    }

    /// Render the coefficients up to degree `nmax` in the `mtx` format.
    pub fn to_mtx_string(&self, nmax: usize) -> Result<String, ShError> {
        self.check_write_degree(nmax)?;
        let mut out = format!("{} {:e} {:e}\n", nmax, self.mu, self.r);
        for row in 0..=nmax {
            let line = (0..=nmax)
                .map(|col| {
                    if row >= col {
                        self.c(row, col)
                    } else {
                        self.s(col, row + 1)
                    }
                })
                .map(|v| format!("{v:e}"))
                .join(" ");
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Render the coefficients up to degree `nmax` in the `tbl` format.
    pub fn to_tbl_string(&self, nmax: usize, ordering: TableOrdering) -> Result<String, ShError> {
        self.check_write_degree(nmax)?;
        let pairs: Vec<(usize, usize)> = match ordering {
            TableOrdering::OrderMajor => (0..=nmax)
                .flat_map(|m| (m..=nmax).map(move |n| (n, m)))
                .collect(),
            TableOrdering::DegreeMajor => (0..=nmax)
                .flat_map(|n| (0..=n).map(move |m| (n, m)))
                .collect(),
        };
        let mut out = format!("{} {:e} {:e}\n", nmax, self.mu, self.r);
        for (n, m) in pairs {
            // writing into a String cannot fail
            let _ = writeln!(out, "{n} {m} {:e} {:e}", self.c(n, m), self.s(n, m));
        }
        Ok(out)
    }

    /// Write an `mtx` file up to degree `nmax`.
    pub fn write_mtx(&self, path: &Utf8Path, nmax: usize) -> Result<(), ShError> {
        fs::write(path, self.to_mtx_string(nmax)?)?;
        Ok(())
    }

    /// Write a `tbl` file up to degree `nmax`.
    pub fn write_tbl(
        &self,
        path: &Utf8Path,
        nmax: usize,
        ordering: TableOrdering,
    ) -> Result<(), ShError> {
        fs::write(path, self.to_tbl_string(nmax, ordering)?)?;
        Ok(())
    }

    pub(crate) fn check_write_degree(&self, nmax: usize) -> Result<(), ShError> {
        if nmax > self.nmax() {
            return Err(ShError::DegreeTooHigh {
                requested: nmax,
                available: self.nmax(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod io_text_test {
    use super::*;

    const MTX: &str = "2 3.0e14 6.4e6
 1.0   0.1   0.2
 0.3   0.4   0.5
 0.6   0.7   0.8
";

    #[test]
    fn test_parse_mtx_layout() {
        let shcs = ShCoeffs::parse_mtx(MTX, 2).unwrap();
        assert_eq!(shcs.mu, 3.0e14);
        assert_eq!(shcs.r, 6.4e6);
        assert_eq!(shcs.c(0, 0), 1.0);
        assert_eq!(shcs.c(1, 0), 0.3);
        assert_eq!(shcs.c(1, 1), 0.4);
        assert_eq!(shcs.c(2, 2), 0.8);
        assert_eq!(shcs.s(1, 1), 0.1);
        assert_eq!(shcs.s(2, 1), 0.2);
        assert_eq!(shcs.s(2, 2), 0.5);
    }

    #[test]
    fn test_parse_mtx_lower_degree_skips_extra_columns() {
        let shcs = ShCoeffs::parse_mtx(MTX, 1).unwrap();
        assert_eq!(shcs.nmax(), 1);
        assert_eq!(shcs.c(1, 1), 0.4);
        assert_eq!(shcs.s(1, 1), 0.1);
    }

    #[test]
    fn test_parse_mtx_errors() {
        assert_eq!(
            ShCoeffs::parse_mtx(MTX, 3).unwrap_err(),
            ShError::DegreeTooHigh {
                requested: 3,
                available: 2
            }
        );
        let short = "2 1.0 1.0\n1 2 3\n4 5\n6 7 8\n";
        assert!(matches!(
            ShCoeffs::parse_mtx(short, 2),
            Err(ShError::NomParsingError(_))
        ));
        let garbage = "2 1.0 1.0\n1 2 x\n";
        assert!(ShCoeffs::parse_mtx(garbage, 2).is_err());
    }

    #[test]
    fn test_parse_tbl_skips_higher_degrees() {
        let tbl = "3 1.0 2.0\n0 0 1.0 0.0\n2 1 0.5 -0.5\n3 3 9.0 9.0\n1 0 0.25 7.0\n";
        let shcs = ShCoeffs::parse_tbl(tbl, 2).unwrap();
        assert_eq!(shcs.nmax(), 2);
        assert_eq!(shcs.c(2, 1), 0.5);
        assert_eq!(shcs.s(2, 1), -0.5);
        assert_eq!(shcs.c(1, 0), 0.25);
        assert_eq!(shcs.s(1, 0), 0.0);
        assert!(ShCoeffs::parse_tbl("2 1 1\n1 2 0.0 0.0\n", 2).is_err());
    }

    #[test]
    fn test_text_round_trip() {
        let shcs = ShCoeffs::from_fn(6, 3.986004415e14, 6378136.3, |n, m| {
            ((n as f64 + 0.1).sin() / (m + 1) as f64, (m as f64 * 0.3).cos() * 1e-7)
        })
        .unwrap();

        let mtx = shcs.to_mtx_string(6).unwrap();
        assert_eq!(ShCoeffs::parse_mtx(&mtx, 6).unwrap(), shcs);

        for ordering in [TableOrdering::OrderMajor, TableOrdering::DegreeMajor] {
            let tbl = shcs.to_tbl_string(6, ordering).unwrap();
            assert_eq!(ShCoeffs::parse_tbl(&tbl, 6).unwrap(), shcs);
        }
        assert!(shcs.to_mtx_string(7).is_err());
    }

    #[test]
    fn test_parse_dov_signs_select_sine() {
        let dov = "3 1.0 2.0\n0 0 1.0\n2 1 0.5\n2 -1 -0.25\n2 -0 9.0\n3 -3 7.0\n2 2 0.125\n";
        let shcs = ShCoeffs::parse_dov(dov, 2).unwrap();
        assert_eq!(shcs.nmax(), 2);
        assert_eq!(shcs.c(0, 0), 1.0);
        assert_eq!(shcs.c(2, 1), 0.5);
        assert_eq!(shcs.s(2, 1), -0.25);
        assert_eq!(shcs.c(2, 2), 0.125);
        assert_eq!(shcs.s(2, 0), 0.0);
        assert_eq!(shcs.c(2, 0), 0.0);

        let all = ShCoeffs::parse_dov(dov, 3).unwrap();
        assert_eq!(all.s(3, 3), 7.0);
        assert!(ShCoeffs::parse_dov("2 1 1\n1 -2 0.0\n", 2).is_err());
        assert!(ShCoeffs::parse_dov("2 1 1\n1 1\n", 2).is_err());
    }
}
