//! # ICGEM `gfc` coefficient files
//!
//! Layout of a `gfc` file:
//!
//! ```text
//! free comments ...
//! begin_of_head
//! modelname              EXAMPLE
//! earth_gravity_constant 3.986004415E+14
//! radius                 6.3781363E+06
//! max_degree             2
//! errors                 formal
//! norm                   fully_normalized
//! format                 icgem2.0
//! end_of_head
//! key    L    M         C                  S            [sigmas] [t0 t1] [period]
//! gfc    0    0    1.0                0.0                0.0  0.0
//! gfct   2    0   -4.84e-04           0.0                0.0  0.0  20000101.0000 20100101.0000
//! trnd   2    0    1.1e-11            0.0                0.0  0.0  20000101.0000 20100101.0000
//! acos   2    0    1.2e-11            0.0                0.0  0.0  20000101.0000 20100101.0000  1.0
//! ```
//!
//! The header keywords may appear in the comments before `begin_of_head`
//! (older files have no `begin_of_head` at all); the last occurrence of each
//! keyword before `end_of_head` is the one used.
//!
//! Time-variable coefficients
//! -----------------
//! At the epoch `t` (decimal year) a coefficient of degree `n`, order `m`
//! is
//!
//! ```text
//! gfct + trnd·(t − t0) + Σ acos·cos(2π(t − t0)/p) + Σ asin·sin(2π(t − t0)/p)
//! ```
//!
//! where `dot` is accepted as a synonym of `trnd`. The `trnd`, `dot`, `asin`
//! and `acos` records refer to the `gfct` record that precedes them.
//!
//! * `icgem1.0`: `t0` comes from the `gfct` record. Without an epoch, every
//!   record is evaluated at its own `t0`.
//! * `icgem2.0`: every time-variable record carries its validity interval
//!   `[t0, t1)` and is used only if the epoch falls inside. An epoch is
//!   mandatory.
//!
//! Epochs are `yyyyMMdd` or `yyyyMMdd.hhmm` strings.
use std::f64::consts::TAU;
use std::fs;

use camino::Utf8Path;
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{char, u64 as dec_u64},
    combinator::{all_consuming, map_res, opt},
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::sh_errors::ShError;

use super::ShCoeffs;

const BEGIN_OF_HEAD: &str = "begin_of_head";
const END_OF_HEAD: &str = "end_of_head";

/// Version of the `gfc` data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfcFormat {
    #[default]
    Icgem1,
    Icgem2,
}

/// Error columns stored after the `C`, `S` values of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfcErrors {
    No,
    Calibrated,
    Formal,
    CalibratedAndFormal,
}

impl GfcErrors {
    fn ncols(self) -> usize {
        match self {
            GfcErrors::No => 0,
            GfcErrors::Calibrated | GfcErrors::Formal => 2,
            GfcErrors::CalibratedAndFormal => 4,
        }
    }
}

/// Header of a `gfc` file.
#[derive(Debug, Clone, PartialEq)]
pub struct GfcHeader {
    pub nmax: usize,
    pub mu: f64,
    pub r: f64,
    pub errors: GfcErrors,
    pub format: GfcFormat,
}

fn digits<'a>(n: usize) -> impl Parser<&'a str, Output = u32, Error = nom::error::Error<&'a str>> {
    map_res(take_while_m_n(n, n, |c: char| c.is_ascii_digit()), str::parse::<u32>)
}

#[allow(clippy::type_complexity)]
fn parse_epoch(input: &str) -> IResult<&str, (u32, u32, u32, Option<(u32, u32)>)> {
    all_consuming((
        digits(4),
        digits(2),
        digits(2),
        opt(preceded(char('.'), (digits(2), digits(2)))),
    ))
    .parse(input)
}

fn is_leap(year: u32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Decimal year of a `yyyyMMdd` or `yyyyMMdd.hhmm` epoch.
///
/// `hh = 24` and `mm = 60` are accepted separately (the following day or
/// hour) but not together.
///
/// # Example
///
/// ```rust
/// use sphharm::shc::io_gfc::epoch_fraction;
///
/// assert_eq!(epoch_fraction("20000101").unwrap(), 2000.0);
/// assert_eq!(epoch_fraction("20010702.1200").unwrap(), 2001.5);
/// ```
///
/// Return
/// ----------
/// * `Err(ShError::InvalidArgument)` for a malformed string or an impossible date.
pub fn epoch_fraction(date: &str) -> Result<f64, ShError> {
    let date = date.trim();
    let invalid = |why: &str| {
        ShError::InvalidArgument(format!(
            "epoch \"{date}\": {why}, expected yyyyMMdd or yyyyMMdd.hhmm"
        ))
    };
    let (_, (year, month, day, time)) = parse_epoch(date).map_err(|_| invalid("wrong format"))?;
    let (hour, min) = time.unwrap_or((0, 0));

    const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let leap = is_leap(year);
    if !(1..=12).contains(&month) {
        return Err(invalid("month out of range"));
    }
    let month_days = MONTH_DAYS[month as usize - 1] + u32::from(leap && month == 2);
    if day < 1 || day > month_days {
        return Err(invalid("day out of range"));
    }
    if hour > 24 || min > 60 || (hour == 24 && min == 60) {
        return Err(invalid("time out of range"));
    }

    let days_before: u32 = MONTH_DAYS[..month as usize - 1].iter().sum::<u32>() + u32::from(leap && month > 2);
    let doy = (days_before + day - 1) as f64;
    let ndays = if leap { 366.0 } else { 365.0 };
    Ok(year as f64 + (doy + (hour as f64 + min as f64 / 60.0) / 24.0) / ndays)
}

fn parse_number(input: &str) -> IResult<&str, f64> {
    all_consuming(double).parse(input)
}

fn parse_degree(input: &str) -> IResult<&str, u64> {
    all_consuming(dec_u64).parse(input)
}

fn number(token: &str) -> Result<f64, ShError> {
    parse_number(token)
        .map(|(_, v)| v)
        .map_err(|_| ShError::NomParsingError(format!("\"{token}\" is not a number")))
}

fn degree(token: &str) -> Result<usize, ShError> {
    parse_degree(token)
        .map(|(_, v)| v as usize)
        .map_err(|_| ShError::NomParsingError(format!("\"{token}\" is not a degree or order")))
}

/// Parse the header and return it with the index of the first data line.
fn parse_header(lines: &[&str]) -> Result<(GfcHeader, usize), ShError> {
    let mut nmax = None;
    let mut mu = None;
    let mut r = None;
    let mut errors = None;
    let mut norm = None;
    let mut format = None;

    let mut end = None;
    for (i, line) in lines.iter().enumerate() {
        let mut tokens = line.split_whitespace();
        let (Some(key), value) = (tokens.next(), tokens.next()) else {
            continue;
        };
        match (key, value) {
            (END_OF_HEAD, _) => {
                end = Some(i + 1);
                break;
            }
            (BEGIN_OF_HEAD, _) => trace!(line = i, "begin_of_head"),
            ("max_degree", Some(v)) => nmax = Some(v),
            ("earth_gravity_constant", Some(v)) => mu = Some(v),
            ("radius", Some(v)) => r = Some(v),
            ("errors", Some(v)) => errors = Some(v),
            ("norm", Some(v)) => norm = Some(v),
            ("format", Some(v)) => format = Some(v),
            _ => {}
        }
    }
    let end = end.ok_or_else(|| ShError::NomParsingError(format!("missing \"{END_OF_HEAD}\"")))?;
    let missing = |key: &str| ShError::NomParsingError(format!("missing \"{key}\" before \"{END_OF_HEAD}\""));

    let errors = match errors.ok_or_else(|| missing("errors"))? {
        "no" => GfcErrors::No,
        "calibrated" => GfcErrors::Calibrated,
        "formal" => GfcErrors::Formal,
        "calibrated_and_formal" => GfcErrors::CalibratedAndFormal,
        other => {
            return Err(ShError::NomParsingError(format!("unsupported errors \"{other}\"")));
        }
    };
    let format = match format {
        None | Some("icgem1.0") => GfcFormat::Icgem1,
        Some("icgem2.0") => GfcFormat::Icgem2,
        Some(other) => {
            return Err(ShError::NomParsingError(format!("unsupported format \"{other}\"")));
        }
    };
    if let Some(other) = norm.filter(|n| *n != "fully_normalized") {
        return Err(ShError::NomParsingError(format!("unsupported norm \"{other}\"")));
    }

    let header = GfcHeader {
        nmax: degree(nmax.ok_or_else(|| missing("max_degree"))?)?,
        mu: number(mu.ok_or_else(|| missing("earth_gravity_constant"))?)?,
        r: number(r.ok_or_else(|| missing("radius"))?)?,
        errors,
        format,
    };
    Ok((header, end))
}

/// Record kinds of the data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Record {
    Gfc,
    Gfct,
    Trend,
    Acos,
    Asin,
}

impl Record {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "gfc" => Some(Record::Gfc),
            "gfct" => Some(Record::Gfct),
            "trnd" | "dot" => Some(Record::Trend),
            "acos" => Some(Record::Acos),
            "asin" => Some(Record::Asin),
            _ => None,
        }
    }

    /// Number of tokens, key included, of a complete record.
    fn ntokens(self, header: &GfcHeader) -> usize {
        let base = 5 + header.errors.ncols();
        let icgem2 = header.format == GfcFormat::Icgem2;
        match self {
            Record::Gfc => base,
            Record::Gfct => base + if icgem2 { 2 } else { 1 },
            Record::Trend => base + if icgem2 { 2 } else { 0 },
            Record::Acos | Record::Asin => base + if icgem2 { 3 } else { 1 },
        }
    }
}

/// The `gfct` record the following time-variable records refer to.
#[derive(Debug, Clone, Copy)]
struct Reference {
    n: usize,
    m: usize,
    t0: f64,
    trend_used: bool,
}

impl ShCoeffs {
    /// Parse the header of a `gfc` file.
    pub fn parse_gfc_header(content: &str) -> Result<GfcHeader, ShError> {
        let lines: Vec<&str> = content.lines().collect();
        parse_header(&lines).map(|(header, _)| header)
    }

    /// Parse a `gfc` file up to degree `nmax`, evaluating time-variable
    /// coefficients at `epoch`.
    ///
    /// Arguments
    /// -----------------
    /// * `epoch` – `yyyyMMdd` or `yyyyMMdd.hhmm`; required for `icgem2.0`
    ///   files, optional for static and `icgem1.0` files.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::DegreeTooHigh)` if `max_degree` is lower than `nmax`.
    /// * `Err(ShError::InvalidArgument)` for a malformed epoch or a missing
    ///   epoch with an `icgem2.0` file.
    /// * `Err(ShError::NomParsingError)` for a malformed header or record, or a
    ///   time-variable record not matching its `gfct` record.
    pub fn parse_gfc(content: &str, nmax: usize, epoch: Option<&str>) -> Result<Self, ShError> {
        let lines: Vec<&str> = content.lines().collect();
        let (header, first) = parse_header(&lines)?;
        if nmax > header.nmax {
            return Err(ShError::DegreeTooHigh {
                requested: nmax,
                available: header.nmax,
            });
        }
        let epoch = epoch.map(epoch_fraction).transpose()?;
        if header.format == GfcFormat::Icgem2 && epoch.is_none() {
            return Err(ShError::InvalidArgument(
                "an epoch is required for icgem2.0 files".into(),
            ));
        }
        debug!(?header, nmax, ?epoch, "parsing gfc data section");

        let mut shcs = ShCoeffs::new(nmax, header.mu, header.r)?;
        let e = header.errors.ncols();
        let mut reference: Option<Reference> = None;

        for line in &lines[first..] {
            let tokens: SmallVec<[&str; 12]> = line.split_whitespace().collect();
            let Some(record) = tokens.first().copied().and_then(Record::from_key) else {
                continue;
            };
            let bad = || ShError::NomParsingError(format!("malformed {record:?} record \"{}\"", line.trim()));

            // static models with no errors may omit S̄n0
            let short_zonal = record == Record::Gfc && e == 0 && tokens.len() == 4;
            if tokens.len() < record.ntokens(&header) && !short_zonal {
                return Err(bad());
            }
            let n = degree(tokens[1])?;
            let m = degree(tokens[2])?;
            if m > n || n > header.nmax || (short_zonal && m > 0) {
                return Err(bad());
            }
            if record == Record::Gfct {
                reference = Some(Reference {
                    n,
                    m,
                    t0: epoch_fraction(tokens[5 + e]).map_err(|_| bad())?,
                    trend_used: false,
                });
            }
            if n > nmax {
                continue;
            }

            let c = number(tokens[3])?;
            let s = match tokens.get(4) {
                Some(t) if m > 0 => number(t)?,
                _ => 0.0,
            };

            let factor = match record {
                Record::Gfc => 1.0,
                Record::Gfct | Record::Trend | Record::Acos | Record::Asin => {
                    let mut base = match reference {
                        Some(rf) if rf.n == n && rf.m == m => rf,
                        _ => return Err(bad()),
                    };
                    if header.format == GfcFormat::Icgem2 {
                        let t0 = epoch_fraction(tokens[5 + e]).map_err(|_| bad())?;
                        let t1 = epoch_fraction(tokens[6 + e]).map_err(|_| bad())?;
                        let t = epoch.unwrap_or(t0);
                        if !(t0..t1).contains(&t) {
                            continue;
                        }
                        base.t0 = t0;
                    }
                    let dt = epoch.unwrap_or(base.t0) - base.t0;
                    match record {
                        Record::Gfct => 1.0,
                        Record::Trend => {
                            if base.trend_used {
                                return Err(bad());
                            }
                            if let Some(rf) = reference.as_mut() {
                                rf.trend_used = true;
                            }
                            dt
                        }
                        Record::Acos | Record::Asin => {
                            let period_at = if header.format == GfcFormat::Icgem2 { 7 + e } else { 5 + e };
                            let period = number(tokens[period_at])?;
                            let phase = TAU / period * dt;
                            if record == Record::Acos {
                                phase.cos()
                            } else {
                                phase.sin()
                            }
                        }
                        Record::Gfc => 1.0,
                    }
                }
            };

            shcs.set_c(n, m, shcs.c(n, m) + factor * c);
            if m > 0 {
                shcs.set_s(n, m, shcs.s(n, m) + factor * s);
            }
        }
        Ok(shcs)
    }

    /// Read a `gfc` file up to degree `nmax`, see [`ShCoeffs::parse_gfc`].
    pub fn read_gfc(path: &Utf8Path, nmax: usize, epoch: Option<&str>) -> Result<Self, ShError> {
        let content = fs::read_to_string(path)?;
        debug!(%path, nmax, ?epoch, "reading gfc coefficients");
        Self::parse_gfc(&content, nmax, epoch)
    }
}
