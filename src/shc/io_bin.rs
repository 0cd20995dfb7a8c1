//! # Binary coefficient format
//!
//! Little-endian layout:
//!
//! ```text
//! u64 nmax | f64 mu | f64 r | C̄ columns m = 0..=nmax | S̄ columns m = 0..=nmax
//! ```
//!
//! Column `m` holds `nmax + 1 − m` values (`n = m..=nmax`). Reading a lower
//! degree than stored skips the surplus values of every column.
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use camino::Utf8Path;
use tracing::debug;

use crate::sh_errors::ShError;

use super::ShCoeffs;

fn read_u64(reader: &mut impl Read) -> Result<u64, ShError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64(reader: &mut impl Read) -> Result<f64, ShError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn skip_f64(reader: &mut impl Read, count: usize) -> Result<(), ShError> {
    let bytes = (count * 8) as u64;
    let skipped = std::io::copy(&mut reader.take(bytes), &mut std::io::sink())?;
    if skipped != bytes {
        return Err(ShError::IoError(std::io::Error::from(
            std::io::ErrorKind::UnexpectedEof,
        )));
    }
    Ok(())
}

impl ShCoeffs {
    /// Decode the binary format from any reader, up to degree `nmax`.
    ///
    /// Return
    /// ----------
    /// * `Err(ShError::DegreeTooHigh)` if the stored degree is lower than `nmax`.
    /// * `Err(ShError::IoError)` on a truncated stream.
    pub fn read_bin_from(reader: &mut impl Read, nmax: usize) -> Result<Self, ShError> {
        let nmax_file = read_u64(reader)? as usize;
        let mu = read_f64(reader)?;
        let r = read_f64(reader)?;
        if nmax > nmax_file {
            return Err(ShError::DegreeTooHigh {
                requested: nmax,
                available: nmax_file,
            });
        }
        let mut shcs = ShCoeffs::new(nmax, mu, r)?;

        for sine in [false, true] {
            for m in 0..=nmax_file {
                if m > nmax {
                    skip_f64(reader, nmax_file + 1 - m)?;
                    continue;
                }
                for n in m..=nmax {
                    let v = read_f64(reader)?;
                    match (sine, m) {
                        (false, _) => shcs.set_c(n, m, v),
                        (true, 0) => {}
                        (true, _) => shcs.set_s(n, m, v),
                    }
                }
                skip_f64(reader, nmax_file - nmax)?;
            }
        }
        Ok(shcs)
    }

    /// Encode the coefficients up to degree `nmax` into any writer.
    pub fn write_bin_to(&self, writer: &mut impl Write, nmax: usize) -> Result<(), ShError> {
        self.check_write_degree(nmax)?;
        writer.write_all(&(nmax as u64).to_le_bytes())?;
        writer.write_all(&self.mu.to_le_bytes())?;
        writer.write_all(&self.r.to_le_bytes())?;
        for m in 0..=nmax {
            for n in m..=nmax {
                writer.write_all(&self.c(n, m).to_le_bytes())?;
            }
        }
        for m in 0..=nmax {
            for n in m..=nmax {
                writer.write_all(&self.s(n, m).to_le_bytes())?;
            }
        }
        Ok(())
    }

    /// Read a binary coefficient file up to degree `nmax`.
    pub fn read_bin(path: &Utf8Path, nmax: usize) -> Result<Self, ShError> {
        debug!(%path, nmax, "reading binary coefficients");
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_bin_from(&mut reader, nmax)
    }

    /// Write a binary coefficient file up to degree `nmax`.
    pub fn write_bin(&self, path: &Utf8Path, nmax: usize) -> Result<(), ShError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_bin_to(&mut writer, nmax)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod io_bin_test {
    use super::*;

    fn sample() -> ShCoeffs {
        ShCoeffs::from_fn(5, 1.5, 2.5, |n, m| {
            ((10 * n + m) as f64, -((10 * n + m) as f64))
        })
        .unwrap()
    }

    #[test]
    fn test_layout() {
        let shcs = sample();
        let mut buf = Vec::new();
        shcs.write_bin_to(&mut buf, 5).unwrap();
        // header + 2 * 21 values
        assert_eq!(buf.len(), 24 + 2 * 21 * 8);
        assert_eq!(u64::from_le_bytes(buf[0..8].try_into().unwrap()), 5);
        // second value of the first C column is C10
        let c10 = f64::from_le_bytes(buf[32..40].try_into().unwrap());
        assert_eq!(c10, 10.0);
    }

    #[test]
    fn test_round_trip_and_truncation() {
        let shcs = sample();
        let mut buf = Vec::new();
        shcs.write_bin_to(&mut buf, 5).unwrap();

        let full = ShCoeffs::read_bin_from(&mut buf.as_slice(), 5).unwrap();
        assert_eq!(full, shcs);

        let low = ShCoeffs::read_bin_from(&mut buf.as_slice(), 3).unwrap();
        for m in 0..=3 {
            for n in m..=3 {
                assert_eq!(low.c(n, m), shcs.c(n, m));
                assert_eq!(low.s(n, m), shcs.s(n, m));
            }
        }

        assert!(matches!(
            ShCoeffs::read_bin_from(&mut buf.as_slice(), 6),
            Err(ShError::DegreeTooHigh { .. })
        ));
        assert!(matches!(
            ShCoeffs::read_bin_from(&mut &buf[..100], 5),
            Err(ShError::IoError(_))
        ));
    }
}
