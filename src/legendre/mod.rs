//! # Fully-normalized associated Legendre functions
//!
//! Two layers:
//!
//! * [`coefficients`] – recursion-coefficient generator: tables depending on
//!   `nmax` only ([`RecursionTables`]) and the per-order three-term coefficients
//!   ([`OrderCoefficients`]).
//! * [`xnum`] – extended-range evaluator producing whole degree columns
//!   `P̄_{m..=nmax, m}` for a batch of latitudes.
//!
//! The normalization is the geodetic one: `∫ P̄nm² cos(mλ)² dΩ = 4π`.
pub mod coefficients;
pub mod xnum;

pub use coefficients::{OrderCoefficients, RecursionTables};
pub use xnum::{fill_column, plain_column, Sectorials, XNum};
