//! # Lane batches
//!
//! Latitudes are processed in fixed-width batches ("lanes") so that the inner
//! degree recurrences run the same arithmetic over several latitudes at once.
//!
//! * [`Simd4`] wraps `wide::f64x4`; it is the [`Batch`] of the default build.
//! * [`Lanes`] is a plain array of any width; `Lanes<1>` is the [`Batch`] of
//!   the `scalar` build and the reference the SIMD type is tested against.
//!
//! Every lane operation is an element-wise IEEE operation (no fused
//! multiply-add), and transcendental maps and horizontal sums run lane by lane
//! in lane order, so both widths produce bit-identical results for a given
//! latitude.
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub};

use wide::f64x4;

/// Number of latitudes processed together.
#[cfg(not(feature = "scalar"))]
pub const LANES: usize = 4;
/// Number of latitudes processed together.
#[cfg(feature = "scalar")]
pub const LANES: usize = 1;

/// A fixed-width group of `f64` values, one per latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lanes<const L: usize>(pub [f64; L]);

/// The lane group used by the transforms.
#[cfg(not(feature = "scalar"))]
pub type Batch = Simd4;
/// The lane group used by the transforms.
#[cfg(feature = "scalar")]
pub type Batch = Lanes<LANES>;

impl<const L: usize> Default for Lanes<L> {
    fn default() -> Self {
        Lanes([0.0; L])
    }
}

impl<const L: usize> Lanes<L> {
    pub const WIDTH: usize = L;

    #[inline]
    pub fn zero() -> Self {
        Lanes([0.0; L])
    }

    #[inline]
    pub fn splat(v: f64) -> Self {
        Lanes([v; L])
    }

    #[inline]
    pub fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        Lanes(std::array::from_fn(f))
    }

    #[inline]
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        Lanes(self.0.map(&mut f))
    }

    #[inline]
    pub fn zip_map(self, other: Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        Lanes(std::array::from_fn(|l| f(self.0[l], other.0[l])))
    }

    /// Fused pattern `self + a·b` evaluated as `self + (a * b)` per lane.
    #[inline]
    pub fn add_mul(self, a: Self, b: f64) -> Self {
        Lanes(std::array::from_fn(|l| self.0[l] + a.0[l] * b))
    }

    /// `true` if `pred` holds on every lane selected by `mask`.
    #[inline]
    pub fn all_masked(&self, mask: &[bool; L], mut pred: impl FnMut(f64) -> bool) -> bool {
        self.0
            .iter()
            .zip(mask.iter())
            .filter(|(_, &keep)| keep)
            .all(|(&v, _)| pred(v))
    }

    /// Sum of the lanes, accumulated in lane order.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.0.iter().fold(0.0, |acc, v| acc + v)
    }

    #[inline]
    pub fn as_array(&self) -> &[f64; L] {
        &self.0
    }
}

impl<const L: usize> Index<usize> for Lanes<L> {
    type Output = f64;
    #[inline]
    fn index(&self, l: usize) -> &f64 {
        &self.0[l]
    }
}

impl<const L: usize> IndexMut<usize> for Lanes<L> {
    #[inline]
    fn index_mut(&mut self, l: usize) -> &mut f64 {
        &mut self.0[l]
    }
}

impl<const L: usize> Add for Lanes<L> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl<const L: usize> AddAssign for Lanes<L> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for l in 0..L {
            self.0[l] += rhs.0[l];
        }
    }
}

impl<const L: usize> Sub for Lanes<L> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl<const L: usize> Mul for Lanes<L> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a * b)
    }
}

impl<const L: usize> Mul<f64> for Lanes<L> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.map(|a| a * rhs)
    }
}

impl<const L: usize> Neg for Lanes<L> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

/// Four latitudes in one `f64x4` register.
#[derive(Clone, Copy, Default)]
pub struct Simd4(f64x4);

impl Simd4 {
    pub const WIDTH: usize = 4;

    #[inline]
    pub fn zero() -> Self {
        Simd4(f64x4::default())
    }

    #[inline]
    pub fn splat(v: f64) -> Self {
        Simd4(f64x4::splat(v))
    }

    #[inline]
    pub fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        Simd4(f64x4::new(std::array::from_fn(f)))
    }

    /// Apply a scalar function lane by lane.
    #[inline]
    pub fn map(self, f: impl FnMut(f64) -> f64) -> Self {
        Simd4(f64x4::new(self.0.to_array().map(f)))
    }

    #[inline]
    pub fn zip_map(self, other: Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        let (a, b) = (self.0.to_array(), other.0.to_array());
        Simd4::from_fn(|l| f(a[l], b[l]))
    }

    /// `self + a·b` as a separate multiply and add.
    #[inline]
    pub fn add_mul(self, a: Self, b: f64) -> Self {
        Simd4(self.0 + a.0 * f64x4::splat(b))
    }

    #[inline]
    pub fn all_masked(&self, mask: &[bool; 4], mut pred: impl FnMut(f64) -> bool) -> bool {
        self.as_array()
            .iter()
            .zip(mask.iter())
            .filter(|(_, &keep)| keep)
            .all(|(&v, _)| pred(v))
    }

    /// Sum of the lanes, accumulated in lane order.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.as_array().iter().fold(0.0, |acc, v| acc + v)
    }

    #[inline]
    pub fn as_array(&self) -> &[f64; 4] {
        self.0.as_array_ref()
    }
}

impl fmt::Debug for Simd4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Simd4").field(self.as_array()).finish()
    }
}

impl PartialEq for Simd4 {
    fn eq(&self, other: &Self) -> bool {
        self.as_array() == other.as_array()
    }
}

impl From<Lanes<4>> for Simd4 {
    fn from(v: Lanes<4>) -> Self {
        Simd4(f64x4::new(v.0))
    }
}

impl Index<usize> for Simd4 {
    type Output = f64;
    #[inline]
    fn index(&self, l: usize) -> &f64 {
        &self.as_array()[l]
    }
}

impl IndexMut<usize> for Simd4 {
    #[inline]
    fn index_mut(&mut self, l: usize) -> &mut f64 {
        &mut self.0.as_array_mut()[l]
    }
}

impl Add for Simd4 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Simd4(self.0 + rhs.0)
    }
}

impl AddAssign for Simd4 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0 + rhs.0;
    }
}

impl Sub for Simd4 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Simd4(self.0 - rhs.0)
    }
}

impl Mul for Simd4 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Simd4(self.0 * rhs.0)
    }
}

impl Mul<f64> for Simd4 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Simd4(self.0 * f64x4::splat(rhs))
    }
}

impl Neg for Simd4 {
    type Output = Self;
    // Multiplying by -1 flips the sign of zeros too, like scalar negation.
    #[inline]
    fn neg(self) -> Self {
        Simd4(self.0 * f64x4::splat(-1.0))
    }
}
