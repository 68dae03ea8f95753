//! Rank-1 lattice point generation with incremental doubling.
//!
//! A rank-1 lattice with `n = 2^m` points is `x_i = frac(i/n · z)` for a
//! generator vector `z`. Two orderings are supported:
//!
//! - **Natural**: index `i` maps to `i/n`. Doubling to `2n` points adds the
//!   odd indices `(2k+1)/(2n)`, so old points land on even slots.
//! - **Van der Corput**: index `i` maps to the base-2 radical inverse of `i`.
//!   The first `n` points of the infinite sequence form the `n`-point lattice
//!   in bit-reversed natural order, and the next `n` points are exactly the
//!   new half of the `2n`-point lattice.
//!
//! [`LatticePointStream`] keeps the natural-order unshifted and shifted sets
//! between doublings so that only the new half is ever generated.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::constants::{GAIL_GENERATOR, KOROBOV_MODULUS, KOROBOV_MULTIPLIER, MAX_LOG2_POINTS};
use crate::fft::bit_reverse_index;
use crate::math::frac;
use crate::types::Points;

/// Integer generator weights, one per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorVector(Vec<u64>);

impl GeneratorVector {
    /// Wrap explicit weights.
    pub fn new(weights: Vec<u64>) -> Self {
        Self(weights)
    }

    /// Tabulated GAIL generator truncated to `dimension`, if available.
    pub fn gail(dimension: usize) -> Option<Self> {
        if dimension == 0 || dimension > GAIL_GENERATOR.len() {
            return None;
        }
        Some(Self(GAIL_GENERATOR[..dimension].to_vec()))
    }

    /// Korobov generator `(1, a, a², …) mod modulus`.
    pub fn korobov(dimension: usize, multiplier: u64, modulus: u64) -> Self {
        let mut weights = Vec::with_capacity(dimension);
        let mut w: u64 = 1;
        for _ in 0..dimension {
            weights.push(w);
            w = ((w as u128 * multiplier as u128) % modulus as u128) as u64;
        }
        Self(weights)
    }

    /// GAIL generator when tabulated, Korobov generator otherwise.
    pub fn for_dimension(dimension: usize) -> Self {
        Self::gail(dimension)
            .unwrap_or_else(|| Self::korobov(dimension, KOROBOV_MULTIPLIER, KOROBOV_MODULUS))
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Raw weights.
    pub fn weights(&self) -> &[u64] {
        &self.0
    }

    /// Write `frac(t · z + shift)` into `out`.
    ///
    /// `t` is the scalar lattice coordinate (`i/n` or a radical inverse).
    #[inline]
    pub fn point_into(&self, t: f64, shift: Option<&[f64]>, out: &mut [f64]) {
        for (j, (&z, o)) in self.0.iter().zip(out.iter_mut()).enumerate() {
            let base = frac(t * z as f64);
            *o = match shift {
                Some(s) => frac(base + s[j]),
                None => base,
            };
        }
    }
}

/// Ordering of lattice points within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LatticeOrder {
    /// `i/n` ordering.
    #[default]
    Natural,
    /// Base-2 radical-inverse ordering (extensible).
    VanDerCorput,
}

/// Base-2 radical inverse of `i`.
#[inline]
pub fn van_der_corput(i: u64) -> f64 {
    // exact: at most 53 significant bits survive for i < 2^53
    (i.reverse_bits() >> 11) as f64 / (1u64 << 53) as f64
}

/// The full `n`-point lattice in natural order.
pub fn natural_points(generator: &GeneratorVector, n: usize, shift: Option<&[f64]>) -> Points {
    let mut points = Points::zeros(n, generator.dimension());
    for (i, row) in points.rows_mut().enumerate() {
        generator.point_into(i as f64 / n as f64, shift, row);
    }
    points
}

/// The new half of the `n`-point lattice, `(2k+1)/n` for `k < n/2`, in
/// natural order.
pub fn natural_new_half(generator: &GeneratorVector, n: usize, shift: Option<&[f64]>) -> Points {
    let half = n / 2;
    let mut points = Points::zeros(half, generator.dimension());
    for (k, row) in points.rows_mut().enumerate() {
        generator.point_into((2 * k + 1) as f64 / n as f64, shift, row);
    }
    points
}

/// Points with sequence indices `start..end` in van-der-Corput order.
pub fn van_der_corput_points(
    generator: &GeneratorVector,
    start: u64,
    end: u64,
    shift: Option<&[f64]>,
) -> Points {
    let count = end.saturating_sub(start) as usize;
    let mut points = Points::zeros(count, generator.dimension());
    for (k, row) in points.rows_mut().enumerate() {
        generator.point_into(van_der_corput(start + k as u64), shift, row);
    }
    points
}

/// Interleave retained points (even slots) with new points (odd slots).
///
/// Both sets are consumed; the result is a fresh buffer.
pub fn merge_points(previous: Points, new: Points) -> Points {
    Points::interleave(previous, new)
}

/// Incremental generator of doubling lattice point sets.
///
/// Owns the generator vector, the random shift fixed for the run, the current
/// exponent `m` and the natural-order unshifted and shifted point sets.
#[derive(Debug, Clone)]
pub struct LatticePointStream {
    generator: GeneratorVector,
    order: LatticeOrder,
    shift: Vec<f64>,
    next_m: u32,
    m: Option<u32>,
    unshifted: Points,
    shifted: Points,
}

/// Points produced by one [`LatticePointStream::advance`] call.
#[derive(Debug, Clone)]
pub struct LatticeBatch {
    /// Resolution exponent after this batch (`n = 2^m` points in total).
    pub m: u32,
    /// True for the first, full batch.
    pub is_first: bool,
    /// Newly generated shifted points in evaluation order (natural order or
    /// van-der-Corput order depending on the stream).
    pub points: Points,
}

impl LatticePointStream {
    /// Create a stream that starts at `2^m_min` points.
    ///
    /// # Panics
    ///
    /// Panics if the shift length differs from the generator dimension or
    /// `m_min` exceeds the supported resolution.
    pub fn new(generator: GeneratorVector, shift: Vec<f64>, order: LatticeOrder, m_min: u32) -> Self {
        assert_eq!(
            shift.len(),
            generator.dimension(),
            "shift must have one entry per dimension"
        );
        assert!(m_min <= MAX_LOG2_POINTS, "m_min exceeds supported resolution");
        let d = generator.dimension();
        Self {
            generator,
            order,
            shift,
            next_m: m_min,
            m: None,
            unshifted: Points::empty(d),
            shifted: Points::empty(d),
        }
    }

    /// Generate the next batch and fold it into the retained sets.
    ///
    /// The first call produces all `2^m_min` points; every later call doubles
    /// the set and produces only the `2^(m-1)` new points.
    pub fn advance(&mut self) -> LatticeBatch {
        let m = self.next_m;
        let n = 1usize << m;
        let is_first = self.m.is_none();
        let d = self.generator.dimension();

        let (new_unshifted, new_shifted) = if is_first {
            (
                natural_points(&self.generator, n, None),
                natural_points(&self.generator, n, Some(&self.shift)),
            )
        } else {
            (
                natural_new_half(&self.generator, n, None),
                natural_new_half(&self.generator, n, Some(&self.shift)),
            )
        };

        // Evaluation order: van-der-Corput batches are the bit reversal of the
        // natural-order batch of the same size.
        let eval_points = match self.order {
            LatticeOrder::Natural => new_shifted.clone(),
            LatticeOrder::VanDerCorput => {
                let bits = new_shifted.n().trailing_zeros();
                new_shifted.permuted(|i| bit_reverse_index(i, bits))
            }
        };

        if is_first {
            self.unshifted = new_unshifted;
            self.shifted = new_shifted;
        } else {
            let prev_unshifted = core::mem::replace(&mut self.unshifted, Points::empty(d));
            let prev_shifted = core::mem::replace(&mut self.shifted, Points::empty(d));
            self.unshifted = merge_points(prev_unshifted, new_unshifted);
            self.shifted = merge_points(prev_shifted, new_shifted);
        }

        self.m = Some(m);
        self.next_m = m + 1;
        LatticeBatch {
            m,
            is_first,
            points: eval_points,
        }
    }

    /// Current resolution exponent, if any batch has been produced.
    pub fn m(&self) -> Option<u32> {
        self.m
    }

    /// Current number of points.
    pub fn n(&self) -> usize {
        self.unshifted.n()
    }

    /// Unshifted points in natural order (kernel input).
    pub fn unshifted(&self) -> &Points {
        &self.unshifted
    }

    /// Shifted points in natural order.
    pub fn shifted(&self) -> &Points {
        &self.shifted
    }

    /// The run's random shift.
    pub fn shift(&self) -> &[f64] {
        &self.shift
    }

    /// The generator vector.
    pub fn generator(&self) -> &GeneratorVector {
        &self.generator
    }

    /// Point ordering of produced batches.
    pub fn order(&self) -> LatticeOrder {
        self.order
    }
}
