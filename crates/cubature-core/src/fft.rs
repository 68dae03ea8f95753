//! Radix-2 FFT and the butterfly merge used for incremental transforms.
//!
//! When a lattice doubles from `n/2` to `n` points, the old points occupy the
//! even indices of the new natural ordering and the new points the odd ones.
//! The transform of the doubled set therefore follows from one radix-2
//! butterfly over the two half transforms:
//!
//! ```text
//! F[k]       = E[k] + ω^k O[k]
//! F[k + n/2] = E[k] − ω^k O[k],    ω = exp(−2πi/n)
//! ```
//!
//! All routines take their buffers by value and return fresh ones, so a
//! transform retained by a caller is never mutated behind its back.
//! Transforms are unnormalised, matching the usual `fft` convention.

use alloc::vec::Vec;

use crate::constants::TWO_PI;
use crate::math::{cos, sin};

/// Complex number type used for transforms.
pub type Complex64 = num_complex::Complex<f64>;

/// Exact base-2 logarithm of `n`, or `None` if `n` is not a power of two.
pub fn log2_exact(n: usize) -> Option<u32> {
    if n.is_power_of_two() {
        Some(n.trailing_zeros())
    } else {
        None
    }
}

/// Reverse the lowest `bits` bits of `i`.
#[inline]
pub fn bit_reverse_index(i: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    i.reverse_bits() >> (usize::BITS - bits)
}

/// Twiddle factor `exp(−2πi k / n)`.
#[inline]
fn twiddle(k: usize, n: usize) -> Complex64 {
    let angle = -TWO_PI * k as f64 / n as f64;
    Complex64::new(cos(angle), sin(angle))
}

/// Decimation-in-time FFT for input already in bit-reversed order.
///
/// Returns the transform in natural frequency order. This is the routine
/// for values sampled on a van-der-Corput ordered lattice, whose index order
/// is the bit reversal of the natural one.
///
/// # Panics
///
/// Panics if the length is not a power of two.
pub fn fft_dit(mut values: Vec<Complex64>) -> Vec<Complex64> {
    let n = values.len();
    assert!(
        n == 0 || n.is_power_of_two(),
        "FFT length must be a power of two"
    );
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let w = twiddle(k, len);
                let u = values[start + k];
                let t = w * values[start + k + half];
                values[start + k] = u + t;
                values[start + k + half] = u - t;
            }
        }
        len *= 2;
    }
    values
}

/// Permute a buffer into bit-reversed order.
pub fn bit_reverse_permute(mut values: Vec<Complex64>) -> Vec<Complex64> {
    let n = values.len();
    if n <= 2 {
        return values;
    }
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = bit_reverse_index(i, bits);
        if j > i {
            values.swap(i, j);
        }
    }
    values
}

/// FFT of values in natural order.
pub fn fft(values: Vec<Complex64>) -> Vec<Complex64> {
    fft_dit(bit_reverse_permute(values))
}

/// FFT of real values in natural order.
pub fn fft_real(values: &[f64]) -> Vec<Complex64> {
    fft(values.iter().map(|&v| Complex64::new(v, 0.0)).collect())
}

/// FFT of real values given in bit-reversed (van-der-Corput) order.
pub fn fft_real_bit_reversed(values: &[f64]) -> Vec<Complex64> {
    fft_dit(values.iter().map(|&v| Complex64::new(v, 0.0)).collect())
}

/// Merge two half transforms into the transform of the interleaved sequence.
///
/// `even` is the transform of the samples at even indices of the doubled
/// sequence and `odd` the transform at odd indices.
///
/// # Panics
///
/// Panics if the halves differ in length.
pub fn merge_fft(even: Vec<Complex64>, odd: Vec<Complex64>) -> Vec<Complex64> {
    assert_eq!(
        even.len(),
        odd.len(),
        "merged transforms must have equal length"
    );
    let half = even.len();
    let n = 2 * half;
    let mut merged = Vec::with_capacity(n);
    merged.resize(n, Complex64::new(0.0, 0.0));
    for k in 0..half {
        let t = twiddle(k, n) * odd[k];
        merged[k] = even[k] + t;
        merged[k + half] = even[k] - t;
    }
    merged
}
