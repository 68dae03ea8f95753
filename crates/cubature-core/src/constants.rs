//! Numerical constants used throughout the crate.

/// Default deterministic seed for random shifts.
///
/// The value `0x6375626174` is "cubat" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x6375626174;

/// Rank-1 lattice generator vector (GAIL ordering), one weight per dimension.
pub const GAIL_GENERATOR: [u64; 22] = [
    1, 433461, 315689, 441789, 501101, 146355, 88411, 215837, 273599, 151719, 258185, 357967,
    96407, 203741, 211709, 135719, 100779, 85729, 14597, 94813, 422013, 484367,
];

/// Korobov multiplier used for dimensions beyond the tabulated generator.
pub const KOROBOV_MULTIPLIER: u64 = 17_797;

/// Modulus for Korobov generator powers (extensible up to 2^32 points).
pub const KOROBOV_MODULUS: u64 = 1 << 32;

/// Largest resolution exponent supported by the lattice and FFT routines.
pub const MAX_LOG2_POINTS: u32 = 32;

/// Relative tolerance for imaginary residue in a kernel spectrum.
///
/// The first row of a shift-invariant kernel Gram matrix over a lattice is
/// symmetric, so its DFT is real up to rounding.
pub const SPECTRUM_IMAG_TOL: f64 = 1e-8;

/// Relative tolerance for negative eigenvalues of a positive definite kernel.
pub const SPECTRUM_NEG_TOL: f64 = 1e-8;

/// Absolute discrepancy between direct and cancellation-safe spectra that
/// indicates a broken `Λ − 1` computation.
pub const RING_DISCREPANCY_TOL: f64 = 1.0;

/// Search tolerance on `ln(shape)` for the MLE line search.
pub const SHAPE_SEARCH_XTOL: f64 = 1e-2;

/// Maximum solver iterations in one bounded search.
pub const SHAPE_SEARCH_MAX_ITERS: u64 = 500;

/// 2π.
pub const TWO_PI: f64 = 2.0 * core::f64::consts::PI;
