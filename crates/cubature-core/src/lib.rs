//! Numerical core for adaptive lattice cubature.
//!
//! This crate provides the kernel, lattice and transform machinery behind the
//! stopping criteria in the `cubature` crate, designed to work in `no_std`
//! environments with only an allocator.
//!
//! # Features
//!
//! - `std` (default): Enable standard library support for convenience
//!
//! # Usage
//!
//! This crate is typically used through the main `cubature` crate, which
//! provides the stopping criteria, run state and result types. It can be used
//! directly when only the incremental FFT or kernel spectrum is needed.
//!
//! ```
//! use cubature_core::fft::{fft_real, merge_fft};
//!
//! let values = [1.0, 2.0, 3.0, 4.0];
//! let even = fft_real(&[values[0], values[2]]);
//! let odd = fft_real(&[values[1], values[3]]);
//! let merged = merge_fft(even, odd);
//! let direct = fft_real(&values);
//! for (a, b) in merged.iter().zip(direct.iter()) {
//!     assert!((a - b).norm() < 1e-12);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod constants;
pub mod diagnostics;
pub mod fft;
pub mod kernel;
pub mod lattice;
pub mod likelihood;
pub mod math;
pub mod periodize;
pub mod statistics;
pub mod types;

// Re-export commonly used items at crate root
pub use diagnostics::{IssueKind, IssueSeverity, NumericIssue};
pub use fft::Complex64;
pub use kernel::{KernelConfig, KernelFamily, KernelModel, KernelSpectrum};
pub use lattice::{GeneratorVector, LatticeOrder, LatticePointStream};
pub use likelihood::{ObjectiveKind, ObjectiveValue};
pub use periodize::PeriodizationTransform;
pub use types::Points;
