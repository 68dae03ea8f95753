//! # cubature
//!
//! Adaptive quasi-Monte Carlo cubature with guaranteed error tolerances.
//!
//! A stopping criterion repeatedly samples an integrand on a low-discrepancy
//! point set, estimates the integral and an error bound, and grows the sample
//! until the bound meets the requested tolerance or a budget is exhausted:
//!
//! - [`ReplicationVarianceCriterion`]: spread of independently randomized
//!   replications, for one or more integrands.
//! - [`BayesianLatticeCriterion`]: Gaussian-process posterior on a shifted
//!   rank-1 lattice, with an FFT that is extended in place as the lattice
//!   doubles.
//! - [`MultiLevelCriterion`]: telescoping multi-level estimator that trades
//!   variance against discretisation bias.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cubature::{BayesLatticeConfig, BayesianLatticeCriterion, Keister, Lattice, StoppingCriterion};
//!
//! let config = BayesLatticeConfig::default().abs_tol(1e-3);
//! let mut criterion =
//!     BayesianLatticeCriterion::new(Keister::measured(3), Lattice::new(3), config)?;
//! let result = criterion.integrate();
//!
//! println!("{:.6} ± {:.1e} ({})", result.solution, result.error_bound, result.stop_reason);
//! ```
//!
//! Construction validates everything and is the only fallible step. A run
//! that cannot meet its tolerance within budget still returns its best
//! estimate, with [`StopReason::MaxSamples`] and a full diagnostic history.
//!
//! ## Feature Flags
//!
//! - `parallel`: evaluate replications with rayon.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod backend;
pub mod config;
pub mod error;
pub mod result;
pub mod state;

// Functional modules
pub mod criterion;
pub mod distribution;
pub mod integrand;
pub mod measure;

// Re-exports for public API
pub use backend::{ComputeBackend, CpuBackend};
pub use config::{
    BayesLatticeConfig, ErrorBoundMode, MultiLevelConfig, ReplicationConfig, Tolerance,
};
pub use criterion::{
    BayesianLatticeCriterion, MultiLevelCriterion, MultiLevelData, ReplicationVarianceCriterion,
    StoppingCriterion,
};
pub use distribution::{
    DiscreteDistribution, DistributionKind, ExtensibleSequence, GeneratorBackend, IidStdUniform,
    Lattice, LatticeSource,
};
pub use error::{CubatureError, ParameterIssue, Result};
pub use integrand::{
    CustomIntegrand, Integrand, Keister, Linear, MeasuredIntegrand, MlEuropeanCall,
    MultiLevelIntegrand, Periodized,
};
pub use measure::{Gaussian, Lebesgue, TrueMeasure, Uniform};
pub use result::{IntegrationResult, StopReason};
pub use state::{
    DiagnosticLog, DiagnosticRecord, IntegrationState, IterationDetail, Stage, StateSnapshot,
};

// Kernel and lattice types from the core crate
pub use cubature_core::{
    GeneratorVector, KernelConfig, KernelFamily, LatticeOrder, PeriodizationTransform, Points,
};
