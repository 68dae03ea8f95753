//! Error types for criterion construction.
//!
//! Every error here is raised before any sampling happens. Soft failures
//! during a run (budget exhaustion, numeric instability) are not errors; they
//! are reported through [`StopReason`](crate::StopReason) and the run's
//! diagnostic history.

use crate::distribution::DistributionKind;

/// A configuration value that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterIssue {
    /// A tolerance was negative, or both tolerances were zero.
    InvalidTolerance {
        /// Absolute tolerance supplied.
        abs_tol: f64,
        /// Relative tolerance supplied.
        rel_tol: f64,
    },
    /// The significance level must lie in `(0, 1)`.
    AlphaOutOfRange(f64),
    /// A sample count that must be a power of two is not.
    NotPowerOfTwo {
        /// Name of the offending setting.
        name: &'static str,
        /// Value supplied.
        value: u64,
    },
    /// `n_max` is smaller than `n_init`.
    BudgetBelowInitial {
        /// Initial sample count.
        n_init: u64,
        /// Maximum sample count.
        n_max: u64,
    },
    /// A count that must be positive (or at least a minimum) is too small.
    TooSmall {
        /// Name of the offending setting.
        name: &'static str,
        /// Value supplied.
        value: u64,
        /// Smallest accepted value.
        minimum: u64,
    },
    /// A real-valued setting lies outside its admissible range.
    OutOfRange {
        /// Name of the offending setting.
        name: &'static str,
        /// Value supplied.
        value: f64,
    },
    /// The kernel family/order combination is not implemented.
    UnsupportedKernel,
    /// The distribution must be randomized for this criterion.
    NotRandomized,
    /// The distribution's generator backend is not the one required.
    UnsupportedBackend,
}

impl std::fmt::Display for ParameterIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTolerance { abs_tol, rel_tol } => write!(
                f,
                "tolerances must be non-negative and not both zero (abs_tol = {}, rel_tol = {})",
                abs_tol, rel_tol
            ),
            Self::AlphaOutOfRange(alpha) => write!(f, "alpha must lie in (0, 1), got {}", alpha),
            Self::NotPowerOfTwo { name, value } => {
                write!(f, "{} must be a power of two, got {}", name, value)
            }
            Self::BudgetBelowInitial { n_init, n_max } => write!(
                f,
                "n_max ({}) must be at least n_init ({})",
                n_max, n_init
            ),
            Self::TooSmall {
                name,
                value,
                minimum,
            } => write!(f, "{} must be at least {}, got {}", name, minimum, value),
            Self::OutOfRange { name, value } => write!(f, "{} is out of range: {}", name, value),
            Self::UnsupportedKernel => write!(f, "kernel family or order not implemented"),
            Self::NotRandomized => write!(f, "distribution must have randomize = true"),
            Self::UnsupportedBackend => write!(f, "distribution must use the GAIL generator backend"),
        }
    }
}

/// Error returned when a stopping criterion cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum CubatureError {
    /// A configuration value is invalid.
    Parameter(ParameterIssue),

    /// The discrete distribution cannot drive this criterion.
    DistributionCompatibility {
        /// Criterion being constructed.
        criterion: &'static str,
        /// Kind of the supplied distribution.
        found: DistributionKind,
        /// Kinds the criterion accepts.
        allowed: &'static [DistributionKind],
    },

    /// Two collaborators that must share a dimension do not.
    Dimension {
        /// Dimension required (of the integrand, measure or lower bound).
        expected: usize,
        /// Dimension supplied.
        found: usize,
    },
}

impl std::fmt::Display for CubatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parameter(issue) => write!(f, "invalid parameter: {}", issue),
            Self::DistributionCompatibility {
                criterion,
                found,
                allowed,
            } => write!(
                f,
                "{} is not compatible with {:?} distributions (allowed: {:?})",
                criterion, found, allowed
            ),
            Self::Dimension { expected, found } => write!(
                f,
                "dimension mismatch: expected {}, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for CubatureError {}

impl From<ParameterIssue> for CubatureError {
    fn from(issue: ParameterIssue) -> Self {
        Self::Parameter(issue)
    }
}

/// Result type for criterion construction.
pub type Result<T> = std::result::Result<T, CubatureError>;
