//! Numeric-instability detection.
//!
//! Checks here only collect [`NumericIssue`]s; reporting them is up to the
//! caller. Ordinary NaN/Inf findings are advisory, while findings that
//! contradict a mathematical invariant (an imaginary residue in a real
//! spectrum, a negative variance) carry [`IssueSeverity::InvariantViolation`].

use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::fft::Complex64;

/// What went wrong with a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// Contains NaN.
    NaN,
    /// Contains ±∞.
    Infinite,
    /// Non-negligible imaginary part where a real value is required.
    Imaginary,
    /// Negative where a non-negative value is required.
    Negative,
    /// Two computations of the same quantity disagree.
    Inconsistent,
}

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueSeverity {
    /// Worth surfacing for analysis; the run continues.
    Advisory,
    /// Contradicts an invariant of the model; indicates an internal bug.
    InvariantViolation,
}

/// A detected numeric issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericIssue {
    /// Name of the offending quantity.
    pub quantity: &'static str,
    /// Kind of problem.
    pub kind: IssueKind,
    /// Severity.
    pub severity: IssueSeverity,
    /// Size of the offending value, where meaningful.
    pub magnitude: f64,
}

impl fmt::Display for NumericIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            IssueKind::NaN => "has NaN values",
            IssueKind::Infinite => "has Inf values",
            IssueKind::Imaginary => "has complex values",
            IssueKind::Negative => "has negative values",
            IssueKind::Inconsistent => "disagrees with its direct computation",
        };
        write!(f, "{} {} (magnitude {:.3e})", self.quantity, what, self.magnitude)
    }
}

/// Record NaN and infinite entries of a real slice.
pub fn check_finite(quantity: &'static str, values: &[f64], out: &mut Vec<NumericIssue>) {
    if values.iter().any(|v| v.is_nan()) {
        out.push(NumericIssue {
            quantity,
            kind: IssueKind::NaN,
            severity: IssueSeverity::Advisory,
            magnitude: f64::NAN,
        });
    }
    if values.iter().any(|v| v.is_infinite()) {
        out.push(NumericIssue {
            quantity,
            kind: IssueKind::Infinite,
            severity: IssueSeverity::Advisory,
            magnitude: f64::INFINITY,
        });
    }
}

/// Record NaN and infinite entries of a complex slice.
pub fn check_complex_finite(
    quantity: &'static str,
    values: &[Complex64],
    out: &mut Vec<NumericIssue>,
) {
    if values.iter().any(|c| c.re.is_nan() || c.im.is_nan()) {
        out.push(NumericIssue {
            quantity,
            kind: IssueKind::NaN,
            severity: IssueSeverity::Advisory,
            magnitude: f64::NAN,
        });
    }
    if values.iter().any(|c| c.re.is_infinite() || c.im.is_infinite()) {
        out.push(NumericIssue {
            quantity,
            kind: IssueKind::Infinite,
            severity: IssueSeverity::Advisory,
            magnitude: f64::INFINITY,
        });
    }
}

/// Record a negative value of a quantity that must be non-negative.
pub fn check_non_negative(quantity: &'static str, value: f64, out: &mut Vec<NumericIssue>) {
    if value < 0.0 {
        out.push(NumericIssue {
            quantity,
            kind: IssueKind::Negative,
            severity: IssueSeverity::InvariantViolation,
            magnitude: value,
        });
    }
}
