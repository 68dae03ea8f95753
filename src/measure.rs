//! True measures: maps from the unit cube to the integration domain.

use cubature_core::Points;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{CubatureError, ParameterIssue, Result};

/// A measure the integral is taken against.
///
/// `transform` maps unit-cube points to the domain and `weight` is the
/// constant density correction (the box volume for Lebesgue measure).
pub trait TrueMeasure: Send + Sync {
    /// Dimension of the domain.
    fn dimension(&self) -> usize;

    /// Map unit-cube points to the domain.
    fn transform(&self, unit: &Points) -> Points;

    /// Factor applied to every integrand value.
    fn weight(&self) -> f64;
}

/// Axis-aligned box given by lower and upper corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BoxDomain {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl BoxDomain {
    fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(CubatureError::Dimension {
                expected: lower.len(),
                found: upper.len(),
            });
        }
        if lower.is_empty() {
            return Err(ParameterIssue::TooSmall {
                name: "dimension",
                value: 0,
                minimum: 1,
            }
            .into());
        }
        for (&a, &b) in lower.iter().zip(upper.iter()) {
            if !(a.is_finite() && b.is_finite()) || a >= b {
                return Err(ParameterIssue::OutOfRange {
                    name: "bounds",
                    value: b - a,
                }
                .into());
            }
        }
        Ok(Self { lower, upper })
    }

    fn unit(dimension: usize) -> Self {
        Self {
            lower: vec![0.0; dimension],
            upper: vec![1.0; dimension],
        }
    }

    fn map(&self, unit: &Points) -> Points {
        let mut out = unit.clone();
        for row in out.rows_mut() {
            for ((x, a), b) in row.iter_mut().zip(&self.lower).zip(&self.upper) {
                *x = a + (b - a) * *x;
            }
        }
        out
    }

    fn volume(&self) -> f64 {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(a, b)| b - a)
            .product()
    }
}

/// Uniform probability measure on a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uniform {
    domain: BoxDomain,
}

impl Uniform {
    /// Uniform measure on `[lower, upper]`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        Ok(Self {
            domain: BoxDomain::new(lower, upper)?,
        })
    }

    /// Uniform measure on the unit cube.
    pub fn unit(dimension: usize) -> Self {
        Self {
            domain: BoxDomain::unit(dimension),
        }
    }
}

impl TrueMeasure for Uniform {
    fn dimension(&self) -> usize {
        self.domain.lower.len()
    }

    fn transform(&self, unit: &Points) -> Points {
        self.domain.map(unit)
    }

    fn weight(&self) -> f64 {
        1.0
    }
}

/// Lebesgue measure on a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lebesgue {
    domain: BoxDomain,
}

impl Lebesgue {
    /// Lebesgue measure on `[lower, upper]`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        Ok(Self {
            domain: BoxDomain::new(lower, upper)?,
        })
    }

    /// Volume of the box.
    pub fn volume(&self) -> f64 {
        self.domain.volume()
    }
}

impl TrueMeasure for Lebesgue {
    fn dimension(&self) -> usize {
        self.domain.lower.len()
    }

    fn transform(&self, unit: &Points) -> Points {
        self.domain.map(unit)
    }

    fn weight(&self) -> f64 {
        self.domain.volume()
    }
}

/// Gaussian measure with independent coordinates of equal variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    mean: Vec<f64>,
    variance: f64,
}

impl Gaussian {
    /// Standard normal in `dimension` dimensions.
    pub fn new(dimension: usize) -> Self {
        Self {
            mean: vec![0.0; dimension],
            variance: 1.0,
        }
    }

    /// Builder method to set the common variance.
    pub fn variance(mut self, variance: f64) -> Self {
        self.variance = variance;
        self
    }

    /// Builder method to set the mean vector.
    pub fn mean(mut self, mean: Vec<f64>) -> Self {
        self.mean = mean;
        self
    }

    /// Inverse CDF of the standard normal with the argument kept inside
    /// `[ε, 1 − ε]`, so a lattice point on the cube boundary maps to a finite
    /// value.
    pub fn standard_quantile(u: f64) -> f64 {
        let u = u.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
        Normal::standard().inverse_cdf(u)
    }
}

impl TrueMeasure for Gaussian {
    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, unit: &Points) -> Points {
        let sd = self.variance.sqrt();
        let mut out = unit.clone();
        for row in out.rows_mut() {
            for (x, m) in row.iter_mut().zip(&self.mean) {
                *x = m + sd * Self::standard_quantile(*x);
            }
        }
        out
    }

    fn weight(&self) -> f64 {
        1.0
    }
}
