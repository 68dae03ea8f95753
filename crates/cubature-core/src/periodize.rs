//! Periodization transforms.
//!
//! Lattice rules converge fastest for periodic integrands. A transform
//! `ψ: [0,1] → [0,1]` with vanishing derivatives at the endpoints makes
//! `f(ψ(x)) · ∏ ψ'(x_j)` periodic while preserving the integral. Baker's
//! tent map is measure preserving and needs no weight.

use alloc::vec::Vec;
use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::math::{abs, cos, sin, sq};
use crate::types::Points;

/// Variable transform applied before evaluating the integrand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeriodizationTransform {
    /// Baker's (tent) transform `1 − 2|x − 1/2|`.
    #[default]
    Baker,
    /// Polynomial `C⁰` transform `3x² − 2x³`.
    C0,
    /// Polynomial `C¹` transform `x³(10 − 15x + 6x²)`.
    C1,
    /// Sidi's `C¹` transform.
    C1Sin,
    /// Sidi's `C²` transform.
    C2Sin,
    /// Sidi's `C³` transform.
    C3Sin,
    /// Identity.
    None,
}

impl PeriodizationTransform {
    /// Map one coordinate.
    #[inline]
    pub fn map(&self, x: f64) -> f64 {
        match self {
            Self::Baker => 1.0 - 2.0 * abs(x - 0.5),
            Self::C0 => 3.0 * x * x - 2.0 * x * x * x,
            Self::C1 => x * x * x * (10.0 - 15.0 * x + 6.0 * x * x),
            Self::C1Sin => x - sin(2.0 * PI * x) / (2.0 * PI),
            Self::C2Sin => (8.0 - 9.0 * cos(PI * x) + cos(3.0 * PI * x)) / 16.0,
            Self::C3Sin => {
                (12.0 * PI * x - 8.0 * sin(2.0 * PI * x) + sin(4.0 * PI * x)) / (12.0 * PI)
            }
            Self::None => x,
        }
    }

    /// Derivative of [`map`](Self::map) at one coordinate.
    #[inline]
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            Self::Baker | Self::None => 1.0,
            Self::C0 => 6.0 * x * (1.0 - x),
            Self::C1 => 30.0 * x * x * sq(1.0 - x),
            Self::C1Sin => 2.0 * sq(sin(PI * x)),
            Self::C2Sin => (9.0 * PI * sin(PI * x) - 3.0 * PI * sin(3.0 * PI * x)) / 16.0,
            Self::C3Sin => 1.0 - 4.0 / 3.0 * cos(2.0 * PI * x) + cos(4.0 * PI * x) / 3.0,
        }
    }

    /// True if the transform changes the integrand's weight.
    pub fn is_weighted(&self) -> bool {
        !matches!(self, Self::Baker | Self::None)
    }

    /// Map a batch of points and return the per-point Jacobian weights.
    pub fn apply(&self, points: &Points) -> (Points, Vec<f64>) {
        let mut mapped = points.clone();
        let mut weights = Vec::with_capacity(points.n());
        for row in mapped.rows_mut() {
            let mut w = 1.0;
            for x in row.iter_mut() {
                if self.is_weighted() {
                    w *= self.derivative(*x);
                }
                *x = self.map(*x);
            }
            weights.push(w);
        }
        (mapped, weights)
    }
}
