//! Shift-invariant covariance kernels over lattice points and their spectra.
//!
//! For a rank-1 lattice the Gram matrix of a shift-invariant kernel is
//! circulant, so its eigenvalues are the DFT of its first row
//! `C1[i] = K(x_i, 0)`. The kernels here are products over dimensions of
//! `1 + θ·k(x_j)`:
//!
//! - Bernoulli of order `r`: `k(x) = −(−1)^r (2π)^{2r}/(2r)! · B_{2r}(x)`
//! - Cosine with decay `b`: `k(x) = 2b(cos 2πx − b)/(1 + b² − 2b cos 2πx)`
//!
//! When `θ` is small every `C1[i]` is close to one and `Λ_0 ≈ n` dominates.
//! The stable path accumulates `C1 − 1` across dimensions and transforms that
//! instead, giving `Λ̊ = DFT(C1 − 1)` with `Λ = Λ̊ + n·e_0`.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::constants::{RING_DISCREPANCY_TOL, SPECTRUM_IMAG_TOL, SPECTRUM_NEG_TOL, TWO_PI};
use crate::diagnostics::{check_finite, IssueKind, IssueSeverity, NumericIssue};
use crate::fft::{fft_real, Complex64};
use crate::math::{abs, cos, factorial, pow, sq};
use crate::types::Points;

/// Kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelFamily {
    /// Bernoulli-polynomial kernel of order `r` (1 or 2), algebraic decay.
    Bernoulli {
        /// Smoothness order `r`; the polynomial degree is `2r`.
        order: u32,
    },
    /// Truncated cosine series with geometric decay `b ∈ (0, 1)`.
    Cosine {
        /// Decay rate of the Fourier coefficients.
        decay: f64,
    },
}

impl Default for KernelFamily {
    fn default() -> Self {
        KernelFamily::Bernoulli { order: 2 }
    }
}

impl KernelFamily {
    /// Bounds on `ln(shape)` for the hyperparameter search.
    pub fn shape_search_range(&self) -> (f64, f64) {
        match self {
            KernelFamily::Bernoulli { .. } => (-3.0, 0.0),
            KernelFamily::Cosine { .. } => (-5.0, 5.0),
        }
    }

    /// True if this family is supported by [`KernelModel`].
    pub fn is_supported(&self) -> bool {
        match *self {
            KernelFamily::Bernoulli { order } => order == 1 || order == 2,
            KernelFamily::Cosine { decay } => decay > 0.0 && decay < 1.0,
        }
    }

    /// Multiplicative constant applied to the univariate kernel.
    fn constant(&self) -> f64 {
        match *self {
            KernelFamily::Bernoulli { order } => {
                let b_order = 2 * order;
                let sign = if order % 2 == 0 { -1.0 } else { 1.0 };
                sign * pow(TWO_PI, b_order as f64) / factorial(b_order)
            }
            KernelFamily::Cosine { .. } => 1.0,
        }
    }

    /// Univariate kernel shape before the constant.
    #[inline]
    fn univariate(&self, x: f64) -> f64 {
        match *self {
            KernelFamily::Bernoulli { order: 1 } => -x * (1.0 - x) + 1.0 / 6.0,
            KernelFamily::Bernoulli { .. } => sq(x * (1.0 - x)) - 1.0 / 30.0,
            KernelFamily::Cosine { decay: b } => {
                let c = cos(TWO_PI * x);
                2.0 * b * (c - b) / (1.0 + b * b - 2.0 * b * c)
            }
        }
    }
}

/// Explicit numerical conventions for kernel evaluation.
///
/// Passed to every spectrum computation rather than baked into helpers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Kernel family and order.
    pub family: KernelFamily,
    /// Track `Λ − n` directly to avoid cancellation in `1 − n/Λ_0`.
    pub avoid_cancellation: bool,
    /// Run the extra consistency checks and collect numeric issues.
    pub debug: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            family: KernelFamily::default(),
            avoid_cancellation: true,
            debug: true,
        }
    }
}

/// Eigenvalue spectrum of the kernel Gram matrix at one shape parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSpectrum {
    /// Eigenvalues `|Λ_k|`.
    pub lambda: Vec<f64>,
    /// Cancellation-safe eigenvalues `Λ̊ = DFT(C1 − 1)` when enabled.
    pub lambda_ring: Option<Vec<f64>>,
    /// Shape parameter `θ` the spectrum was computed at.
    pub shape: f64,
    /// Largest imaginary residue relative to the largest real magnitude.
    pub imaginary_residue: f64,
    /// Most negative raw eigenvalue relative to the largest magnitude.
    pub min_relative_eigenvalue: f64,
    /// `Σ|Λ_direct − Λ|` from the debug cross-check, if run.
    pub ring_discrepancy: Option<f64>,
}

impl KernelSpectrum {
    /// Number of eigenvalues (`n`).
    pub fn len(&self) -> usize {
        self.lambda.len()
    }

    /// True if there are no eigenvalues.
    pub fn is_empty(&self) -> bool {
        self.lambda.is_empty()
    }

    /// `Λ̊_0` when tracked, otherwise `Λ_0 − n`.
    pub fn lambda_ring_zero(&self) -> f64 {
        match &self.lambda_ring {
            Some(ring) => ring[0],
            None => self.lambda[0] - self.lambda.len() as f64,
        }
    }

    /// Numeric problems detected in this spectrum.
    ///
    /// Imaginary residues and negative eigenvalues violate positive
    /// definiteness of the kernel and are reported as invariant violations.
    pub fn issues(&self) -> Vec<NumericIssue> {
        let mut issues = Vec::new();
        check_finite("lambda", &self.lambda, &mut issues);
        if let Some(ring) = &self.lambda_ring {
            check_finite("lambda_ring", ring, &mut issues);
        }
        if self.imaginary_residue > SPECTRUM_IMAG_TOL {
            issues.push(NumericIssue {
                quantity: "lambda",
                kind: IssueKind::Imaginary,
                severity: IssueSeverity::InvariantViolation,
                magnitude: self.imaginary_residue,
            });
        }
        if self.min_relative_eigenvalue < -SPECTRUM_NEG_TOL {
            issues.push(NumericIssue {
                quantity: "lambda",
                kind: IssueKind::Negative,
                severity: IssueSeverity::InvariantViolation,
                magnitude: self.min_relative_eigenvalue,
            });
        }
        if let Some(d) = self.ring_discrepancy {
            if d > RING_DISCREPANCY_TOL {
                issues.push(NumericIssue {
                    quantity: "lambda_ring",
                    kind: IssueKind::Inconsistent,
                    severity: IssueSeverity::Advisory,
                    magnitude: d,
                });
            }
        }
        issues
    }
}

/// Kernel evaluated over an unshifted lattice.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelModel {
    config: KernelConfig,
}

impl KernelModel {
    /// Create a model with explicit conventions.
    pub fn new(config: KernelConfig) -> Self {
        Self { config }
    }

    /// The conventions this model uses.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// First row of the Gram matrix minus one, and the row itself.
    ///
    /// Accumulates `K_j − 1 = θ k(x_j) K_{j−1} + (K_{j−1} − 1)` so the small
    /// part never passes through a value near one.
    pub fn first_row(&self, unshifted: &Points, shape: f64) -> (Vec<f64>, Vec<f64>) {
        let theta = shape * self.config.family.constant();
        let mut km1 = Vec::with_capacity(unshifted.n());
        let mut k = Vec::with_capacity(unshifted.n());
        for row in unshifted.rows() {
            let mut kj_m1 = 0.0;
            let mut kj = 1.0;
            for &x in row {
                kj_m1 += theta * self.config.family.univariate(x) * kj;
                kj = 1.0 + kj_m1;
            }
            km1.push(kj_m1);
            k.push(kj);
        }
        (km1, k)
    }

    /// Eigenvalue spectrum at shape parameter `shape`.
    pub fn spectrum(&self, unshifted: &Points, shape: f64) -> KernelSpectrum {
        let n = unshifted.n();
        if self.config.avoid_cancellation {
            let (c1m1, c1) = self.first_row(unshifted, shape);
            let ring_full = fft_real(&c1m1);
            let (imaginary_residue, _) = residue(&ring_full);
            let ring: Vec<f64> = ring_full.iter().map(|c| c.re).collect();
            let mut raw = ring.clone();
            raw[0] += n as f64;
            let ring_discrepancy = if self.config.debug {
                let direct = fft_real(&c1);
                Some(
                    direct
                        .iter()
                        .zip(raw.iter())
                        .map(|(d, l)| abs(d.re - l))
                        .sum(),
                )
            } else {
                None
            };
            let min_relative_eigenvalue = min_relative(&raw);
            KernelSpectrum {
                lambda: raw.into_iter().map(abs).collect(),
                lambda_ring: Some(ring),
                shape,
                imaginary_residue,
                min_relative_eigenvalue,
                ring_discrepancy,
            }
        } else {
            let theta = shape * self.config.family.constant();
            let c1: Vec<f64> = unshifted
                .rows()
                .map(|row| {
                    row.iter()
                        .map(|&x| 1.0 + theta * self.config.family.univariate(x))
                        .product()
                })
                .collect();
            let full = fft_real(&c1);
            let (imaginary_residue, _) = residue(&full);
            let raw: Vec<f64> = full.iter().map(|c| c.re).collect();
            let min_relative_eigenvalue = min_relative(&raw);
            KernelSpectrum {
                lambda: raw.into_iter().map(abs).collect(),
                lambda_ring: None,
                shape,
                imaginary_residue,
                min_relative_eigenvalue,
                ring_discrepancy: None,
            }
        }
    }
}

/// Largest |Im| relative to max(1, largest |Re|), and the largest |Re|.
fn residue(values: &[Complex64]) -> (f64, f64) {
    let max_re = values.iter().map(|c| abs(c.re)).fold(0.0, f64::max);
    let max_im = values.iter().map(|c| abs(c.im)).fold(0.0, f64::max);
    (max_im / max_re.max(1.0), max_re)
}

fn min_relative(raw: &[f64]) -> f64 {
    let scale = raw.iter().map(|v| abs(*v)).fold(0.0, f64::max).max(1.0);
    raw.iter().copied().fold(f64::INFINITY, f64::min) / scale
}
