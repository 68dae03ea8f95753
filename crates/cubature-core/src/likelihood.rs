//! Hyperparameter objectives for the lattice kernel.
//!
//! Both objectives work entirely in the Fourier domain: with `f̃` the FFT of
//! the integrand values and `Λ` the kernel spectrum over the same lattice,
//! quadratic forms `fᵀ C⁻¹ f` reduce to sums over `|f̃_k|² / Λ_k`.
//! Zero eigenvalues are skipped.

use serde::{Deserialize, Serialize};

use crate::fft::Complex64;
use crate::kernel::KernelSpectrum;
use crate::math::ln;

/// Which objective selects the shape parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Maximum likelihood (empirical Bayes and full Bayes).
    #[default]
    Mle,
    /// Generalized cross validation.
    Gcv,
}

/// Objective value and the RKHS norm estimate at one shape parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveValue {
    /// Value to minimise.
    pub loss: f64,
    /// Squared RKHS norm estimate of the integrand, divided by `n`.
    pub rkhs_norm: f64,
    /// Determinant term (MLE) or trace term (GCV).
    pub loss1: f64,
    /// Data-fit term.
    pub loss2: f64,
}

/// Evaluate the objective for a spectrum and the integrand transform.
///
/// With `arbitrary_mean` the zero frequency is excluded from the data-fit
/// sums, since the constant component is absorbed by the unknown mean.
///
/// # Panics
///
/// Panics if `ftilde` and the spectrum differ in length.
pub fn objective(
    kind: ObjectiveKind,
    arbitrary_mean: bool,
    spectrum: &KernelSpectrum,
    ftilde: &[Complex64],
) -> ObjectiveValue {
    assert_eq!(
        spectrum.len(),
        ftilde.len(),
        "spectrum and transform must have equal length"
    );
    let n = ftilde.len() as f64;
    let k0 = usize::from(arbitrary_mean);

    let nonzero = || {
        spectrum
            .lambda
            .iter()
            .zip(ftilde.iter())
            .enumerate()
            .filter(|(_, (&l, _))| l != 0.0)
    };

    match kind {
        ObjectiveKind::Mle => {
            let fit: f64 = nonzero()
                .filter(|(k, _)| *k >= k0)
                .map(|(_, (&l, f))| f.norm_sqr() / l)
                .sum();
            let loss1: f64 = nonzero().map(|(_, (&l, _))| ln(l)).sum();
            let loss2 = n * ln(fit);
            ObjectiveValue {
                loss: loss1 + loss2,
                rkhs_norm: fit / n,
                loss1,
                loss2,
            }
        }
        ObjectiveKind::Gcv => {
            let fit: f64 = nonzero()
                .filter(|(k, _)| *k >= k0)
                .map(|(_, (&l, f))| (f / l).norm_sqr())
                .sum();
            let trace: f64 = nonzero().map(|(_, (&l, _))| 1.0 / l).sum();
            let loss1 = 2.0 * ln(trace);
            let loss2 = ln(fit);
            ObjectiveValue {
                loss: loss2 - loss1,
                rkhs_norm: fit / n,
                loss1,
                loss2,
            }
        }
    }
}

/// Objective as a function of `ln(shape)` with NaN mapped to `+∞`, ready for
/// a bounded line search.
#[inline]
pub fn search_value(value: &ObjectiveValue) -> f64 {
    if value.loss.is_nan() {
        f64::INFINITY
    } else {
        value.loss
    }
}
