//! Integrands.
//!
//! An [`Integrand`] is evaluated on a whole batch of points at once. Domain
//! functions (such as [`Keister`] or [`Linear`]) are composed with a
//! [`TrueMeasure`] through [`MeasuredIntegrand`], which gives an integrand
//! on the unit cube whose mean is the desired integral.

use std::f64::consts::PI;

use cubature_core::{PeriodizationTransform, Points};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{CubatureError, Result};
use crate::measure::{Gaussian, TrueMeasure, Uniform};

/// A function evaluated on batches of points.
pub trait Integrand: Send + Sync {
    /// Dimension of the points it accepts.
    fn dimension(&self) -> usize;

    /// One value per point.
    fn evaluate(&self, points: &Points) -> Vec<f64>;
}

impl<T: Integrand + ?Sized> Integrand for &T {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn evaluate(&self, points: &Points) -> Vec<f64> {
        (**self).evaluate(points)
    }
}

impl<T: Integrand + ?Sized> Integrand for Box<T> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn evaluate(&self, points: &Points) -> Vec<f64> {
        (**self).evaluate(points)
    }
}

/// An integrand whose expectation is a telescoping sum over levels
/// `E[P_L] = Σ_l E[Y_l]`.
pub trait MultiLevelIntegrand: Send + Sync {
    /// Dimension of the points level `level` consumes.
    fn dimension_at(&self, level: usize) -> usize;

    /// Values of the level difference `Y_l` at unit-cube points.
    fn evaluate_level(&self, level: usize, points: &Points) -> Vec<f64>;

    /// Relative cost of one sample on `level`.
    fn cost_at(&self, level: usize) -> f64;
}

/// A domain function composed with a true measure.
#[derive(Debug, Clone)]
pub struct MeasuredIntegrand<M, G> {
    measure: M,
    function: G,
}

impl<M: TrueMeasure, G: Integrand> MeasuredIntegrand<M, G> {
    /// Compose `function` (defined on the measure's domain) with `measure`.
    ///
    /// # Errors
    ///
    /// [`CubatureError::Dimension`] if the dimensions differ.
    pub fn new(measure: M, function: G) -> Result<Self> {
        if measure.dimension() != function.dimension() {
            return Err(CubatureError::Dimension {
                expected: measure.dimension(),
                found: function.dimension(),
            });
        }
        Ok(Self { measure, function })
    }

    /// The true measure.
    pub fn measure(&self) -> &M {
        &self.measure
    }
}

impl<M: TrueMeasure, G: Integrand> Integrand for MeasuredIntegrand<M, G> {
    fn dimension(&self) -> usize {
        self.measure.dimension()
    }

    fn evaluate(&self, points: &Points) -> Vec<f64> {
        let domain = self.measure.transform(points);
        let weight = self.measure.weight();
        let mut values = self.function.evaluate(&domain);
        if weight != 1.0 {
            values.iter_mut().for_each(|v| *v *= weight);
        }
        values
    }
}

/// An integrand composed with a periodization transform.
#[derive(Debug, Clone)]
pub struct Periodized<I> {
    inner: I,
    transform: PeriodizationTransform,
}

impl<I: Integrand> Periodized<I> {
    /// Wrap `inner` so it is evaluated at transformed points, weighted by
    /// the transform's Jacobian.
    pub fn new(inner: I, transform: PeriodizationTransform) -> Self {
        Self { inner, transform }
    }
}

impl<I: Integrand> Integrand for Periodized<I> {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn evaluate(&self, points: &Points) -> Vec<f64> {
        let (mapped, weights) = self.transform.apply(points);
        let mut values = self.inner.evaluate(&mapped);
        if self.transform.is_weighted() {
            for (v, w) in values.iter_mut().zip(weights) {
                *v *= w;
            }
        }
        values
    }
}

/// Integrand backed by a batch closure.
pub struct CustomIntegrand<F> {
    dimension: usize,
    function: F,
}

impl<F> CustomIntegrand<F>
where
    F: Fn(&Points) -> Vec<f64> + Send + Sync,
{
    /// Wrap `function`, which maps a batch of `dimension`-dimensional points
    /// to one value per point.
    pub fn new(dimension: usize, function: F) -> Self {
        Self {
            dimension,
            function,
        }
    }
}

impl<F> std::fmt::Debug for CustomIntegrand<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomIntegrand")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl<F> Integrand for CustomIntegrand<F>
where
    F: Fn(&Points) -> Vec<f64> + Send + Sync,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&self, points: &Points) -> Vec<f64> {
        (self.function)(points)
    }
}

/// Keister's function `π^{d/2} cos‖t‖` for `t ~ N(0, I/2)`.
///
/// Composed with [`Gaussian`] of variance 1/2 its mean equals
/// `∫ exp(−‖x‖²) cos‖x‖ dx` over `ℝ^d`.
#[derive(Debug, Clone, Copy)]
pub struct Keister {
    dimension: usize,
}

impl Keister {
    /// Domain function in `dimension` dimensions.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Keister's integrand on the unit cube.
    pub fn measured(dimension: usize) -> MeasuredIntegrand<Gaussian, Keister> {
        MeasuredIntegrand {
            measure: Gaussian::new(dimension).variance(0.5),
            function: Self::new(dimension),
        }
    }
}

impl Integrand for Keister {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&self, points: &Points) -> Vec<f64> {
        let scale = PI.powf(self.dimension as f64 / 2.0);
        points
            .rows()
            .map(|t| scale * t.iter().map(|x| x * x).sum::<f64>().sqrt().cos())
            .collect()
    }
}

/// Sum of coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Linear {
    dimension: usize,
}

impl Linear {
    /// Domain function in `dimension` dimensions.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Sum of coordinates under the uniform measure on the unit cube; the
    /// integral is `d/2`.
    pub fn measured(dimension: usize) -> MeasuredIntegrand<Uniform, Linear> {
        MeasuredIntegrand {
            measure: Uniform::unit(dimension),
            function: Self::new(dimension),
        }
    }
}

impl Integrand for Linear {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&self, points: &Points) -> Vec<f64> {
        points.rows().map(|x| x.iter().sum()).collect()
    }
}

/// Discounted European call priced by an Euler scheme with `2^l` time steps
/// on level `l`.
///
/// Level 0 returns the coarsest payoff; level `l > 0` returns the difference
/// between the payoff on `2^l` steps and on `2^(l−1)` steps driven by the same
/// Brownian increments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlEuropeanCall {
    /// Initial asset price.
    pub start_price: f64,
    /// Strike price.
    pub strike_price: f64,
    /// Risk-free interest rate.
    pub interest_rate: f64,
    /// Volatility.
    pub volatility: f64,
    /// Time to expiry.
    pub expiry: f64,
}

impl Default for MlEuropeanCall {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            strike_price: 100.0,
            interest_rate: 0.05,
            volatility: 0.2,
            expiry: 1.0,
        }
    }
}

impl MlEuropeanCall {
    /// Black–Scholes price of the option.
    pub fn fair_price(&self) -> f64 {
        let normal = Normal::standard();
        let denom = self.volatility * self.expiry.sqrt();
        let log_moneyness = (self.start_price / self.strike_price).ln();
        let d1 = (log_moneyness
            + (self.interest_rate + 0.5 * self.volatility * self.volatility) * self.expiry)
            / denom;
        let d2 = d1 - denom;
        self.start_price * normal.cdf(d1)
            - self.strike_price * (-self.interest_rate * self.expiry).exp() * normal.cdf(d2)
    }

    fn discounted_payoff(&self, terminal: f64) -> f64 {
        (-self.interest_rate * self.expiry).exp() * (terminal - self.strike_price).max(0.0)
    }

    fn euler_step(&self, price: f64, dt: f64, dw: f64) -> f64 {
        price + self.interest_rate * price * dt + self.volatility * price * dw
    }

    fn level_value(&self, level: usize, unit: &[f64], increments: &mut Vec<f64>) -> f64 {
        let steps = unit.len();
        let hf = self.expiry / steps as f64;
        increments.clear();
        increments.extend(
            unit.iter()
                .map(|&u| hf.sqrt() * Gaussian::standard_quantile(u)),
        );

        let fine = increments
            .iter()
            .fold(self.start_price, |s, &dw| self.euler_step(s, hf, dw));
        let fine_payoff = self.discounted_payoff(fine);
        if level == 0 {
            return fine_payoff;
        }

        let hc = 2.0 * hf;
        let coarse = increments
            .chunks_exact(2)
            .fold(self.start_price, |s, dw| self.euler_step(s, hc, dw[0] + dw[1]));
        fine_payoff - self.discounted_payoff(coarse)
    }
}

impl MultiLevelIntegrand for MlEuropeanCall {
    fn dimension_at(&self, level: usize) -> usize {
        1 << level
    }

    fn evaluate_level(&self, level: usize, points: &Points) -> Vec<f64> {
        assert_eq!(
            points.dimension(),
            self.dimension_at(level),
            "level {} expects {}-dimensional points",
            level,
            self.dimension_at(level)
        );
        let mut increments = Vec::with_capacity(points.dimension());
        points
            .rows()
            .map(|row| self.level_value(level, row, &mut increments))
            .collect()
    }

    fn cost_at(&self, level: usize) -> f64 {
        (1u64 << level) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measured_integrand_applies_weight() {
        let f = CustomIntegrand::new(1, |x: &Points| x.rows().map(|r| r[0]).collect());
        let m = crate::measure::Lebesgue::new(vec![0.0], vec![2.0]).unwrap();
        let g = MeasuredIntegrand::new(m, f).unwrap();
        let values = g.evaluate(&Points::from_vec(2, 1, vec![0.25, 0.5]));
        // x = 0.5, 1.0 scaled by volume 2
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn measured_integrand_rejects_dimension_mismatch() {
        let err = MeasuredIntegrand::new(Uniform::unit(2), Linear::new(3)).err();
        assert!(
            matches!(err, Some(CubatureError::Dimension { expected: 2, found: 3 })),
            "{err:?}"
        );
        assert_eq!(Keister::measured(3).dimension(), 3);
        assert_eq!(Linear::measured(4).dimension(), 4);
    }

    #[test]
    fn keister_at_origin() {
        let k = Keister::new(2);
        let v = k.evaluate(&Points::zeros(1, 2));
        assert!((v[0] - PI).abs() < 1e-12);
    }

    #[test]
    fn periodized_linear_keeps_mean() {
        let n = 2048;
        let points = Points::from_vec(n, 1, (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect());
        for t in [PeriodizationTransform::C1Sin, PeriodizationTransform::Baker] {
            let p = Periodized::new(Linear::measured(1), t);
            let mean: f64 = p.evaluate(&points).iter().sum::<f64>() / n as f64;
            assert!((mean - 0.5).abs() < 1e-5, "{t:?}");
        }
    }

    #[test]
    fn black_scholes_reference_price() {
        let call = MlEuropeanCall::default();
        assert!((call.fair_price() - 10.450_583_572_185_565).abs() < 1e-6);
    }

    #[test]
    fn level_zero_uses_one_step() {
        let call = MlEuropeanCall::default();
        assert_eq!(call.dimension_at(0), 1);
        assert_eq!(call.dimension_at(3), 8);
        let v = call.evaluate_level(0, &Points::from_vec(1, 1, vec![0.5]));
        // median increment is zero: S = 100·(1 + 0.05)
        let expected = (-0.05f64).exp() * 5.0;
        assert!((v[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn level_difference_vanishes_without_volatility() {
        let call = MlEuropeanCall {
            volatility: 0.0,
            ..MlEuropeanCall::default()
        };
        let points = Points::from_vec(1, 4, vec![0.3, 0.9, 0.1, 0.6]);
        let v = call.evaluate_level(2, &points);
        // deterministic growth differs only through Euler discretisation
        let fine = 100.0 * (1.0f64 + 0.05 / 4.0).powi(4);
        let coarse = 100.0 * (1.0f64 + 0.05 / 2.0).powi(2);
        let expected = (-0.05f64).exp() * (fine - coarse);
        assert!((v[0] - expected).abs() < 1e-9);
    }
}
