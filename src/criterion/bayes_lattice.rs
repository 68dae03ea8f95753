//! Bayesian cubature on randomly shifted rank-1 lattices.
//!
//! The integrand is modelled as a Gaussian process with a shift-invariant
//! kernel. On a lattice the Gram matrix is circulant, so every quantity the
//! posterior needs is a sum over the FFT of the integrand values `f̃` and the
//! kernel spectrum `Λ`. Each iteration doubles the lattice:
//!
//! 1. generate the `2^(m−1)` new points (all `2^m_min` the first time),
//! 2. merge their transform into `f̃` with one butterfly pass,
//! 3. pick the kernel shape by a bounded search on the MLE or GCV objective,
//! 4. derive the posterior mean and credible half-width,
//! 5. stop once the half-width is within tolerance.

use std::mem;

use cubature_core::diagnostics::check_complex_finite;
use cubature_core::fft::{fft_real, fft_real_bit_reversed, merge_fft};
use cubature_core::likelihood::objective;
use cubature_core::{
    Complex64, IssueSeverity, KernelConfig, KernelModel, KernelSpectrum, LatticeOrder,
    LatticePointStream, NumericIssue, ObjectiveKind, ObjectiveValue,
};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::backend::{ComputeBackend, CpuBackend};
use crate::config::{BayesLatticeConfig, ErrorBoundMode};
use crate::distribution::{DistributionKind, GeneratorBackend, LatticeSource};
use crate::error::{CubatureError, ParameterIssue, Result};
use crate::integrand::{Integrand, Periodized};
use crate::result::IntegrationResult;
use crate::state::{BatchUpdate, BayesIteration, IntegrationState, IterationDetail};

use super::shape_search::{search_shape, ShapeObjective, ShapeSearch};
use super::{
    check_distribution, stop_at_iteration_limit, stop_converged, stop_over_budget,
    two_sided_normal_quantile, StoppingCriterion,
};

const NAME: &str = "BayesianLatticeCriterion";
const ALLOWED: &[DistributionKind] = &[DistributionKind::Lattice];

/// Posterior summary at one lattice size.
#[derive(Debug, Clone, Copy)]
struct Posterior {
    muhat: f64,
    error_bound: f64,
    dsc: f64,
}

/// Adaptive Bayesian cubature on a rank-1 lattice.
pub struct BayesianLatticeCriterion<I, D> {
    integrand: Periodized<I>,
    distribution: D,
    config: BayesLatticeConfig,
    model: KernelModel,
    search_model: KernelModel,
    uncertainty: f64,
    backend: Box<dyn ComputeBackend>,
}

impl<I: Integrand, D: LatticeSource> BayesianLatticeCriterion<I, D> {
    /// Create a criterion.
    ///
    /// The distribution must be a randomized lattice built on the GAIL
    /// generator, and its dimension must match the integrand's.
    pub fn new(integrand: I, distribution: D, config: BayesLatticeConfig) -> Result<Self> {
        config.validate()?;
        check_distribution(NAME, ALLOWED, distribution.kind())?;
        if !distribution.randomize() {
            return Err(ParameterIssue::NotRandomized.into());
        }
        if distribution.backend() != GeneratorBackend::Gail {
            return Err(ParameterIssue::UnsupportedBackend.into());
        }
        if integrand.dimension() != distribution.dimension() {
            return Err(CubatureError::Dimension {
                expected: integrand.dimension(),
                found: distribution.dimension(),
            });
        }

        let uncertainty = match config.mode {
            ErrorBoundMode::FullBayes => {
                let dof = (config.n_init - 1) as f64;
                let t = StudentsT::new(0.0, 1.0, dof).map_err(|_| ParameterIssue::OutOfRange {
                    name: "n_init",
                    value: config.n_init as f64,
                })?;
                -t.inverse_cdf(config.alpha / 2.0)
            }
            ErrorBoundMode::EmpiricalBayes | ErrorBoundMode::Gcv => {
                two_sided_normal_quantile(config.alpha)
            }
        };

        let model = KernelModel::new(config.kernel);
        let search_model = KernelModel::new(KernelConfig {
            debug: false,
            ..config.kernel
        });
        let integrand = Periodized::new(integrand, config.transform);

        Ok(Self {
            integrand,
            distribution,
            config,
            model,
            search_model,
            uncertainty,
            backend: Box::new(CpuBackend),
        })
    }

    /// Builder method to route values through a different compute backend.
    pub fn with_backend(mut self, backend: Box<dyn ComputeBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &BayesLatticeConfig {
        &self.config
    }

    fn objective_kind(&self) -> ObjectiveKind {
        match self.config.mode {
            ErrorBoundMode::Gcv => ObjectiveKind::Gcv,
            ErrorBoundMode::EmpiricalBayes | ErrorBoundMode::FullBayes => ObjectiveKind::Mle,
        }
    }

    fn posterior(
        &self,
        spectrum: &KernelSpectrum,
        value: &ObjectiveValue,
        ftilde: &[Complex64],
    ) -> Posterior {
        let n = ftilde.len() as f64;
        let ring0 = spectrum.lambda_ring_zero();
        let lambda0 = spectrum.lambda[0];
        let avoid = self.config.kernel.avoid_cancellation;

        let muhat = if self.config.arbitrary_mean {
            ftilde[0].re / n
        } else {
            ftilde[0].re / lambda0
        };

        let (dsc, denominator) = match self.config.mode {
            ErrorBoundMode::EmpiricalBayes => {
                let dsc = if avoid {
                    (ring0 / (n + ring0)).abs()
                } else {
                    (1.0 - n / lambda0).abs()
                };
                (dsc, n)
            }
            ErrorBoundMode::Gcv => {
                let dsc = if avoid {
                    (ring0 / (n + ring0)).abs()
                } else {
                    (1.0 - n / lambda0).abs()
                };
                let trace: f64 = spectrum
                    .lambda
                    .iter()
                    .enumerate()
                    .map(|(k, &l)| if k == 0 { n + ring0 } else { l })
                    .filter(|&l| l != 0.0)
                    .map(|l| 1.0 / l)
                    .sum();
                (dsc, trace)
            }
            ErrorBoundMode::FullBayes => {
                let dsc = if avoid {
                    (ring0 / n).abs()
                } else {
                    (lambda0 / n - 1.0).abs()
                };
                (dsc, n - 1.0)
            }
        };

        let error_bound = self.uncertainty * (dsc * value.rkhs_norm / denominator).sqrt();
        Posterior {
            muhat,
            error_bound,
            dsc,
        }
    }

    fn report_issues(&self, m: u32, issues: &[NumericIssue]) {
        for issue in issues {
            match issue.severity {
                IssueSeverity::Advisory => {
                    tracing::warn!("{}: m = {}: {}", NAME, m, issue)
                }
                IssueSeverity::InvariantViolation => {
                    tracing::error!("{}: m = {}: {}", NAME, m, issue)
                }
            }
        }
    }
}

impl<I: Integrand, D: LatticeSource> StoppingCriterion for BayesianLatticeCriterion<I, D> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn allowed_distributions(&self) -> &'static [DistributionKind] {
        ALLOWED
    }

    fn integrate(&mut self) -> IntegrationResult {
        let m_min = self.config.m_min();
        let m_max = self.config.m_max();
        let order = self.distribution.order();
        let shift = self.distribution.draw_shift();
        let mut stream =
            LatticePointStream::new(self.distribution.generator(), shift, order, m_min);
        let mut state = IntegrationState::new(1, self.config.n_init, self.config.history_capacity);
        let kind = self.objective_kind();
        let arbitrary_mean = self.config.arbitrary_mean;
        let (lower, upper) = self.config.kernel.family.shape_search_range();
        let mut ftilde: Vec<Complex64> = Vec::new();
        let mut met = false;

        tracing::debug!(
            "{}: m from {} to {}, {:?} order, {:?} mode, {} backend",
            NAME,
            m_min,
            m_max,
            order,
            self.config.mode,
            self.backend.name()
        );

        for _ in m_min..=m_max {
            if state.history_full() {
                return stop_at_iteration_limit(NAME, state);
            }

            let batch = stream.advance();
            let m = batch.m;
            let values = self.backend.upload(self.integrand.evaluate(&batch.points));
            let transformed = match order {
                LatticeOrder::Natural => fft_real(&values),
                LatticeOrder::VanDerCorput => fft_real_bit_reversed(&values),
            };
            ftilde = if batch.is_first {
                transformed
            } else {
                merge_fft(mem::take(&mut ftilde), transformed)
            };

            let unshifted = stream.unshifted();
            let search = match search_shape(
                ShapeObjective {
                    model: &self.search_model,
                    points: unshifted,
                    ftilde: &ftilde,
                    kind,
                    arbitrary_mean,
                },
                lower,
                upper,
            ) {
                Ok(search) => search,
                Err(err) => {
                    tracing::warn!(
                        "{}: m = {}: shape search failed ({}), using the range midpoint",
                        NAME,
                        m,
                        err
                    );
                    ShapeSearch {
                        ln_shape: 0.5 * (lower + upper),
                        loss: f64::NAN,
                        iterations: 0,
                        converged: false,
                    }
                }
            };
            if !search.converged {
                tracing::warn!(
                    "{}: m = {}: shape search stopped after {} iterations without converging",
                    NAME,
                    m,
                    search.iterations
                );
            }

            let shape = search.ln_shape.exp();
            let spectrum = self.model.spectrum(unshifted, shape);
            let value = objective(kind, arbitrary_mean, &spectrum, &ftilde);
            let posterior = self.posterior(&spectrum, &value, &ftilde);
            let muhat = self.backend.gather(posterior.muhat);
            let error_bound = self.backend.gather(posterior.error_bound);

            let issues = if self.config.kernel.debug {
                let mut issues = spectrum.issues();
                check_complex_finite("ftilde", &ftilde, &mut issues);
                self.report_issues(m, &issues);
                issues
            } else {
                Vec::new()
            };

            let n = ftilde.len() as f64;
            tracing::debug!(
                "{}: m = {}, shape = {:.4}, muhat = {:.6}, error bound = {:.3e}",
                NAME,
                m,
                shape,
                muhat,
                error_bound
            );

            state.update(BatchUpdate {
                samples: batch.points.n() as u64,
                solution: muhat,
                components: vec![muhat],
                error_bound,
                confidence_interval: (muhat - error_bound, muhat + error_bound),
                detail: IterationDetail::BayesLattice(BayesIteration {
                    m,
                    shape,
                    loss: value.loss,
                    rkhs_norm: value.rkhs_norm,
                    dsc_sqrt: posterior.dsc.sqrt(),
                    scale: (value.rkhs_norm / n).sqrt(),
                    search_iterations: search.iterations,
                    issues,
                }),
            });

            met = self.config.tolerance.is_met(muhat, error_bound);
            if met && error_bound == 0.0 {
                state.set_error_bound(f64::EPSILON);
            }
            if met && self.config.stop_at_tolerance {
                return stop_converged(NAME, state);
            }
        }

        if met {
            return stop_converged(NAME, state);
        }
        let requested = 1u64 << (m_max + 1);
        stop_over_budget(NAME, state, requested, self.config.n_max)
    }
}
