//! Replicated randomized QMC with a spread-of-means stop test.
//!
//! Each integrand is estimated by `J` independently randomized point sets.
//! The spread of the `J` stream means estimates the error; an integrand whose
//! spread is still above tolerance doubles its sample count and is
//! re-evaluated on fresh streams, while converged integrands are left alone.

use cubature_core::statistics::{mean, population_std};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::ReplicationConfig;
use crate::distribution::{DiscreteDistribution, DistributionKind};
use crate::error::{CubatureError, ParameterIssue, Result};
use crate::integrand::Integrand;
use crate::result::IntegrationResult;
use crate::state::{BatchUpdate, IntegrationState, IterationDetail, StreamStatistics};

use super::{
    check_distribution, stop_at_iteration_limit, stop_converged, stop_over_budget,
    two_sided_normal_quantile, StoppingCriterion,
};

const NAME: &str = "ReplicationVarianceCriterion";
const ALLOWED: &[DistributionKind] = &[DistributionKind::Lattice, DistributionKind::Sobol];

/// Adaptive replicated-QMC criterion for one or more integrands.
///
/// The reported solution is the sum of the per-integrand estimates.
pub struct ReplicationVarianceCriterion<D> {
    distribution: D,
    integrands: Vec<Box<dyn Integrand>>,
    config: ReplicationConfig,
}

impl<D: DiscreteDistribution> ReplicationVarianceCriterion<D> {
    /// Create a criterion.
    ///
    /// Fails if the configuration is invalid, the distribution is not a
    /// randomized lattice or digital net, or any integrand's dimension differs
    /// from the distribution's.
    pub fn new(
        distribution: D,
        integrands: Vec<Box<dyn Integrand>>,
        config: ReplicationConfig,
    ) -> Result<Self> {
        config.validate()?;
        check_distribution(NAME, ALLOWED, distribution.kind())?;
        if !distribution.randomize() {
            return Err(ParameterIssue::NotRandomized.into());
        }
        if integrands.is_empty() {
            return Err(ParameterIssue::TooSmall {
                name: "integrands",
                value: 0,
                minimum: 1,
            }
            .into());
        }
        let dimension = distribution.dimension();
        if let Some(bad) = integrands.iter().find(|g| g.dimension() != dimension) {
            return Err(CubatureError::Dimension {
                expected: bad.dimension(),
                found: dimension,
            });
        }
        Ok(Self {
            distribution,
            integrands,
            config,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Stream means of `integrand` over `replications` fresh point sets.
    fn stream_means(&mut self, index: usize, n: u64) -> Vec<f64> {
        let sets = self
            .distribution
            .generate(self.config.replications, n as usize);
        let integrand = &self.integrands[index];

        #[cfg(feature = "parallel")]
        let means = sets
            .par_iter()
            .map(|points| mean(&integrand.evaluate(points)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let means = sets
            .iter()
            .map(|points| mean(&integrand.evaluate(points)))
            .collect();

        means
    }

    fn error_bound(&self, stats: &[StreamStatistics], quantile: f64) -> f64 {
        let spread: f64 = stats
            .iter()
            .filter(|s| s.samples_per_stream > 0)
            .map(|s| s.std_dev * s.std_dev / s.samples_per_stream as f64)
            .sum();
        quantile * self.config.inflate * spread.sqrt()
    }
}

impl<D: DiscreteDistribution> StoppingCriterion for ReplicationVarianceCriterion<D> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn allowed_distributions(&self) -> &'static [DistributionKind] {
        ALLOWED
    }

    fn integrate(&mut self) -> IntegrationResult {
        let replications = self.config.replications as u64;
        let quantile = two_sided_normal_quantile(self.config.alpha);
        let mut state = IntegrationState::new(
            self.integrands.len(),
            self.config.n_init,
            self.config.history_capacity,
        );
        let mut stats: Vec<StreamStatistics> = (0..self.integrands.len())
            .map(|_| StreamStatistics::pending(self.config.n_init))
            .collect();

        tracing::debug!(
            "{}: {} integrand(s), {} streams of {} initial samples, n_max = {}",
            NAME,
            self.integrands.len(),
            replications,
            self.config.n_init,
            self.config.n_max
        );

        loop {
            if state.history_full() {
                return stop_at_iteration_limit(NAME, state);
            }

            let active: Vec<usize> = (0..stats.len()).filter(|&i| !stats[i].converged).collect();
            let increment: u64 = active
                .iter()
                .map(|&i| replications.saturating_mul(stats[i].next_samples_per_stream))
                .sum();
            let projected = state.total_samples().saturating_add(increment);
            if projected > self.config.n_max {
                return stop_over_budget(NAME, state, projected, self.config.n_max);
            }

            for &i in &active {
                let n = stats[i].next_samples_per_stream;
                let means = self.stream_means(i, n);
                let mu = mean(&means);
                let sighat = population_std(&means);
                let converged = sighat < self.config.tolerance.target(mu);
                let s = &mut stats[i];
                s.mean = mu;
                s.std_dev = sighat;
                s.stream_means = means;
                s.samples_per_stream = n;
                s.converged = converged;
                s.next_samples_per_stream = if converged { n } else { n.saturating_mul(2) };

                tracing::debug!(
                    "{}: integrand {} with {} samples per stream: mean {:.6}, spread {:.3e}{}",
                    NAME,
                    i,
                    n,
                    mu,
                    sighat,
                    if converged { " (converged)" } else { "" }
                );
            }

            let components: Vec<f64> = stats.iter().map(|s| s.mean).collect();
            let solution: f64 = components.iter().sum();
            let error_bound = self.error_bound(&stats, quantile);
            state.update(BatchUpdate {
                samples: increment,
                solution,
                components,
                error_bound,
                confidence_interval: (solution - error_bound, solution + error_bound),
                detail: IterationDetail::Replication(stats.clone()),
            });

            if stats.iter().all(|s| s.converged) {
                return stop_converged(NAME, state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{IidStdUniform, Lattice};
    use crate::integrand::{CustomIntegrand, Linear};
    use crate::result::StopReason;
    use crate::state::Stage;
    use cubature_core::Points;

    fn linear(d: usize) -> Vec<Box<dyn Integrand>> {
        vec![Box::new(Linear::measured(d))]
    }

    #[test]
    fn rejects_iid_points() {
        let err = ReplicationVarianceCriterion::new(
            IidStdUniform::new(2),
            linear(2),
            ReplicationConfig::default(),
        )
        .err();
        assert!(matches!(
            err,
            Some(CubatureError::DistributionCompatibility { .. })
        ));
    }

    #[test]
    fn rejects_unrandomized_lattice() {
        let err = ReplicationVarianceCriterion::new(
            Lattice::new(2).randomized(false),
            linear(2),
            ReplicationConfig::default(),
        )
        .err();
        assert_eq!(err, Some(ParameterIssue::NotRandomized.into()));
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let err = ReplicationVarianceCriterion::new(
            Lattice::new(3),
            linear(2),
            ReplicationConfig::default(),
        )
        .err();
        assert!(matches!(err, Some(CubatureError::Dimension { .. })));
    }

    #[test]
    fn constant_integrand_converges_in_one_iteration() {
        let constant = CustomIntegrand::new(2, |x: &Points| vec![3.0; x.n()]);
        let mut criterion = ReplicationVarianceCriterion::new(
            Lattice::new(2).seed(1),
            vec![Box::new(constant)],
            ReplicationConfig::default().n_init(16).replications(4),
        )
        .unwrap();
        let result = criterion.integrate();
        assert_eq!(result.stop_reason, StopReason::Converged);
        assert_eq!(result.solution, 3.0);
        assert_eq!(result.total_samples, 64);
        assert_eq!(result.history.len(), 1);
    }

    #[test]
    fn linear_sum_of_two_integrands() {
        let mut criterion = ReplicationVarianceCriterion::new(
            Lattice::new(2).seed(7),
            vec![Box::new(Linear::measured(2)), Box::new(Linear::measured(2))],
            ReplicationConfig::default().abs_tol(1e-3),
        )
        .unwrap();
        let result = criterion.integrate();
        assert!(result.is_converged());
        assert_eq!(result.components.len(), 2);
        assert!((result.solution - 2.0).abs() < 1e-2);
        let (lo, hi) = result.confidence_interval;
        assert!(lo <= result.solution && result.solution <= hi);
    }

    #[test]
    fn budget_stops_softly() {
        let curved = CustomIntegrand::new(1, |x: &Points| {
            x.rows().map(|r| 100.0 * r[0] * r[0]).collect()
        });
        let config = ReplicationConfig::default()
            .abs_tol(1e-9)
            .n_init(8)
            .replications(4)
            .n_max(200);
        let mut criterion =
            ReplicationVarianceCriterion::new(Lattice::new(1).seed(3), vec![Box::new(curved)], config)
                .unwrap();
        let result = criterion.integrate();
        assert_eq!(result.stage, Stage::MaxSamplesReached);
        assert!(result.total_samples <= 200);
        assert!(matches!(result.stop_reason, StopReason::MaxSamples { n_max: 200, .. }));
        assert!(result.error_bound.is_finite());
    }
}
