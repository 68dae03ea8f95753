//! Multi-level randomized QMC.
//!
//! The target `E[P_L]` is written as the telescoping sum `Σ_l E[Y_l]` of level
//! differences. Each level is estimated by `R` randomized replications of an
//! extensible lattice. After every update the criterion either doubles the
//! samples on the level with the largest variance per unit cost, appends a
//! finer level when the bias estimate is too large, or stops.

use cubature_core::statistics::{mean, population_variance};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::MultiLevelConfig;
use crate::distribution::{DistributionKind, ExtensibleSequence};
use crate::error::{ParameterIssue, Result};
use crate::integrand::MultiLevelIntegrand;
use crate::result::IntegrationResult;
use crate::state::{
    BatchUpdate, IntegrationState, IterationDetail, Level, LevelAction, MultiLevelIteration,
};

use super::{
    check_distribution, stop_at_iteration_limit, stop_converged, stop_over_budget,
    two_sided_normal_quantile, StoppingCriterion,
};

const NAME: &str = "MultiLevelCriterion";
const ALLOWED: &[DistributionKind] = &[DistributionKind::Lattice, DistributionKind::Sobol];

// ============================================================================
// Level bookkeeping
// ============================================================================

/// Per-level sums and statistics of a multi-level run.
///
/// Replication `r` of level `l` always reads points `0..n_l` of the same
/// randomized sequence, so doubling a level only evaluates the new half.
#[derive(Debug, Clone)]
pub struct MultiLevelData {
    levels: Vec<Level>,
    sums: Vec<Vec<f64>>,
    replications: usize,
    n_init: u64,
}

impl MultiLevelData {
    /// Bookkeeping for `levels_init` levels, all flagged for evaluation.
    pub fn new<I: MultiLevelIntegrand>(
        integrand: &I,
        levels_init: usize,
        replications: usize,
        n_init: u64,
    ) -> Self {
        let mut data = Self {
            levels: Vec::with_capacity(levels_init),
            sums: Vec::with_capacity(levels_init),
            replications,
            n_init,
        };
        for _ in 0..levels_init {
            data.add_level(integrand);
        }
        data
    }

    /// Evaluate every flagged level and refresh its statistics.
    ///
    /// New levels get `n_init` points per replication, doubled levels get
    /// their new half. Returns the number of samples drawn.
    pub fn update<I, D>(&mut self, integrand: &I, distribution: &D) -> u64
    where
        I: MultiLevelIntegrand,
        D: ExtensibleSequence,
    {
        let mut drawn = 0u64;
        for l in 0..self.levels.len() {
            if !self.levels[l].needs_samples {
                continue;
            }
            let start = self.levels[l].samples;
            let end = if start == 0 { self.n_init } else { 2 * start };
            let dimension = integrand.dimension_at(l);

            let level_sum = |r: usize| -> f64 {
                let points = distribution.extend(r, dimension, start, end);
                integrand.evaluate_level(l, &points).iter().sum()
            };

            #[cfg(feature = "parallel")]
            let new_sums: Vec<f64> = (0..self.replications)
                .into_par_iter()
                .map(level_sum)
                .collect();

            #[cfg(not(feature = "parallel"))]
            let new_sums: Vec<f64> = (0..self.replications).map(level_sum).collect();

            for (total, s) in self.sums[l].iter_mut().zip(new_sums) {
                *total += s;
            }
            drawn += self.replications as u64 * (end - start);

            let level = &mut self.levels[l];
            level.samples = end;
            level.needs_samples = false;
            let n = end as f64;
            let means: Vec<f64> = self.sums[l].iter().map(|s| s / n).collect();
            level.mean = mean(&means);
            level.variance = population_variance(&means) / self.replications as f64;
            level.cost_normalised_variance = level.variance / (level.cost * n);

            tracing::debug!(
                "{}: level {} with {} points per replication: mean {:.6}, variance {:.3e}",
                NAME,
                l,
                end,
                level.mean,
                level.variance
            );
        }
        drawn
    }

    /// Append a finer level, flagged for evaluation.
    pub fn add_level<I: MultiLevelIntegrand>(&mut self, integrand: &I) {
        let index = self.levels.len();
        self.levels.push(Level::new(index, integrand.cost_at(index)));
        self.sums.push(vec![0.0; self.replications]);
    }

    /// Flag `level` for doubling in the next update.
    pub fn double(&mut self, level: usize) {
        if let Some(l) = self.levels.get_mut(level) {
            l.needs_samples = true;
        }
    }

    /// Current levels.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// `R · Σ n_l`.
    pub fn n_total(&self) -> u64 {
        self.replications as u64 * self.levels.iter().map(|l| l.samples).sum::<u64>()
    }

    /// Sum of level means.
    pub fn solution(&self) -> f64 {
        self.levels.iter().map(|l| l.mean).sum()
    }

    /// Per-level means.
    pub fn means(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.mean).collect()
    }

    /// Sum of level variances.
    pub fn variance(&self) -> f64 {
        self.levels.iter().map(|l| l.variance).sum()
    }

    /// Bias estimate from the two finest levels.
    pub fn bias(&self) -> f64 {
        match self.levels.as_slice() {
            [] => 0.0,
            [only] => only.mean.abs(),
            [.., coarser, finest] => finest.mean.abs().max(coarser.mean.abs() / 2.0),
        }
    }

    /// Decide the next step for an RMSE target.
    pub fn next_action(&self, rmse_tol: f64) -> LevelAction {
        if self.variance() > rmse_tol * rmse_tol / 2.0 {
            let level = self
                .levels
                .iter()
                .max_by(|a, b| a.cost_normalised_variance.total_cmp(&b.cost_normalised_variance))
                .map_or(0, |l| l.index);
            LevelAction::Double { level }
        } else if self.bias() > rmse_tol / std::f64::consts::SQRT_2 {
            LevelAction::AddLevel {
                level: self.levels.len(),
            }
        } else {
            LevelAction::Converge
        }
    }

    /// Cumulative samples after carrying out `action`.
    pub fn projected_total(&self, action: LevelAction) -> u64 {
        let r = self.replications as u64;
        let extra = match action {
            LevelAction::Double { level } => {
                self.levels.get(level).map_or(0, |l| r.saturating_mul(l.samples))
            }
            LevelAction::AddLevel { .. } => r.saturating_mul(self.n_init),
            LevelAction::Converge => 0,
        };
        self.n_total().saturating_add(extra)
    }

    /// Carry out `action` so the next update draws the right samples.
    pub fn apply<I: MultiLevelIntegrand>(&mut self, integrand: &I, action: LevelAction) {
        match action {
            LevelAction::Double { level } => self.double(level),
            LevelAction::AddLevel { .. } => self.add_level(integrand),
            LevelAction::Converge => {}
        }
    }
}

// ============================================================================
// Criterion
// ============================================================================

/// Adaptive multi-level QMC criterion.
pub struct MultiLevelCriterion<I, D> {
    integrand: I,
    distribution: D,
    config: MultiLevelConfig,
    rmse_tol: f64,
    quantile: f64,
}

impl<I: MultiLevelIntegrand, D: ExtensibleSequence> MultiLevelCriterion<I, D> {
    /// Create a criterion.
    ///
    /// The distribution must be a randomized, extensible lattice or digital
    /// net.
    pub fn new(integrand: I, distribution: D, config: MultiLevelConfig) -> Result<Self> {
        config.validate()?;
        check_distribution(NAME, ALLOWED, distribution.kind())?;
        if !distribution.randomize() {
            return Err(ParameterIssue::NotRandomized.into());
        }
        let quantile = two_sided_normal_quantile(config.alpha);
        let rmse_tol = config.rmse_tol.unwrap_or(config.abs_tol / quantile);
        Ok(Self {
            integrand,
            distribution,
            config,
            rmse_tol,
            quantile,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &MultiLevelConfig {
        &self.config
    }

    /// RMSE target the level decisions use.
    pub fn rmse_tol(&self) -> f64 {
        self.rmse_tol
    }
}

impl<I: MultiLevelIntegrand, D: ExtensibleSequence> StoppingCriterion
    for MultiLevelCriterion<I, D>
{
    fn name(&self) -> &'static str {
        NAME
    }

    fn allowed_distributions(&self) -> &'static [DistributionKind] {
        ALLOWED
    }

    fn integrate(&mut self) -> IntegrationResult {
        let config = &self.config;
        let mut data = MultiLevelData::new(
            &self.integrand,
            config.levels_init,
            config.replications,
            config.n_init,
        );
        let mut state =
            IntegrationState::new(config.levels_init, config.n_init, config.history_capacity);

        let initial = (config.replications as u64)
            .saturating_mul(config.n_init)
            .saturating_mul(config.levels_init as u64);
        if initial > config.n_max {
            return stop_over_budget(NAME, state, initial, config.n_max);
        }

        tracing::debug!(
            "{}: {} initial levels, {} replications, rmse target {:.3e}",
            NAME,
            config.levels_init,
            config.replications,
            self.rmse_tol
        );

        loop {
            if state.history_full() {
                return stop_at_iteration_limit(NAME, state);
            }

            let drawn = data.update(&self.integrand, &self.distribution);
            let action = data.next_action(self.rmse_tol);
            let solution = data.solution();
            let variance = data.variance();
            let bias = data.bias();
            let error_bound = self.quantile * (variance + bias * bias).sqrt();

            tracing::debug!(
                "{}: {} levels, solution {:.6}, variance {:.3e}, bias {:.3e}, next {:?}",
                NAME,
                data.levels().len(),
                solution,
                variance,
                bias,
                action
            );

            state.update(BatchUpdate {
                samples: drawn,
                solution,
                components: data.means(),
                error_bound,
                confidence_interval: (solution - error_bound, solution + error_bound),
                detail: IterationDetail::MultiLevel(MultiLevelIteration {
                    levels: data.levels().to_vec(),
                    bias,
                    variance,
                    action,
                }),
            });

            if action == LevelAction::Converge {
                return stop_converged(NAME, state);
            }
            let projected = data.projected_total(action);
            if projected > config.n_max {
                return stop_over_budget(NAME, state, projected, config.n_max);
            }
            data.apply(&self.integrand, action);
        }
    }
}
