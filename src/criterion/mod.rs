//! Adaptive stopping criteria.
//!
//! Each criterion owns its integrand, its point source and a validated
//! configuration. [`StoppingCriterion::integrate`] runs the adaptive loop
//! to completion and returns an [`IntegrationResult`]; construction is the
//! only fallible step.

pub mod bayes_lattice;
pub mod multilevel;
pub mod replication;
mod shape_search;

use statrs::distribution::{ContinuousCDF, Normal};

use crate::distribution::DistributionKind;
use crate::error::{CubatureError, Result};
use crate::result::{IntegrationResult, StopReason};
use crate::state::{IntegrationState, Stage};

pub use bayes_lattice::BayesianLatticeCriterion;
pub use multilevel::{MultiLevelCriterion, MultiLevelData};
pub use replication::ReplicationVarianceCriterion;

/// An adaptive algorithm that decides how many samples suffice.
pub trait StoppingCriterion {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Distribution kinds this criterion accepts.
    fn allowed_distributions(&self) -> &'static [DistributionKind];

    /// Run the adaptive loop until the tolerance is met or a budget is hit.
    fn integrate(&mut self) -> IntegrationResult;
}

/// Reject distributions outside `allowed`.
pub(crate) fn check_distribution(
    criterion: &'static str,
    allowed: &'static [DistributionKind],
    found: DistributionKind,
) -> Result<()> {
    if allowed.contains(&found) {
        Ok(())
    } else {
        Err(CubatureError::DistributionCompatibility {
            criterion,
            found,
            allowed,
        })
    }
}

/// Two-sided standard normal quantile `−Φ⁻¹(α/2)`.
pub(crate) fn two_sided_normal_quantile(alpha: f64) -> f64 {
    -Normal::standard().inverse_cdf(alpha / 2.0)
}

/// Seal a run that would exceed its sample budget.
pub(crate) fn stop_over_budget(
    criterion: &'static str,
    mut state: IntegrationState,
    requested: u64,
    n_max: u64,
) -> IntegrationResult {
    tracing::warn!(
        "{}: already used {} samples; continuing needs {} which exceeds n_max = {}, stopping",
        criterion,
        state.total_samples(),
        requested,
        n_max
    );
    state.finish(Stage::MaxSamplesReached);
    IntegrationResult::from_state(state, StopReason::MaxSamples { requested, n_max })
}

/// Seal a run whose history is full.
pub(crate) fn stop_at_iteration_limit(
    criterion: &'static str,
    mut state: IntegrationState,
) -> IntegrationResult {
    let capacity = state.history().capacity();
    tracing::warn!(
        "{}: history capacity of {} iterations reached, stopping",
        criterion,
        capacity
    );
    state.finish(Stage::MaxSamplesReached);
    IntegrationResult::from_state(state, StopReason::IterationLimit { capacity })
}

/// Seal a converged run.
pub(crate) fn stop_converged(criterion: &'static str, mut state: IntegrationState) -> IntegrationResult {
    tracing::debug!(
        "{}: converged with {} samples, solution {:.6}, error bound {:.3e}",
        criterion,
        state.total_samples(),
        state.solution(),
        state.error_bound()
    );
    state.finish(Stage::Converged);
    IntegrationResult::from_state(state, StopReason::Converged)
}
