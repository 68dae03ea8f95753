//! Outcome of an integration run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::{DiagnosticLog, IntegrationState, Stage};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The error tolerance was met.
    Converged,

    /// The next iteration would exceed the sample budget.
    ///
    /// The estimate is the best available, but the tolerance may not hold.
    MaxSamples {
        /// Cumulative samples the next iteration would have required.
        requested: u64,
        /// Configured budget.
        n_max: u64,
    },

    /// The diagnostic history reached its capacity.
    IterationLimit {
        /// Configured history capacity.
        capacity: usize,
    },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Converged => write!(f, "error tolerance met"),
            StopReason::MaxSamples { requested, n_max } => write!(
                f,
                "continuing would need {} samples, exceeding n_max = {}; tolerance may not be met",
                requested, n_max
            ),
            StopReason::IterationLimit { capacity } => write!(
                f,
                "history capacity of {} iterations reached; tolerance may not be met",
                capacity
            ),
        }
    }
}

/// Final estimate and diagnostics of one `integrate()` call.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationResult {
    /// Estimate of the integral.
    pub solution: f64,
    /// Per-integrand or per-level estimates.
    pub components: Vec<f64>,
    /// Error bound at the stated confidence.
    pub error_bound: f64,
    /// Confidence interval around the estimate.
    pub confidence_interval: (f64, f64),
    /// Cumulative samples drawn.
    pub total_samples: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
    /// Final stage.
    pub stage: Stage,
    /// Why the run stopped.
    pub stop_reason: StopReason,
    /// One record per iteration.
    pub history: DiagnosticLog,
}

impl IntegrationResult {
    /// Build a result from a sealed state.
    pub fn from_state(state: IntegrationState, stop_reason: StopReason) -> Self {
        let snapshot = state.snapshot();
        let components = state.components().to_vec();
        let elapsed = state.elapsed();
        Self {
            solution: snapshot.solution,
            components,
            error_bound: snapshot.error_bound,
            confidence_interval: snapshot.confidence_interval,
            total_samples: snapshot.total_samples,
            elapsed,
            stage: snapshot.stage,
            stop_reason,
            history: state.into_history(),
        }
    }

    /// True if the tolerance was met.
    pub fn is_converged(&self) -> bool {
        self.stage == Stage::Converged
    }
}
