//! Mutable record of one integration run.
//!
//! A criterion owns exactly one [`IntegrationState`] per `integrate()` call.
//! The state only moves forward: sample totals grow by non-negative
//! increments and the history is append-only, one record per iteration.

use std::time::{Duration, Instant};

use cubature_core::NumericIssue;
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Constructed, nothing sampled yet.
    Init,
    /// At least one iteration absorbed.
    Sampling,
    /// Tolerance met.
    Converged,
    /// Stopped before the tolerance was met.
    MaxSamplesReached,
}

impl Stage {
    /// True once the run is sealed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Converged | Stage::MaxSamplesReached)
    }
}

// ============================================================================
// Per-criterion iteration details
// ============================================================================

/// Statistics of one integrand's replicated streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStatistics {
    /// Mean of the stream means.
    pub mean: f64,
    /// Stream means of the latest evaluation.
    pub stream_means: Vec<f64>,
    /// Population standard deviation of the stream means.
    pub std_dev: f64,
    /// Samples per stream used for the latest estimate.
    pub samples_per_stream: u64,
    /// Samples per stream for the next evaluation.
    pub next_samples_per_stream: u64,
    /// True once the spread is within tolerance.
    pub converged: bool,
}

impl StreamStatistics {
    /// Statistics before any stream has been evaluated.
    pub fn pending(n_init: u64) -> Self {
        Self {
            mean: 0.0,
            stream_means: Vec::new(),
            std_dev: f64::INFINITY,
            samples_per_stream: 0,
            next_samples_per_stream: n_init,
            converged: false,
        }
    }
}

/// One level of a multi-level estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Level index `l`.
    pub index: usize,
    /// Points per replication evaluated so far.
    pub samples: u64,
    /// Mean of the replication means.
    pub mean: f64,
    /// Variance of the level estimate (replication variance over `R`).
    pub variance: f64,
    /// Cost of one sample.
    pub cost: f64,
    /// `variance / (cost · samples)`.
    pub cost_normalised_variance: f64,
    /// Flagged for evaluation in the next update.
    pub needs_samples: bool,
}

impl Level {
    /// A level that has not been evaluated yet.
    pub fn new(index: usize, cost: f64) -> Self {
        Self {
            index,
            samples: 0,
            mean: 0.0,
            variance: 0.0,
            cost,
            cost_normalised_variance: 0.0,
            needs_samples: true,
        }
    }
}

/// Decision taken by the multi-level criterion after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelAction {
    /// Double the samples on this level.
    Double {
        /// Level index.
        level: usize,
    },
    /// Append a finer level.
    AddLevel {
        /// Index of the new level.
        level: usize,
    },
    /// Variance and bias are both within tolerance.
    Converge,
}

/// Diagnostics of one Bayesian lattice iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BayesIteration {
    /// Resolution exponent (`n = 2^m`).
    pub m: u32,
    /// Selected kernel shape parameter.
    pub shape: f64,
    /// Objective value at the selected shape.
    pub loss: f64,
    /// RKHS norm estimate.
    pub rkhs_norm: f64,
    /// Square root of the discrepancy term.
    pub dsc_sqrt: f64,
    /// `sqrt(rkhs_norm / n)`.
    pub scale: f64,
    /// Solver iterations spent in the shape search.
    pub search_iterations: u64,
    /// Numeric problems detected in this iteration.
    pub issues: Vec<NumericIssue>,
}

/// Diagnostics of one multi-level iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLevelIteration {
    /// Levels after the update.
    pub levels: Vec<Level>,
    /// Bias estimate from the finest levels.
    pub bias: f64,
    /// Sum of level variances.
    pub variance: f64,
    /// Decision taken.
    pub action: LevelAction,
}

/// Criterion-specific part of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IterationDetail {
    /// Replicated streams, one entry per integrand.
    Replication(Vec<StreamStatistics>),
    /// Bayesian lattice.
    BayesLattice(BayesIteration),
    /// Multi-level.
    MultiLevel(MultiLevelIteration),
}

// ============================================================================
// History
// ============================================================================

/// Immutable record of one outer iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRecord {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// Cumulative samples after this iteration.
    pub total_samples: u64,
    /// Estimate after this iteration.
    pub solution: f64,
    /// Error bound after this iteration.
    pub error_bound: f64,
    /// Wall time since the run started.
    pub elapsed: Duration,
    /// Criterion-specific diagnostics.
    pub detail: IterationDetail,
}

/// Append-only, bounded list of iteration records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticLog {
    records: Vec<DiagnosticRecord>,
    capacity: usize,
}

impl DiagnosticLog {
    /// Create an empty log holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Append a record. Returns false, dropping the record, if the log is full.
    pub fn push(&mut self, record: DiagnosticRecord) -> bool {
        if self.is_full() {
            return false;
        }
        self.records.push(record);
        true
    }

    /// True if no more records fit.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Maximum number of records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no record has been appended.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&DiagnosticRecord> {
        self.records.last()
    }

    /// All records in iteration order.
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    /// Iterate over records.
    pub fn iter(&self) -> std::slice::Iter<'_, DiagnosticRecord> {
        self.records.iter()
    }
}

// ============================================================================
// State
// ============================================================================

/// Everything one iteration contributes to the run.
#[derive(Debug, Clone)]
pub struct BatchUpdate {
    /// New samples drawn in this iteration (an increment, never a total).
    pub samples: u64,
    /// Updated aggregate estimate.
    pub solution: f64,
    /// Updated per-integrand or per-level estimates.
    pub components: Vec<f64>,
    /// Updated error bound.
    pub error_bound: f64,
    /// Updated confidence interval.
    pub confidence_interval: (f64, f64),
    /// Criterion-specific diagnostics.
    pub detail: IterationDetail,
}

/// Read-only view used by stop tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    /// Iterations absorbed so far.
    pub iterations: usize,
    /// Current estimate.
    pub solution: f64,
    /// Current error bound.
    pub error_bound: f64,
    /// Current confidence interval.
    pub confidence_interval: (f64, f64),
    /// Cumulative samples.
    pub total_samples: u64,
    /// Initial sample count of the run.
    pub n_init: u64,
    /// Current stage.
    pub stage: Stage,
}

/// Mutable record of one run.
#[derive(Debug, Clone)]
pub struct IntegrationState {
    solution: f64,
    components: Vec<f64>,
    error_bound: f64,
    confidence_interval: (f64, f64),
    total_samples: u64,
    n_init: u64,
    started: Instant,
    elapsed: Duration,
    stage: Stage,
    history: DiagnosticLog,
}

impl IntegrationState {
    /// Create a state for `components` integrands or levels.
    pub fn new(components: usize, n_init: u64, history_capacity: usize) -> Self {
        Self {
            solution: f64::NAN,
            components: vec![f64::NAN; components],
            error_bound: f64::INFINITY,
            confidence_interval: (f64::NEG_INFINITY, f64::INFINITY),
            total_samples: 0,
            n_init,
            started: Instant::now(),
            elapsed: Duration::ZERO,
            stage: Stage::Init,
            history: DiagnosticLog::new(history_capacity),
        }
    }

    /// Absorb one iteration and append its record.
    ///
    /// Returns false if the history was already full; the estimate is still
    /// updated but no record is kept. Criteria check
    /// [`history_full`](Self::history_full) before sampling, so this does not
    /// happen in practice.
    pub fn update(&mut self, update: BatchUpdate) -> bool {
        debug_assert!(!self.stage.is_terminal(), "update after finish");
        debug_assert!(update.error_bound >= 0.0 || update.error_bound.is_nan());

        self.total_samples = self.total_samples.saturating_add(update.samples);
        self.solution = update.solution;
        self.components = update.components;
        self.error_bound = update.error_bound;
        self.confidence_interval = update.confidence_interval;
        self.elapsed = self.started.elapsed();
        self.stage = Stage::Sampling;

        let record = DiagnosticRecord {
            iteration: self.history.len(),
            total_samples: self.total_samples,
            solution: self.solution,
            error_bound: self.error_bound,
            elapsed: self.elapsed,
            detail: update.detail,
        };
        self.history.push(record)
    }

    /// Replace the latest error bound without adding samples.
    ///
    /// Used to record machine epsilon in place of an exactly zero bound.
    pub fn set_error_bound(&mut self, error_bound: f64) {
        self.error_bound = error_bound;
        if let Some(last) = self.history.records.last_mut() {
            last.error_bound = error_bound;
        }
    }

    /// Seal the run.
    pub fn finish(&mut self, stage: Stage) {
        debug_assert!(stage.is_terminal(), "finish requires a terminal stage");
        self.elapsed = self.started.elapsed();
        self.stage = stage;
    }

    /// Read-only view of the current estimate.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            iterations: self.history.len(),
            solution: self.solution,
            error_bound: self.error_bound,
            confidence_interval: self.confidence_interval,
            total_samples: self.total_samples,
            n_init: self.n_init,
            stage: self.stage,
        }
    }

    /// True if another iteration would not fit in the history.
    pub fn history_full(&self) -> bool {
        self.history.is_full()
    }

    /// Cumulative samples.
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current aggregate estimate.
    pub fn solution(&self) -> f64 {
        self.solution
    }

    /// Current per-component estimates.
    pub fn components(&self) -> &[f64] {
        &self.components
    }

    /// Current error bound.
    pub fn error_bound(&self) -> f64 {
        self.error_bound
    }

    /// Current confidence interval.
    pub fn confidence_interval(&self) -> (f64, f64) {
        self.confidence_interval
    }

    /// Elapsed wall time at the last update or finish.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Iteration history.
    pub fn history(&self) -> &DiagnosticLog {
        &self.history
    }

    /// Consume the state and return its history.
    pub fn into_history(self) -> DiagnosticLog {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(samples: u64, solution: f64) -> BatchUpdate {
        BatchUpdate {
            samples,
            solution,
            components: vec![solution],
            error_bound: 0.1,
            confidence_interval: (solution - 0.1, solution + 0.1),
            detail: IterationDetail::Replication(Vec::new()),
        }
    }

    #[test]
    fn totals_accumulate_increments() {
        let mut state = IntegrationState::new(1, 8, 10);
        assert_eq!(state.stage(), Stage::Init);
        assert!(state.update(update(8, 1.0)));
        assert!(state.update(update(8, 1.5)));
        assert_eq!(state.total_samples(), 16);
        assert_eq!(state.stage(), Stage::Sampling);
        let totals: Vec<u64> = state.history().iter().map(|r| r.total_samples).collect();
        assert_eq!(totals, vec![8, 16]);
        assert_eq!(state.history().last().map(|r| r.iteration), Some(1));
    }

    #[test]
    fn history_is_bounded() {
        let mut state = IntegrationState::new(1, 1, 2);
        assert!(state.update(update(1, 0.0)));
        assert!(!state.history_full());
        assert!(state.update(update(1, 0.0)));
        assert!(state.history_full());
        assert!(!state.update(update(1, 0.0)));
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.total_samples(), 3);
    }

    #[test]
    fn snapshot_reflects_latest_update() {
        let mut state = IntegrationState::new(2, 4, 4);
        state.update(update(4, 2.0));
        state.set_error_bound(f64::EPSILON);
        state.finish(Stage::Converged);
        let snap = state.snapshot();
        assert_eq!(snap.solution, 2.0);
        assert_eq!(snap.error_bound, f64::EPSILON);
        assert_eq!(snap.stage, Stage::Converged);
        assert_eq!(snap.iterations, 1);
        assert_eq!(state.history().records()[0].error_bound, f64::EPSILON);
    }
}
