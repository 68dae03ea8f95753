//! Configuration for the stopping criteria.
//!
//! Each criterion has a plain config struct with documented defaults and
//! consuming builder methods. `validate()` runs when a criterion is
//! constructed, so a criterion never starts sampling with bad settings.

use cubature_core::{KernelConfig, PeriodizationTransform};
use serde::{Deserialize, Serialize};

use crate::error::ParameterIssue;

/// Default number of iteration records a run keeps.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Absolute and relative error tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Absolute error tolerance.
    pub abs_tol: f64,
    /// Relative error tolerance.
    pub rel_tol: f64,
}

impl Tolerance {
    /// Create a tolerance pair.
    pub fn new(abs_tol: f64, rel_tol: f64) -> Self {
        Self { abs_tol, rel_tol }
    }

    /// Largest admissible half-width for an estimate `mu`.
    pub fn target(&self, mu: f64) -> f64 {
        self.abs_tol.max(self.rel_tol * mu.abs())
    }

    /// Test `2·err ≤ tol(μ − err) + tol(μ + err)`.
    pub fn is_met(&self, mu: f64, err: f64) -> bool {
        2.0 * err <= self.target(mu - err) + self.target(mu + err)
    }

    fn validate(&self) -> Result<(), ParameterIssue> {
        let ok = self.abs_tol >= 0.0
            && self.rel_tol >= 0.0
            && (self.abs_tol > 0.0 || self.rel_tol > 0.0);
        if ok {
            Ok(())
        } else {
            Err(ParameterIssue::InvalidTolerance {
                abs_tol: self.abs_tol,
                rel_tol: self.rel_tol,
            })
        }
    }
}

fn validate_alpha(alpha: f64) -> Result<(), ParameterIssue> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(ParameterIssue::AlphaOutOfRange(alpha))
    }
}

fn validate_at_least(name: &'static str, value: u64, minimum: u64) -> Result<(), ParameterIssue> {
    if value >= minimum {
        Ok(())
    } else {
        Err(ParameterIssue::TooSmall {
            name,
            value,
            minimum,
        })
    }
}

fn validate_power_of_two(name: &'static str, value: u64) -> Result<(), ParameterIssue> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ParameterIssue::NotPowerOfTwo { name, value })
    }
}

fn validate_budget(n_init: u64, n_max: u64) -> Result<(), ParameterIssue> {
    if n_max >= n_init {
        Ok(())
    } else {
        Err(ParameterIssue::BudgetBelowInitial { n_init, n_max })
    }
}

// ============================================================================
// Replication variance
// ============================================================================

/// Configuration for [`ReplicationVarianceCriterion`](crate::ReplicationVarianceCriterion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Error tolerances. Default: `abs_tol = 0.01`, `rel_tol = 0`.
    pub tolerance: Tolerance,

    /// Number of independently randomized streams `J`. Default: 16.
    pub replications: usize,

    /// Inflation factor applied to the spread of stream means. Default: 1.2.
    pub inflate: f64,

    /// Significance level of the confidence interval. Default: 0.01.
    pub alpha: f64,

    /// Samples per stream in the first iteration. Default: 1024.
    pub n_init: u64,

    /// Budget on cumulative samples across all streams and iterations.
    /// Default: 1e8.
    pub n_max: u64,

    /// Iteration records kept before the run stops. Default: 256.
    pub history_capacity: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(1e-2, 0.0),
            replications: 16,
            inflate: 1.2,
            alpha: 0.01,
            n_init: 1024,
            n_max: 100_000_000,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ReplicationConfig {
    /// Builder method to set the absolute tolerance.
    pub fn abs_tol(mut self, abs_tol: f64) -> Self {
        self.tolerance.abs_tol = abs_tol;
        self
    }

    /// Builder method to set the relative tolerance.
    pub fn rel_tol(mut self, rel_tol: f64) -> Self {
        self.tolerance.rel_tol = rel_tol;
        self
    }

    /// Builder method to set the number of streams.
    pub fn replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    /// Builder method to set the inflation factor.
    pub fn inflate(mut self, inflate: f64) -> Self {
        self.inflate = inflate;
        self
    }

    /// Builder method to set the significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method to set the initial samples per stream.
    pub fn n_init(mut self, n_init: u64) -> Self {
        self.n_init = n_init;
        self
    }

    /// Builder method to set the sample budget.
    pub fn n_max(mut self, n_max: u64) -> Self {
        self.n_max = n_max;
        self
    }

    /// Builder method to set the history capacity.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<(), ParameterIssue> {
        self.tolerance.validate()?;
        validate_alpha(self.alpha)?;
        validate_at_least("replications", self.replications as u64, 2)?;
        validate_at_least("n_init", self.n_init, 1)?;
        validate_at_least("history_capacity", self.history_capacity as u64, 1)?;
        validate_budget(self.n_init, self.n_max)?;
        if self.inflate.is_nan() || self.inflate < 1.0 {
            return Err(ParameterIssue::OutOfRange {
                name: "inflate",
                value: self.inflate,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Bayesian lattice
// ============================================================================

/// How the error bound is derived from the kernel posterior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorBoundMode {
    /// Shape by maximum likelihood, scale plugged in.
    #[default]
    EmpiricalBayes,
    /// Shape by generalized cross validation.
    Gcv,
    /// Mean and scale integrated out; Student-t credible interval.
    FullBayes,
}

/// Configuration for [`BayesianLatticeCriterion`](crate::BayesianLatticeCriterion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesLatticeConfig {
    /// Error tolerances. Default: `abs_tol = 0.01`, `rel_tol = 0`.
    pub tolerance: Tolerance,

    /// Significance level of the credible interval. Default: 0.01.
    pub alpha: f64,

    /// Points in the first iteration, a power of two. Default: 2^10.
    pub n_init: u64,

    /// Largest point count, a power of two (inclusive). Default: 2^22.
    pub n_max: u64,

    /// Kernel family and numerical conventions.
    pub kernel: KernelConfig,

    /// Error-bound formula and hyperparameter objective.
    pub mode: ErrorBoundMode,

    /// Variable transform making the integrand periodic. Default: Baker.
    pub transform: PeriodizationTransform,

    /// Treat the integrand mean as unknown. Default: true.
    pub arbitrary_mean: bool,

    /// Stop once the tolerance is met. When false the run continues to
    /// `n_max` to collect the whole error curve. Default: true.
    pub stop_at_tolerance: bool,

    /// Iteration records kept before the run stops. Default: 256.
    pub history_capacity: usize,
}

impl Default for BayesLatticeConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(1e-2, 0.0),
            alpha: 0.01,
            n_init: 1 << 10,
            n_max: 1 << 22,
            kernel: KernelConfig::default(),
            mode: ErrorBoundMode::default(),
            transform: PeriodizationTransform::default(),
            arbitrary_mean: true,
            stop_at_tolerance: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl BayesLatticeConfig {
    /// Builder method to set the absolute tolerance.
    pub fn abs_tol(mut self, abs_tol: f64) -> Self {
        self.tolerance.abs_tol = abs_tol;
        self
    }

    /// Builder method to set the relative tolerance.
    pub fn rel_tol(mut self, rel_tol: f64) -> Self {
        self.tolerance.rel_tol = rel_tol;
        self
    }

    /// Builder method to set the significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method to set the initial point count.
    pub fn n_init(mut self, n_init: u64) -> Self {
        self.n_init = n_init;
        self
    }

    /// Builder method to set the maximum point count.
    pub fn n_max(mut self, n_max: u64) -> Self {
        self.n_max = n_max;
        self
    }

    /// Builder method to set the kernel conventions.
    pub fn kernel(mut self, kernel: KernelConfig) -> Self {
        self.kernel = kernel;
        self
    }

    /// Builder method to set the error-bound mode.
    pub fn mode(mut self, mode: ErrorBoundMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method to set the periodization transform.
    pub fn transform(mut self, transform: PeriodizationTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder method to select the arbitrary- or known-mean model.
    pub fn arbitrary_mean(mut self, arbitrary_mean: bool) -> Self {
        self.arbitrary_mean = arbitrary_mean;
        self
    }

    /// Builder method to keep sampling after the tolerance is met.
    pub fn stop_at_tolerance(mut self, stop: bool) -> Self {
        self.stop_at_tolerance = stop;
        self
    }

    /// Builder method to set the history capacity.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// `log2(n_init)`.
    pub fn m_min(&self) -> u32 {
        self.n_init.trailing_zeros()
    }

    /// `log2(n_max)`.
    pub fn m_max(&self) -> u32 {
        self.n_max.trailing_zeros()
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<(), ParameterIssue> {
        self.tolerance.validate()?;
        validate_alpha(self.alpha)?;
        validate_power_of_two("n_init", self.n_init)?;
        validate_power_of_two("n_max", self.n_max)?;
        validate_at_least("n_init", self.n_init, 2)?;
        validate_at_least("history_capacity", self.history_capacity as u64, 1)?;
        validate_budget(self.n_init, self.n_max)?;
        if self.m_max() > cubature_core::constants::MAX_LOG2_POINTS {
            return Err(ParameterIssue::OutOfRange {
                name: "n_max",
                value: self.n_max as f64,
            });
        }
        if !self.kernel.family.is_supported() {
            return Err(ParameterIssue::UnsupportedKernel);
        }
        Ok(())
    }
}

// ============================================================================
// Multi-level
// ============================================================================

/// Configuration for [`MultiLevelCriterion`](crate::MultiLevelCriterion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLevelConfig {
    /// Absolute tolerance. Default: 0.05.
    pub abs_tol: f64,

    /// Significance level. Default: 0.01.
    pub alpha: f64,

    /// Root-mean-square error target. When `None` it is derived as
    /// `abs_tol / Φ⁻¹(1 − α/2)`.
    pub rmse_tol: Option<f64>,

    /// Points per replication on a new level. Default: 256.
    pub n_init: u64,

    /// Budget on total samples over all levels and replications.
    /// Default: 1e10.
    pub n_max: u64,

    /// Randomized replications per level. Default: 32.
    pub replications: usize,

    /// Levels evaluated in the first iteration. Default: 3.
    pub levels_init: usize,

    /// Iteration records kept before the run stops. Default: 256.
    pub history_capacity: usize,
}

impl Default for MultiLevelConfig {
    fn default() -> Self {
        Self {
            abs_tol: 0.05,
            alpha: 0.01,
            rmse_tol: None,
            n_init: 256,
            n_max: 10_000_000_000,
            replications: 32,
            levels_init: 3,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl MultiLevelConfig {
    /// Builder method to set the absolute tolerance.
    pub fn abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    /// Builder method to set the significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method to set the RMSE target directly.
    pub fn rmse_tol(mut self, rmse_tol: f64) -> Self {
        self.rmse_tol = Some(rmse_tol);
        self
    }

    /// Builder method to set the initial points per level.
    pub fn n_init(mut self, n_init: u64) -> Self {
        self.n_init = n_init;
        self
    }

    /// Builder method to set the sample budget.
    pub fn n_max(mut self, n_max: u64) -> Self {
        self.n_max = n_max;
        self
    }

    /// Builder method to set the replications per level.
    pub fn replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    /// Builder method to set the initial number of levels.
    pub fn levels_init(mut self, levels: usize) -> Self {
        self.levels_init = levels;
        self
    }

    /// Builder method to set the history capacity.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<(), ParameterIssue> {
        if let Some(rmse) = self.rmse_tol {
            if rmse.is_nan() || rmse <= 0.0 {
                return Err(ParameterIssue::OutOfRange {
                    name: "rmse_tol",
                    value: rmse,
                });
            }
        } else {
            Tolerance::new(self.abs_tol, 0.0).validate()?;
            validate_alpha(self.alpha)?;
        }
        validate_power_of_two("n_init", self.n_init)?;
        validate_at_least("replications", self.replications as u64, 2)?;
        validate_at_least("levels_init", self.levels_init as u64, 1)?;
        validate_at_least("history_capacity", self.history_capacity as u64, 1)?;
        validate_budget(self.n_init, self.n_max)?;
        Ok(())
    }
}
