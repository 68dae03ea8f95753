//! Compute backend hooks.
//!
//! Integrand values pass through a [`ComputeBackend`] on their way into the
//! transform and scalar results pass back out through it. The CPU backend is
//! the identity; an accelerator backend would move buffers to and from
//! device memory here.

use std::fmt::Debug;

/// Hooks around the numeric hot path of the Bayesian lattice criterion.
pub trait ComputeBackend: Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Take ownership of freshly evaluated integrand values.
    fn upload(&self, values: Vec<f64>) -> Vec<f64>;

    /// Bring a scalar result back to the host.
    fn gather(&self, value: f64) -> f64;
}

/// Host-memory backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn upload(&self, values: Vec<f64>) -> Vec<f64> {
        values
    }

    fn gather(&self, value: f64) -> f64 {
        value
    }
}
