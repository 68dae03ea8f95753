//! Kernel shape search.
//!
//! The shape parameter is chosen by minimising the MLE or GCV objective over
//! `ln(shape)` with argmin's bounded Brent solver.

use argmin::core::{CostFunction, Error, Executor, State, TerminationReason};
use argmin::solver::brent::BrentOpt;
use cubature_core::constants::{SHAPE_SEARCH_MAX_ITERS, SHAPE_SEARCH_XTOL};
use cubature_core::likelihood::{objective, search_value};
use cubature_core::{Complex64, KernelModel, ObjectiveKind, Points};

/// Objective over `ln(shape)` for one unshifted lattice and its transformed
/// integrand values.
pub(crate) struct ShapeObjective<'a> {
    pub model: &'a KernelModel,
    pub points: &'a Points,
    pub ftilde: &'a [Complex64],
    pub kind: ObjectiveKind,
    pub arbitrary_mean: bool,
}

impl CostFunction for ShapeObjective<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, ln_shape: &Self::Param) -> Result<Self::Output, Error> {
        let spectrum = self.model.spectrum(self.points, ln_shape.exp());
        Ok(search_value(&objective(
            self.kind,
            self.arbitrary_mean,
            &spectrum,
            self.ftilde,
        )))
    }
}

/// Outcome of one bounded search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ShapeSearch {
    /// Best `ln(shape)` found.
    pub ln_shape: f64,
    /// Objective value at `ln_shape`.
    pub loss: f64,
    /// Solver iterations used.
    pub iterations: u64,
    /// False if the iteration limit was hit first.
    pub converged: bool,
}

/// Minimise `objective` over `ln(shape) ∈ [lower, upper]`.
pub(crate) fn search_shape(
    objective: ShapeObjective<'_>,
    lower: f64,
    upper: f64,
) -> Result<ShapeSearch, Error> {
    let solver =
        BrentOpt::new(lower, upper).set_tolerance(f64::EPSILON.sqrt(), SHAPE_SEARCH_XTOL / 3.0);
    let result = Executor::new(objective, solver)
        .configure(|state| state.max_iters(SHAPE_SEARCH_MAX_ITERS))
        .run()?;

    let state = result.state();
    let Some(&ln_shape) = state.get_best_param() else {
        return Err(Error::msg("shape search finished without an estimate"));
    };
    Ok(ShapeSearch {
        ln_shape,
        loss: state.get_best_cost(),
        iterations: state.get_iter(),
        converged: matches!(
            state.get_termination_reason(),
            Some(TerminationReason::SolverConverged)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubature_core::fft::fft_real;
    use cubature_core::lattice::natural_points;
    use cubature_core::{GeneratorVector, KernelConfig, KernelFamily};

    fn keister_like(points: &Points) -> Vec<Complex64> {
        let values: Vec<f64> = points
            .rows()
            .map(|row| row.iter().map(|x| (3.0 * x).cos()).product())
            .collect();
        fft_real(&values)
    }

    #[test]
    fn stays_in_range_and_converges() {
        let points = natural_points(&GeneratorVector::gail(2).unwrap(), 1 << 8, None);
        let ftilde = keister_like(&points);
        let model = KernelModel::new(KernelConfig::default());
        let (lower, upper) = KernelFamily::Bernoulli { order: 2 }.shape_search_range();

        let search = search_shape(
            ShapeObjective {
                model: &model,
                points: &points,
                ftilde: &ftilde,
                kind: ObjectiveKind::Mle,
                arbitrary_mean: true,
            },
            lower,
            upper,
        )
        .unwrap();

        assert!(search.converged, "{search:?}");
        assert!(search.iterations > 0 && search.iterations <= SHAPE_SEARCH_MAX_ITERS);
        assert!((lower..=upper).contains(&search.ln_shape), "{search:?}");
        assert!(search.loss.is_finite());
    }

    #[test]
    fn improves_on_the_first_golden_section_point() {
        let points = natural_points(&GeneratorVector::gail(3).unwrap(), 1 << 7, None);
        let ftilde = keister_like(&points);
        let model = KernelModel::new(KernelConfig::default());
        let (lower, upper) = (-3.0, 0.0);
        let make = || ShapeObjective {
            model: &model,
            points: &points,
            ftilde: &ftilde,
            kind: ObjectiveKind::Gcv,
            arbitrary_mean: true,
        };

        let search = search_shape(make(), lower, upper).unwrap();
        let golden = lower + 0.5 * (3.0 - 5f64.sqrt()) * (upper - lower);
        let start = make().cost(&golden).unwrap();
        assert!(search.loss <= start + 1e-12, "{} > {start}", search.loss);
        assert_eq!(make().cost(&search.ln_shape).unwrap(), search.loss);
    }
}
