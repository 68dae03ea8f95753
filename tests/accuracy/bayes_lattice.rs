//! Bayesian lattice cubature on Keister's integrand and linear functions.

use cubature::{
    BayesLatticeConfig, BayesianLatticeCriterion, ErrorBoundMode, KernelConfig, KernelFamily,
    Keister, Lattice, LatticeOrder, Linear, PeriodizationTransform, StoppingCriterion,
};

/// `∫ exp(−‖x‖²) cos‖x‖ dx` over `ℝ^d` for `d = 1, 2, 3`.
const KEISTER: [f64; 3] = [1.380_388_447_043_143, 1.808_186_429_263_620, 2.168_309_102_165_481];

#[test]
fn keister_one_to_three_dimensions() {
    for d in 1..=3 {
        let exact = KEISTER[d - 1];
        let result = BayesianLatticeCriterion::new(
            Keister::measured(d),
            Lattice::new(d).seed(7),
            BayesLatticeConfig::default().abs_tol(1e-2),
        )
        .unwrap()
        .integrate();
        assert!(result.is_converged(), "d = {d}: {}", result.stop_reason);
        assert!(
            (result.solution - exact).abs() < 1e-2,
            "d = {d}: {} vs {exact}",
            result.solution
        );
        let (lo, hi) = result.confidence_interval;
        assert!(lo < result.solution && result.solution < hi);
    }
}

#[test]
fn keister_every_error_bound_mode() {
    for mode in [
        ErrorBoundMode::EmpiricalBayes,
        ErrorBoundMode::Gcv,
        ErrorBoundMode::FullBayes,
    ] {
        let result = BayesianLatticeCriterion::new(
            Keister::measured(2),
            Lattice::new(2).seed(11),
            BayesLatticeConfig::default().mode(mode),
        )
        .unwrap()
        .integrate();
        assert!(result.is_converged(), "{mode:?}");
        assert!((result.solution - KEISTER[1]).abs() < 1e-2, "{mode:?}");
    }
}

#[test]
fn linear_in_van_der_corput_order() {
    for d in 1..=3 {
        let lattice = Lattice::new(d).seed(3).ordered(LatticeOrder::VanDerCorput);
        let result = BayesianLatticeCriterion::new(
            Linear::measured(d),
            lattice,
            BayesLatticeConfig::default().transform(PeriodizationTransform::C2Sin),
        )
        .unwrap()
        .integrate();
        assert!(result.is_converged(), "d = {d}");
        assert!((result.solution - d as f64 / 2.0).abs() < 1e-2, "d = {d}");
    }
}

#[test]
fn first_order_kernel_without_cancellation_avoidance() {
    let kernel = KernelConfig {
        family: KernelFamily::Bernoulli { order: 1 },
        avoid_cancellation: false,
        debug: false,
    };
    let result = BayesianLatticeCriterion::new(
        Keister::measured(1),
        Lattice::new(1).seed(5),
        BayesLatticeConfig::default().kernel(kernel),
    )
    .unwrap()
    .integrate();
    assert!(result.is_converged());
    assert!((result.solution - KEISTER[0]).abs() < 1e-2);
}

#[test]
fn relative_tolerance() {
    let result = BayesianLatticeCriterion::new(
        Keister::measured(3),
        Lattice::new(3).seed(2),
        BayesLatticeConfig::default().abs_tol(0.0).rel_tol(1e-3),
    )
    .unwrap()
    .integrate();
    assert!(result.is_converged());
    assert!((result.solution - KEISTER[2]).abs() / KEISTER[2] < 1e-3);
}

#[test]
fn known_zero_mean_model_runs_to_a_finite_estimate() {
    let result = BayesianLatticeCriterion::new(
        Keister::measured(2),
        Lattice::new(2).seed(13),
        BayesLatticeConfig::default().arbitrary_mean(false),
    )
    .unwrap()
    .integrate();
    assert!(result.solution.is_finite(), "{}", result.solution);
    assert!(result.error_bound.is_finite() && result.error_bound > 0.0);
    assert!(result.total_samples.is_power_of_two());
    assert!(result.total_samples >= 1 << 8);
}
