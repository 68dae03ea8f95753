//! Replicated QMC on polynomials with closed-form integrals.

use cubature::{
    CustomIntegrand, Integrand, Lattice, Lebesgue, Linear, MeasuredIntegrand, Points,
    ReplicationConfig, ReplicationVarianceCriterion, StoppingCriterion, Uniform,
};

fn xy_cubed(x: &Points) -> Vec<f64> {
    x.rows().map(|r| (r[0] * r[1]).powi(3)).collect()
}

fn box_bounds() -> (Vec<f64>, Vec<f64>) {
    (vec![1.0, 3.0], vec![3.0, 6.0])
}

#[test]
fn polynomial_under_lebesgue_measure() {
    let (lower, upper) = box_bounds();
    let g = MeasuredIntegrand::new(
        Lebesgue::new(lower, upper).unwrap(),
        CustomIntegrand::new(2, xy_cubed),
    )
    .unwrap();
    let result = ReplicationVarianceCriterion::new(
        Lattice::new(2).seed(7),
        vec![Box::new(g) as Box<dyn Integrand>],
        ReplicationConfig::default().abs_tol(1.0),
    )
    .unwrap()
    .integrate();
    assert!(result.is_converged(), "{}", result.stop_reason);
    assert!((result.solution - 6075.0).abs() < 1.0, "{}", result.solution);
}

#[test]
fn polynomial_under_uniform_measure() {
    let (lower, upper) = box_bounds();
    let g = MeasuredIntegrand::new(
        Uniform::new(lower, upper).unwrap(),
        CustomIntegrand::new(2, xy_cubed),
    )
    .unwrap();
    let result = ReplicationVarianceCriterion::new(
        Lattice::new(2).seed(7),
        vec![Box::new(g) as Box<dyn Integrand>],
        ReplicationConfig::default().abs_tol(1.0),
    )
    .unwrap()
    .integrate();
    assert!(result.is_converged());
    assert!((result.solution - 1012.5).abs() < 1.0, "{}", result.solution);
}

#[test]
fn linear_functions() {
    for d in 1..=3 {
        let integrands: Vec<Box<dyn Integrand>> = vec![Box::new(Linear::measured(d))];
        let result = ReplicationVarianceCriterion::new(
            Lattice::new(d).seed(13),
            integrands,
            ReplicationConfig::default(),
        )
        .unwrap()
        .integrate();
        assert!(result.is_converged(), "d = {d}");
        assert!((result.solution - d as f64 / 2.0).abs() < 1e-2, "d = {d}");
    }
}

#[test]
fn components_sum_to_solution() {
    let integrands: Vec<Box<dyn Integrand>> = vec![
        Box::new(Linear::measured(3)),
        Box::new(CustomIntegrand::new(3, |x: &Points| {
            x.rows().map(|r| r[0] * r[1] * r[2]).collect()
        })),
    ];
    let result = ReplicationVarianceCriterion::new(
        Lattice::new(3).seed(1),
        integrands,
        ReplicationConfig::default().abs_tol(1e-3),
    )
    .unwrap()
    .integrate();
    assert!(result.is_converged());
    assert_eq!(result.components.len(), 2);
    assert!((result.components[0] - 1.5).abs() < 1e-2);
    assert!((result.components[1] - 0.125).abs() < 1e-2);
    let sum: f64 = result.components.iter().sum();
    assert_eq!(sum, result.solution);
}
