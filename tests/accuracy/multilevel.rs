//! Multi-level QMC on a European call priced by Euler time stepping.

use cubature::{
    IterationDetail, Lattice, MlEuropeanCall, MultiLevelConfig, MultiLevelCriterion,
    StoppingCriterion,
};

#[test]
fn european_call_matches_black_scholes() {
    let call = MlEuropeanCall::default();
    let result = MultiLevelCriterion::new(call, Lattice::new(1).seed(42), MultiLevelConfig::default())
        .unwrap()
        .integrate();
    assert!(result.is_converged(), "{}", result.stop_reason);
    assert!(
        (result.solution - call.fair_price()).abs() < 0.1,
        "{} vs {}",
        result.solution,
        call.fair_price()
    );
    assert!(result.components.len() >= 3);
}

#[test]
fn level_sample_counts_are_doublings_of_n_init() {
    let config = MultiLevelConfig::default().abs_tol(0.1).n_init(64).replications(8);
    let result = MultiLevelCriterion::new(MlEuropeanCall::default(), Lattice::new(1).seed(9), config)
        .unwrap()
        .integrate();
    let Some(last) = result.history.last() else {
        panic!("empty history");
    };
    let IterationDetail::MultiLevel(detail) = &last.detail else {
        panic!("unexpected detail");
    };
    for level in &detail.levels {
        assert!(level.samples >= 64);
        assert!(level.samples.is_power_of_two());
        assert_eq!(level.cost, (1u64 << level.index) as f64);
    }
    let expected: u64 = 8 * detail.levels.iter().map(|l| l.samples).sum::<u64>();
    assert_eq!(result.total_samples, expected);
}
