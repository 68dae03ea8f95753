//! Tests for run bookkeeping: sample totals, history and stop reasons.

use cubature::{
    BayesLatticeConfig, BayesianLatticeCriterion, Integrand, IterationDetail, Keister, Lattice,
    LatticeOrder, Linear, ReplicationConfig, ReplicationVarianceCriterion, Stage,
    StoppingCriterion, StopReason,
};

// =============================================================================
// DOUBLING
// =============================================================================

#[test]
fn bayes_totals_are_powers_of_two() {
    for order in [LatticeOrder::Natural, LatticeOrder::VanDerCorput] {
        let config = BayesLatticeConfig::default()
            .n_init(1 << 6)
            .n_max(1 << 12)
            .abs_tol(1e-9);
        let lattice = Lattice::new(3).seed(21).ordered(order);
        let result = BayesianLatticeCriterion::new(Keister::measured(3), lattice, config)
            .unwrap()
            .integrate();

        let totals: Vec<u64> = result.history.iter().map(|r| r.total_samples).collect();
        assert_eq!(totals.first(), Some(&(1 << 6)), "{order:?}");
        assert!(totals.iter().all(|t| t.is_power_of_two()), "{order:?}");
        assert!(totals.windows(2).all(|w| w[1] == 2 * w[0]), "{order:?}");
        assert!(result.total_samples <= 1 << 12);
    }
}

#[test]
fn bayes_history_carries_search_diagnostics() {
    let config = BayesLatticeConfig::default().n_init(1 << 7).n_max(1 << 9).abs_tol(1e-12);
    let result = BayesianLatticeCriterion::new(Linear::measured(2), Lattice::new(2), config)
        .unwrap()
        .integrate();
    assert_eq!(result.history.len(), 3);
    for (i, record) in result.history.iter().enumerate() {
        assert_eq!(record.iteration, i);
        match &record.detail {
            IterationDetail::BayesLattice(b) => {
                assert_eq!(b.m, 7 + i as u32);
                assert!(b.shape > 0.0);
                assert!(b.search_iterations > 0);
                assert!(b.rkhs_norm >= 0.0);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }
}

// =============================================================================
// BUDGETS
// =============================================================================

#[test]
fn replication_totals_never_exceed_budget() {
    let integrands: Vec<Box<dyn Integrand>> = vec![Box::new(Keister::measured(4))];
    let config = ReplicationConfig::default()
        .abs_tol(1e-8)
        .n_init(64)
        .replications(8)
        .n_max(20_000);
    let result = ReplicationVarianceCriterion::new(Lattice::new(4).seed(2), integrands, config)
        .unwrap()
        .integrate();

    assert_eq!(result.stage, Stage::MaxSamplesReached);
    assert!(result.total_samples <= 20_000);
    let totals: Vec<u64> = result.history.iter().map(|r| r.total_samples).collect();
    assert!(totals.windows(2).all(|w| w[0] < w[1]));
    match result.stop_reason {
        StopReason::MaxSamples { requested, n_max } => {
            assert_eq!(n_max, 20_000);
            assert!(requested > n_max);
        }
        other => panic!("unexpected stop reason {other}"),
    }
}

#[test]
fn history_capacity_stops_the_run() {
    let integrands: Vec<Box<dyn Integrand>> = vec![Box::new(Keister::measured(2))];
    let config = ReplicationConfig::default()
        .abs_tol(1e-10)
        .n_init(16)
        .history_capacity(3);
    let result = ReplicationVarianceCriterion::new(Lattice::new(2).seed(4), integrands, config)
        .unwrap()
        .integrate();
    assert_eq!(result.stop_reason, StopReason::IterationLimit { capacity: 3 });
    assert_eq!(result.history.len(), 3);
    assert_eq!(result.stage, Stage::MaxSamplesReached);
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = || {
        BayesianLatticeCriterion::new(
            Keister::measured(2),
            Lattice::new(2).seed(99),
            BayesLatticeConfig::default().n_init(1 << 8),
        )
        .unwrap()
        .integrate()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.solution, b.solution);
    assert_eq!(a.error_bound, b.error_bound);
    assert_eq!(a.total_samples, b.total_samples);
}
