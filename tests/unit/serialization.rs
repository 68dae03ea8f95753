//! Serialization of results and configurations.

use cubature::{
    BayesLatticeConfig, BayesianLatticeCriterion, ErrorBoundMode, Integrand, Keister, Lattice,
    MlEuropeanCall, MultiLevelConfig, MultiLevelCriterion, ReplicationConfig,
    ReplicationVarianceCriterion, StoppingCriterion, StopReason,
};

#[test]
fn bayes_result_serializes_with_history() {
    let result = BayesianLatticeCriterion::new(
        Keister::measured(2),
        Lattice::new(2).seed(1),
        BayesLatticeConfig::default().n_init(1 << 8),
    )
    .unwrap()
    .integrate();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["stage"], "Converged");
    assert_eq!(json["stop_reason"], "Converged");
    assert_eq!(json["total_samples"], result.total_samples);
    let history = json["history"]["records"].as_array().unwrap();
    assert_eq!(history.len(), result.history.len());
    assert!(history[0]["detail"]["BayesLattice"]["shape"].is_number());
}

#[test]
fn replication_and_multilevel_results_serialize() {
    let integrands: Vec<Box<dyn Integrand>> = vec![Box::new(Keister::measured(1))];
    let replication = ReplicationVarianceCriterion::new(
        Lattice::new(1),
        integrands,
        ReplicationConfig::default().n_init(64).abs_tol(0.05),
    )
    .unwrap()
    .integrate();
    let json = serde_json::to_string(&replication).unwrap();
    assert!(json.contains("\"Replication\""));

    let multilevel = MultiLevelCriterion::new(
        MlEuropeanCall::default(),
        Lattice::new(1),
        MultiLevelConfig::default().n_init(16).replications(4).n_max(1_000),
    )
    .unwrap()
    .integrate();
    let json = serde_json::to_value(&multilevel).unwrap();
    assert!(json["stop_reason"]["MaxSamples"]["n_max"] == 1_000 || json["stop_reason"] == "Converged");
    assert!(json["history"]["records"][0]["detail"]["MultiLevel"]["levels"].is_array());
}

#[test]
fn configs_round_trip() {
    let config = BayesLatticeConfig::default()
        .mode(ErrorBoundMode::FullBayes)
        .abs_tol(1e-4)
        .stop_at_tolerance(false);
    let json = serde_json::to_string(&config).unwrap();
    let back: BayesLatticeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let reason: StopReason = serde_json::from_str(r#"{"IterationLimit":{"capacity":4}}"#).unwrap();
    assert_eq!(reason, StopReason::IterationLimit { capacity: 4 });
}
