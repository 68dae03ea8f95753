//! Tests for configuration validation.
//!
//! Every invalid setting must be rejected when a criterion is constructed,
//! before any sampling happens.

use cubature::{
    BayesLatticeConfig, BayesianLatticeCriterion, CubatureError, DiscreteDistribution,
    DistributionKind, GeneratorBackend, GeneratorVector, IidStdUniform, Integrand, KernelConfig,
    KernelFamily, Keister, Lattice, LatticeOrder, LatticeSource, Linear, MeasuredIntegrand,
    MlEuropeanCall, MultiLevelConfig, MultiLevelCriterion, ParameterIssue, Points,
    ReplicationConfig, ReplicationVarianceCriterion, StoppingCriterion, Uniform,
};

fn linear(d: usize) -> Vec<Box<dyn Integrand>> {
    vec![Box::new(Linear::measured(d))]
}

// =============================================================================
// DISTRIBUTION COMPATIBILITY
// =============================================================================

#[test]
fn replication_rejects_iid_distribution() {
    let err = ReplicationVarianceCriterion::new(
        IidStdUniform::new(2),
        linear(2),
        ReplicationConfig::default(),
    )
    .err();
    match err {
        Some(CubatureError::DistributionCompatibility {
            criterion,
            found,
            allowed,
        }) => {
            assert_eq!(criterion, "ReplicationVarianceCriterion");
            assert_eq!(found, DistributionKind::IidStdUniform);
            assert!(allowed.contains(&DistributionKind::Lattice));
            assert!(allowed.contains(&DistributionKind::Sobol));
        }
        other => panic!("expected compatibility error, got {:?}", other),
    }
}

/// Lattice points labelled as a Sobol' sequence.
struct SobolLabelled(Lattice);

impl DiscreteDistribution for SobolLabelled {
    fn kind(&self) -> DistributionKind {
        DistributionKind::Sobol
    }

    fn randomize(&self) -> bool {
        self.0.randomize()
    }

    fn backend(&self) -> GeneratorBackend {
        self.0.backend()
    }

    fn dimension(&self) -> usize {
        self.0.dimension()
    }

    fn generate(&mut self, replications: usize, n: usize) -> Vec<Points> {
        self.0.generate(replications, n)
    }
}

impl LatticeSource for SobolLabelled {
    fn generator(&self) -> GeneratorVector {
        self.0.generator()
    }

    fn order(&self) -> LatticeOrder {
        self.0.order()
    }

    fn draw_shift(&mut self) -> Vec<f64> {
        self.0.draw_shift()
    }
}

#[test]
fn bayes_rejects_non_lattice_kind() {
    let err = BayesianLatticeCriterion::new(
        Keister::measured(2),
        SobolLabelled(Lattice::new(2)),
        BayesLatticeConfig::default(),
    )
    .err();
    match err {
        Some(CubatureError::DistributionCompatibility {
            criterion,
            found,
            allowed,
        }) => {
            assert_eq!(criterion, "BayesianLatticeCriterion");
            assert_eq!(found, DistributionKind::Sobol);
            assert_eq!(allowed, &[DistributionKind::Lattice]);
        }
        other => panic!("expected compatibility error, got {:?}", other),
    }
}

#[test]
fn unrandomized_lattice_is_rejected_everywhere() {
    let fixed = || Lattice::new(1).randomized(false);
    let expected = Some(CubatureError::Parameter(ParameterIssue::NotRandomized));

    assert_eq!(
        ReplicationVarianceCriterion::new(fixed(), linear(1), ReplicationConfig::default()).err(),
        expected
    );
    assert_eq!(
        BayesianLatticeCriterion::new(Linear::measured(1), fixed(), BayesLatticeConfig::default())
            .err(),
        expected
    );
    assert_eq!(
        MultiLevelCriterion::new(
            MlEuropeanCall::default(),
            fixed(),
            MultiLevelConfig::default()
        )
        .err(),
        expected
    );
}

#[test]
fn allowed_kinds_are_reported() {
    let criterion =
        BayesianLatticeCriterion::new(Linear::measured(1), Lattice::new(1), BayesLatticeConfig::default())
            .unwrap();
    assert_eq!(criterion.allowed_distributions(), &[DistributionKind::Lattice]);
    assert_eq!(criterion.name(), "BayesianLatticeCriterion");
}

// =============================================================================
// SAMPLE COUNTS
// =============================================================================

#[test]
fn bayes_requires_power_of_two_counts() {
    for config in [
        BayesLatticeConfig::default().n_init(1000),
        BayesLatticeConfig::default().n_max(3 << 20),
    ] {
        let err = BayesianLatticeCriterion::new(Linear::measured(1), Lattice::new(1), config).err();
        assert!(matches!(
            err,
            Some(CubatureError::Parameter(ParameterIssue::NotPowerOfTwo { .. }))
        ));
    }
}

#[test]
fn bayes_rejects_budget_below_initial() {
    let config = BayesLatticeConfig::default().n_init(1 << 12).n_max(1 << 10);
    let err = BayesianLatticeCriterion::new(Linear::measured(1), Lattice::new(1), config).err();
    assert_eq!(
        err,
        Some(CubatureError::Parameter(ParameterIssue::BudgetBelowInitial {
            n_init: 1 << 12,
            n_max: 1 << 10
        }))
    );
}

#[test]
fn multilevel_requires_power_of_two_n_init() {
    let err = MultiLevelCriterion::new(
        MlEuropeanCall::default(),
        Lattice::new(1),
        MultiLevelConfig::default().n_init(100),
    )
    .err();
    assert!(matches!(
        err,
        Some(CubatureError::Parameter(ParameterIssue::NotPowerOfTwo {
            name: "n_init",
            value: 100
        }))
    ));
}

// =============================================================================
// TOLERANCES AND KERNELS
// =============================================================================

#[test]
fn zero_tolerances_rejected() {
    let err = ReplicationVarianceCriterion::new(
        Lattice::new(1),
        linear(1),
        ReplicationConfig::default().abs_tol(0.0).rel_tol(0.0),
    )
    .err();
    assert!(matches!(
        err,
        Some(CubatureError::Parameter(ParameterIssue::InvalidTolerance { .. }))
    ));
}

#[test]
fn relative_tolerance_alone_is_valid() {
    let config = ReplicationConfig::default().abs_tol(0.0).rel_tol(1e-2);
    assert!(config.validate().is_ok());
}

#[test]
fn unsupported_kernels_rejected() {
    for family in [
        KernelFamily::Bernoulli { order: 3 },
        KernelFamily::Cosine { decay: 1.5 },
    ] {
        let config = BayesLatticeConfig::default().kernel(KernelConfig {
            family,
            ..KernelConfig::default()
        });
        let err = BayesianLatticeCriterion::new(Linear::measured(1), Lattice::new(1), config).err();
        assert_eq!(
            err,
            Some(CubatureError::Parameter(ParameterIssue::UnsupportedKernel))
        );
    }
}

#[test]
fn dimension_mismatch_rejected() {
    let err = BayesianLatticeCriterion::new(
        Keister::measured(3),
        Lattice::new(2),
        BayesLatticeConfig::default(),
    )
    .err();
    assert_eq!(err, Some(CubatureError::Dimension { expected: 3, found: 2 }));
}

#[test]
fn measure_and_function_dimensions_must_agree() {
    let err = MeasuredIntegrand::new(Uniform::unit(2), Linear::new(3)).err();
    assert_eq!(err, Some(CubatureError::Dimension { expected: 2, found: 3 }));
}

#[test]
fn errors_display_the_offending_value() {
    let err = CubatureError::from(ParameterIssue::NotPowerOfTwo {
        name: "n_init",
        value: 1000,
    });
    let message = err.to_string();
    assert!(message.contains("n_init"), "{message}");
    assert!(message.contains("1000"), "{message}");
}
