//! Discrete distributions that supply points in `[0, 1)^d`.
//!
//! The criteria only depend on the traits here. Two small implementations
//! ship with the crate: a randomly shifted rank-1 [`Lattice`] and an IID
//! uniform generator used as an incompatible-distribution example.
//!
//! Randomness is deterministic given a seed: every randomization draws from
//! its own `Xoshiro256PlusPlus` stream seeded by [`counter_rng_seed`].

use cubature_core::constants::DEFAULT_SEED;
use cubature_core::lattice::{natural_points, van_der_corput_points};
use cubature_core::{GeneratorVector, LatticeOrder, Points};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Family a discrete distribution belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionKind {
    /// Rank-1 lattice.
    Lattice,
    /// Sobol' digital net (provided by external implementors).
    Sobol,
    /// Independent uniform samples.
    IidStdUniform,
}

/// Construction used for lattice generator vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorBackend {
    /// Tabulated GAIL generator, Korobov beyond its dimensions.
    Gail,
    /// User-supplied generator vector.
    Custom,
}

/// Derive a well-mixed seed for stream `counter` of a run seeded with `seed`.
///
/// SplitMix64 finaliser over `seed + (counter + 1)·φ`, so consecutive counters
/// give unrelated streams.
pub fn counter_rng_seed(seed: u64, counter: u64) -> u64 {
    let mut z = seed.wrapping_add(counter.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A source of point sets in the unit cube.
pub trait DiscreteDistribution: Send + Sync {
    /// Family of the distribution.
    fn kind(&self) -> DistributionKind;

    /// True if each call produces freshly randomized points.
    fn randomize(&self) -> bool;

    /// Generator construction backing the distribution.
    fn backend(&self) -> GeneratorBackend;

    /// Dimension of generated points.
    fn dimension(&self) -> usize;

    /// `replications` independently randomized sets of `n` points each.
    fn generate(&mut self, replications: usize, n: usize) -> Vec<Points>;
}

/// A distribution whose randomized replications can be extended in place.
///
/// Replication `r` is a fixed infinite sequence; `extend` returns its points
/// with indices `start..end`, so growing a replication from `n` to `2n`
/// points only produces the new ones.
pub trait ExtensibleSequence: DiscreteDistribution {
    /// Points `start..end` of replication `replication` in `dimension`
    /// dimensions.
    fn extend(&self, replication: usize, dimension: usize, start: u64, end: u64) -> Points;
}

/// A distribution that exposes its rank-1 lattice structure.
pub trait LatticeSource: DiscreteDistribution {
    /// Generator vector for the distribution's dimension.
    fn generator(&self) -> GeneratorVector;

    /// Point ordering.
    fn order(&self) -> LatticeOrder;

    /// Draw the random shift for a new run (zeros when not randomized).
    fn draw_shift(&mut self) -> Vec<f64>;
}

// ============================================================================
// Lattice
// ============================================================================

/// Randomly shifted rank-1 lattice.
#[derive(Debug, Clone)]
pub struct Lattice {
    dimension: usize,
    randomize: bool,
    order: LatticeOrder,
    seed: u64,
    custom: Option<GeneratorVector>,
    draws: u64,
}

impl Lattice {
    /// Shifted lattice with the GAIL generator, natural order and the
    /// default seed.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            randomize: true,
            order: LatticeOrder::Natural,
            seed: DEFAULT_SEED,
            custom: None,
            draws: 0,
        }
    }

    /// Builder method to set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.draws = 0;
        self
    }

    /// Builder method to enable or disable the random shift.
    pub fn randomized(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Builder method to set the point ordering.
    pub fn ordered(mut self, order: LatticeOrder) -> Self {
        self.order = order;
        self
    }

    /// Builder method to use an explicit generator vector.
    pub fn generator_vector(mut self, generator: GeneratorVector) -> Self {
        self.dimension = generator.dimension();
        self.custom = Some(generator);
        self
    }

    /// Shift of randomization `stream` in `dimension` dimensions.
    ///
    /// The first `d` coordinates do not depend on `dimension`, so levels of
    /// different dimension share a consistent shift.
    pub fn shift(&self, stream: u64, dimension: usize) -> Vec<f64> {
        if !self.randomize {
            return vec![0.0; dimension];
        }
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(self.seed, stream));
        (0..dimension).map(|_| rng.random::<f64>()).collect()
    }

    fn generator_for(&self, dimension: usize) -> GeneratorVector {
        match &self.custom {
            Some(custom) if custom.dimension() >= dimension => {
                GeneratorVector::new(custom.weights()[..dimension].to_vec())
            }
            _ => GeneratorVector::for_dimension(dimension),
        }
    }

    fn points(&self, generator: &GeneratorVector, start: u64, end: u64, shift: &[f64]) -> Points {
        let shift = self.randomize.then_some(shift);
        match self.order {
            LatticeOrder::Natural if start == 0 => {
                natural_points(generator, end as usize, shift)
            }
            _ => van_der_corput_points(generator, start, end, shift),
        }
    }
}

impl DiscreteDistribution for Lattice {
    fn kind(&self) -> DistributionKind {
        DistributionKind::Lattice
    }

    fn randomize(&self) -> bool {
        self.randomize
    }

    fn backend(&self) -> GeneratorBackend {
        if self.custom.is_some() {
            GeneratorBackend::Custom
        } else {
            GeneratorBackend::Gail
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn generate(&mut self, replications: usize, n: usize) -> Vec<Points> {
        let generator = self.generator_for(self.dimension);
        (0..replications)
            .map(|_| {
                let shift = self.draw_shift();
                self.points(&generator, 0, n as u64, &shift)
            })
            .collect()
    }
}

impl ExtensibleSequence for Lattice {
    fn extend(&self, replication: usize, dimension: usize, start: u64, end: u64) -> Points {
        let generator = self.generator_for(dimension);
        let shift = self.shift(replication as u64, dimension);
        let shift = self.randomize.then_some(shift.as_slice());
        van_der_corput_points(&generator, start, end, shift)
    }
}

impl LatticeSource for Lattice {
    fn generator(&self) -> GeneratorVector {
        self.generator_for(self.dimension)
    }

    fn order(&self) -> LatticeOrder {
        self.order
    }

    fn draw_shift(&mut self) -> Vec<f64> {
        let shift = self.shift(self.draws, self.dimension);
        self.draws += 1;
        shift
    }
}

// ============================================================================
// IID uniform
// ============================================================================

/// Independent standard uniform points.
#[derive(Debug, Clone)]
pub struct IidStdUniform {
    dimension: usize,
    seed: u64,
    draws: u64,
}

impl IidStdUniform {
    /// IID uniform points with the default seed.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            seed: DEFAULT_SEED,
            draws: 0,
        }
    }

    /// Builder method to set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.draws = 0;
        self
    }
}

impl DiscreteDistribution for IidStdUniform {
    fn kind(&self) -> DistributionKind {
        DistributionKind::IidStdUniform
    }

    fn randomize(&self) -> bool {
        true
    }

    fn backend(&self) -> GeneratorBackend {
        GeneratorBackend::Custom
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn generate(&mut self, replications: usize, n: usize) -> Vec<Points> {
        (0..replications)
            .map(|_| {
                let mut rng =
                    Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(self.seed, self.draws));
                self.draws += 1;
                let data = (0..n * self.dimension).map(|_| rng.random::<f64>()).collect();
                Points::from_vec(n, self.dimension, data)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_seeds_differ() {
        let a = counter_rng_seed(7, 0);
        let b = counter_rng_seed(7, 1);
        let c = counter_rng_seed(8, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, counter_rng_seed(7, 0));
    }

    #[test]
    fn lattice_replications_are_distinct_shifts() {
        let mut lattice = Lattice::new(3).seed(7);
        let sets = lattice.generate(4, 16);
        assert_eq!(sets.len(), 4);
        assert!(sets.iter().all(|p| p.n() == 16 && p.dimension() == 3));
        assert_ne!(sets[0], sets[1]);
        assert!(sets[0].as_slice().iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn generation_is_reproducible() {
        let a = Lattice::new(2).seed(11).generate(2, 8);
        let b = Lattice::new(2).seed(11).generate(2, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn shift_prefix_is_dimension_independent() {
        let lattice = Lattice::new(2).seed(3);
        let short = lattice.shift(5, 2);
        let long = lattice.shift(5, 6);
        assert_eq!(&long[..2], short.as_slice());
    }

    #[test]
    fn extension_matches_one_shot_generation() {
        let lattice = Lattice::new(4).seed(1);
        let first = lattice.extend(2, 4, 0, 8);
        let second = lattice.extend(2, 4, 8, 16);
        let whole = lattice.extend(2, 4, 0, 16);
        assert_eq!(&whole.as_slice()[..32], first.as_slice());
        assert_eq!(&whole.as_slice()[32..], second.as_slice());
    }

    #[test]
    fn unrandomized_lattice_starts_at_origin() {
        let mut lattice = Lattice::new(2).randomized(false);
        let sets = lattice.generate(1, 4);
        assert_eq!(sets[0].row(0), &[0.0, 0.0]);
        assert_eq!(lattice.draw_shift(), vec![0.0, 0.0]);
    }

    #[test]
    fn iid_points_are_uniform_in_range() {
        let mut iid = IidStdUniform::new(2).seed(5);
        let sets = iid.generate(2, 1000);
        let mean: f64 = sets[0].as_slice().iter().sum::<f64>() / 2000.0;
        assert!((mean - 0.5).abs() < 0.05);
        assert_ne!(sets[0], sets[1]);
    }
}
