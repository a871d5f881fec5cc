//! Seeded random variate source.
//!
//! Every stochastic draw of a run (inter-arrival gaps, fuel type, fuel time,
//! payment method) goes through the single [SimRng] resource, so a seed plus a
//! configuration fully determines the outcome.

use bevy_ecs::prelude::Resource;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Exp;

#[derive(Debug, Clone, Resource)]
pub struct SimRng {
    seed: u64,
    rng: StdRng,
}

impl SimRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Exponential draw with rate `rate` (events per minute).
    /// A non-positive rate means "never" and yields infinity.
    pub fn exponential_rate(&mut self, rate: f64) -> f64 {
        if rate.is_nan() || rate <= 0.0 {
            return f64::INFINITY;
        }
        match Exp::new(rate) {
            Ok(exp) => exp.sample(&mut self.rng),
            Err(_) => f64::INFINITY,
        }
    }

    /// Exponential draw with the given mean. A zero mean yields zero.
    pub fn exponential_mean(&mut self, mean: f64) -> f64 {
        if mean.is_nan() || mean <= 0.0 {
            return 0.0;
        }
        self.exponential_rate(1.0 / mean)
    }

    /// Index drawn from a weighted categorical table.
    pub fn choose_weighted(&mut self, table: &WeightedIndex<f64>) -> usize {
        table.sample(&mut self.rng)
    }
}
