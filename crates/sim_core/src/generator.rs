//! Vehicle generator: admits vehicles according to an inter-arrival distribution.
//!
//! The generator reacts to `SimulationStarted`, then reschedules itself with
//! `VehicleArrival` events. It has no terminal state; the run horizon cuts it
//! off, or `max_count` / an exhausted trace stops it early.

use bevy_ecs::prelude::Resource;
use rand::distributions::WeightedIndex;

use crate::distributions::InterArrivalDistribution;
use crate::error::ConfigError;
use crate::rng::SimRng;

/// Configuration for the vehicle generator.
#[derive(Debug)]
pub struct VehicleGeneratorConfig {
    /// Inter-arrival time distribution.
    pub inter_arrival_dist: Box<dyn InterArrivalDistribution>,
    /// Relative weight of each fuel type; index matches the station's fuel table.
    pub fuel_weights: Vec<f64>,
    /// Optional: stop admitting after this many vehicles. If None, admits until the horizon.
    pub max_count: Option<usize>,
    /// Vehicles admitted at the start instant before the first sampled gap.
    pub initial_count: usize,
}

#[derive(Debug, Resource)]
pub struct VehicleGenerator {
    pub config: VehicleGeneratorConfig,
    fuel_table: WeightedIndex<f64>,
    spawned_count: usize,
    initialized: bool,
    next_arrival_at: Option<f64>,
}

impl VehicleGenerator {
    pub fn new(config: VehicleGeneratorConfig) -> Result<Self, ConfigError> {
        let fuel_table = fuel_table(&config.fuel_weights)?;
        Ok(Self {
            config,
            fuel_table,
            spawned_count: 0,
            initialized: false,
            next_arrival_at: None,
        })
    }

    pub fn spawned_count(&self) -> usize {
        self.spawned_count
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    pub fn next_arrival_at(&self) -> Option<f64> {
        self.next_arrival_at
    }

    /// Whether another vehicle may still be admitted.
    pub fn should_spawn(&self) -> bool {
        self.config
            .max_count
            .map_or(true, |max| self.spawned_count < max)
    }

    /// Count one admitted vehicle and return its 1-based sequence number.
    pub fn record_spawn(&mut self) -> u64 {
        self.spawned_count += 1;
        self.spawned_count as u64
    }

    /// Draw the fuel type of the next vehicle.
    pub fn sample_fuel(&self, rng: &mut SimRng) -> usize {
        rng.choose_weighted(&self.fuel_table)
    }

    /// Sample the gap to the next arrival and return its absolute time, or `None`
    /// when the generator is done (cap reached or the distribution never fires again).
    pub fn advance(&mut self, now: f64, rng: &mut SimRng) -> Option<f64> {
        if !self.should_spawn() {
            self.next_arrival_at = None;
            return None;
        }
        let gap = self
            .config
            .inter_arrival_dist
            .sample(rng, self.spawned_count as u64, now);
        let next = now + gap.max(0.0);
        self.next_arrival_at = next.is_finite().then_some(next);
        self.next_arrival_at
    }
}

fn fuel_table(weights: &[f64]) -> Result<WeightedIndex<f64>, ConfigError> {
    if weights.is_empty() {
        return Err(ConfigError::EmptyWeightTable { table: "fuel type" });
    }
    WeightedIndex::new(weights).map_err(|_| ConfigError::NonPositiveWeightTotal {
        table: "fuel type",
        total: weights.iter().sum(),
    })
}
