use bevy_ecs::prelude::{Resource, World};
use rand::distributions::WeightedIndex;

use crate::clock::SimulationClock;
use crate::distributions::{ExponentialInterArrival, InterArrivalDistribution, ServiceTime};
use crate::error::{ConfigError, KernelFault};
use crate::generator::{VehicleGenerator, VehicleGeneratorConfig};
use crate::profiling::EventMetrics;
use crate::resources::{PoolId, ResourcePools};
use crate::rng::SimRng;
use crate::scenario::params::{AcquisitionPolicy, SimulationHorizon, StationConfig};
use crate::telemetry::StationTelemetry;

/// Static layout of the station: which pool serves what, and how long service takes.
#[derive(Debug, Resource)]
pub struct StationModel {
    pub employee: PoolId,
    /// Dispenser pool per configured fuel type, same order.
    pub dispensers: Vec<PoolId>,
    pub fuel_service: Vec<ServiceTime>,
    pub payment_durations: Vec<ServiceTime>,
    payment_table: WeightedIndex<f64>,
    pub policy: AcquisitionPolicy,
}

impl StationModel {
    pub fn dispenser(&self, fuel: usize) -> Option<PoolId> {
        self.dispensers.get(fuel).copied()
    }

    pub fn sample_payment(&self, rng: &mut SimRng) -> usize {
        rng.choose_weighted(&self.payment_table)
    }

    pub fn sample_fuel_time(&self, fuel: usize, rng: &mut SimRng) -> f64 {
        self.fuel_service
            .get(fuel)
            .map_or(0.0, |service| service.sample(rng))
    }

    pub fn sample_payment_time(&self, payment: usize, rng: &mut SimRng) -> f64 {
        self.payment_durations
            .get(payment)
            .map_or(0.0, |duration| duration.sample(rng))
    }
}

/// Build a station world from `config`, with Poisson arrivals at the rate of the
/// configured [crate::scenario::ArrivalProfile].
pub fn build_station(world: &mut World, config: &StationConfig) -> Result<(), ConfigError> {
    let arrivals = Box::new(ExponentialInterArrival::new(config.arrival_rate()));
    build_station_with_arrivals(world, config, arrivals, None)
}

/// Build a station world with a caller-supplied arrival process. Used for
/// deterministic traces and capped arrival counts.
pub fn build_station_with_arrivals(
    world: &mut World,
    config: &StationConfig,
    arrivals: Box<dyn InterArrivalDistribution>,
    max_count: Option<usize>,
) -> Result<(), ConfigError> {
    config.validate()?;

    let mut pools = ResourcePools::default();
    let employee = pools.add_pool("employee", config.employee_capacity)?;
    let dispensers = config
        .fuel_types
        .iter()
        .map(|fuel| pools.add_pool(format!("dispenser:{}", fuel.name), fuel.dispensers))
        .collect::<Result<Vec<_>, _>>()?;

    let payment_weights = config.payment_weights();
    let payment_table =
        WeightedIndex::new(&payment_weights).map_err(|_| ConfigError::NonPositiveWeightTotal {
            table: "payment method",
            total: payment_weights.iter().sum(),
        })?;

    let model = StationModel {
        employee,
        dispensers,
        fuel_service: config.fuel_types.iter().map(|f| f.service).collect(),
        payment_durations: config.payment_methods.iter().map(|p| p.duration).collect(),
        payment_table,
        policy: config.acquisition_policy,
    };

    let generator = VehicleGenerator::new(VehicleGeneratorConfig {
        inter_arrival_dist: arrivals,
        fuel_weights: config.fuel_weights(),
        max_count,
        initial_count: 0,
    })?;

    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimRng::seed_from_u64(config.seed));
    world.insert_resource(pools);
    world.insert_resource(model);
    world.insert_resource(generator);
    world.insert_resource(StationTelemetry::default());
    world.insert_resource(KernelFault::default());
    world.insert_resource(EventMetrics::default());
    world.insert_resource(SimulationHorizon(config.sim_duration));

    tracing::info!(
        seed = config.seed,
        horizon = config.sim_duration,
        employees = config.employee_capacity,
        fuel_types = config.fuel_types.len(),
        profile = ?config.arrival_profile,
        policy = ?config.acquisition_policy,
        "station built"
    );
    Ok(())
}
