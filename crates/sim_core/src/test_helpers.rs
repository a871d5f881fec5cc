//! Test helpers for common test setup and utilities.
//!
//! Deterministic station layouts shared by unit tests, integration tests and benches.

use bevy_ecs::prelude::World;

use crate::distributions::{ServiceTime, TraceInterArrival};
use crate::error::ConfigError;
use crate::scenario::{
    build_station_with_arrivals, FuelTypeConfig, PaymentMethodConfig, StationConfig,
};

/// One fuel type with one dispenser, one employee, fixed `service_minutes`
/// fueling and instant payment. Every vehicle needs the same two pools.
pub fn single_lane_config(service_minutes: f64) -> StationConfig {
    StationConfig {
        sim_duration: 60.0,
        employee_capacity: 1,
        fuel_types: vec![FuelTypeConfig {
            name: "petrol".to_string(),
            weight: 1.0,
            dispensers: 1,
            service: ServiceTime::Fixed {
                minutes: service_minutes,
            },
        }],
        payment_methods: vec![PaymentMethodConfig {
            name: "cash".to_string(),
            weight: 1.0,
            duration: ServiceTime::Fixed { minutes: 0.0 },
        }],
        ..StationConfig::default()
    }
}

/// Build `config` with vehicles arriving exactly at `arrival_times`.
pub fn build_traced_station(
    world: &mut World,
    config: &StationConfig,
    arrival_times: Vec<f64>,
) -> Result<(), ConfigError> {
    build_station_with_arrivals(
        world,
        config,
        Box::new(TraceInterArrival::new(arrival_times)),
        None,
    )
}

/// Create a station world with traced arrivals, panicking on invalid configuration.
pub fn create_traced_world(config: &StationConfig, arrival_times: Vec<f64>) -> World {
    let mut world = World::new();
    build_traced_station(&mut world, config, arrival_times)
        .expect("test station config should be valid");
    world
}
