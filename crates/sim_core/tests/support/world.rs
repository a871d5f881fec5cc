#![allow(dead_code)]

use bevy_ecs::prelude::World;
use sim_core::distributions::ServiceTime;
use sim_core::scenario::{AcquisitionPolicy, StationConfig};
use sim_core::test_helpers::{create_traced_world, single_lane_config};

/// Helper that builds a station world with scripted arrivals for integration tests.
#[derive(Debug, Clone)]
pub struct TestWorldBuilder {
    config: StationConfig,
    arrivals: Vec<f64>,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self {
            config: single_lane_config(5.0),
            arrivals: Vec::new(),
        }
    }
}

impl TestWorldBuilder {
    /// Single dispenser, single employee, 5 minute fixed service, no arrivals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary configuration.
    pub fn from_config(config: StationConfig) -> Self {
        Self {
            config,
            arrivals: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_horizon(mut self, minutes: f64) -> Self {
        self.config.sim_duration = minutes;
        self
    }

    pub fn with_employees(mut self, employees: u32) -> Self {
        self.config.employee_capacity = employees;
        self
    }

    pub fn with_dispensers(mut self, dispensers: u32) -> Self {
        for fuel in &mut self.config.fuel_types {
            fuel.dispensers = dispensers;
        }
        self
    }

    /// Fixed fueling time for every fuel type.
    pub fn with_fixed_service(mut self, minutes: f64) -> Self {
        for fuel in &mut self.config.fuel_types {
            fuel.service = ServiceTime::Fixed { minutes };
        }
        self
    }

    /// Fixed payment time for every payment method.
    pub fn with_fixed_payment(mut self, minutes: f64) -> Self {
        for method in &mut self.config.payment_methods {
            method.duration = ServiceTime::Fixed { minutes };
        }
        self
    }

    pub fn with_policy(mut self, policy: AcquisitionPolicy) -> Self {
        self.config.acquisition_policy = policy;
        self
    }

    /// Vehicles arrive at exactly these times.
    pub fn with_arrivals(mut self, times: &[f64]) -> Self {
        self.arrivals = times.to_vec();
        self
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn build(self) -> World {
        create_traced_world(&self.config, self.arrivals)
    }
}
