use std::collections::HashSet;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::distributions::ServiceTime;
use crate::error::ConfigError;

/// Arrival regime, chosen once at simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalProfile {
    #[default]
    Normal,
    Peak,
}

impl ArrivalProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            ArrivalProfile::Normal => "normal",
            ArrivalProfile::Peak => "peak",
        }
    }
}

/// How a vehicle obtains its dispenser and an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionPolicy {
    /// One atomic request for both pools.
    #[default]
    Composite,
    /// Dispenser first, then an employee while still holding the dispenser.
    Sequential,
}

impl AcquisitionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AcquisitionPolicy::Composite => "composite",
            AcquisitionPolicy::Sequential => "sequential",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelTypeConfig {
    pub name: String,
    /// Relative arrival weight; weights are normalised by their total.
    pub weight: f64,
    /// Number of dispensers serving this fuel type.
    pub dispensers: u32,
    /// Fueling duration.
    pub service: ServiceTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodConfig {
    pub name: String,
    pub weight: f64,
    pub duration: ServiceTime,
}

/// Simulation end time in minutes. Events due after this time never fire.
#[derive(Debug, Clone, Copy, PartialEq, Resource)]
pub struct SimulationHorizon(pub f64);

/// Parameters for building a fuel-station run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Horizon in minutes.
    pub sim_duration: f64,
    pub employee_capacity: u32,
    pub fuel_types: Vec<FuelTypeConfig>,
    pub payment_methods: Vec<PaymentMethodConfig>,
    /// Vehicles per minute in the normal regime.
    pub normal_arrival_rate: f64,
    /// Vehicles per minute in the peak regime.
    pub peak_arrival_rate: f64,
    #[serde(default)]
    pub arrival_profile: ArrivalProfile,
    #[serde(default)]
    pub acquisition_policy: AcquisitionPolicy,
    pub seed: u64,
}

fn fuel(name: &str, weight: f64, dispensers: u32, mean: f64) -> FuelTypeConfig {
    FuelTypeConfig {
        name: name.to_string(),
        weight,
        dispensers,
        service: ServiceTime::Exponential { mean },
    }
}

fn payment(name: &str, weight: f64, minutes: f64) -> PaymentMethodConfig {
    PaymentMethodConfig {
        name: name.to_string(),
        weight,
        duration: ServiceTime::Fixed { minutes },
    }
}

impl Default for StationConfig {
    /// An 8-hour day with three employees and three fuel types.
    fn default() -> Self {
        Self {
            sim_duration: 480.0,
            employee_capacity: 3,
            fuel_types: vec![
                fuel("petrol92", 0.7, 4, 0.75),
                fuel("diesel", 0.25, 2, 4.0),
                fuel("kerosene", 0.5, 2, 3.0),
            ],
            payment_methods: vec![payment("cash", 0.85, 0.4), payment("card", 0.15, 1.0)],
            normal_arrival_rate: 1.0 / 3.0,
            peak_arrival_rate: 1.0 / 1.5,
            arrival_profile: ArrivalProfile::Normal,
            acquisition_policy: AcquisitionPolicy::Composite,
            seed: 42,
        }
    }
}

impl StationConfig {
    /// A single-employee site with busier traffic and slower card payments.
    pub fn second_site() -> Self {
        Self {
            sim_duration: 480.0,
            employee_capacity: 1,
            fuel_types: vec![
                fuel("petrol", 0.55, 4, 2.0),
                fuel("diesel", 0.30, 2, 2.2),
                fuel("kerosene", 0.15, 2, 3.0),
            ],
            payment_methods: vec![payment("cash", 0.75, 0.5), payment("card", 0.25, 2.0)],
            normal_arrival_rate: 25.0 / 60.0,
            peak_arrival_rate: 40.0 / 60.0,
            arrival_profile: ArrivalProfile::Normal,
            acquisition_policy: AcquisitionPolicy::Composite,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sim_duration(mut self, minutes: f64) -> Self {
        self.sim_duration = minutes;
        self
    }

    pub fn with_employee_capacity(mut self, employees: u32) -> Self {
        self.employee_capacity = employees;
        self
    }

    pub fn with_arrival_profile(mut self, profile: ArrivalProfile) -> Self {
        self.arrival_profile = profile;
        self
    }

    pub fn with_acquisition_policy(mut self, policy: AcquisitionPolicy) -> Self {
        self.acquisition_policy = policy;
        self
    }

    /// Arrival rate of the selected profile (vehicles per minute).
    pub fn arrival_rate(&self) -> f64 {
        match self.arrival_profile {
            ArrivalProfile::Normal => self.normal_arrival_rate,
            ArrivalProfile::Peak => self.peak_arrival_rate,
        }
    }

    pub fn fuel_weights(&self) -> Vec<f64> {
        self.fuel_types.iter().map(|f| f.weight).collect()
    }

    pub fn payment_weights(&self) -> Vec<f64> {
        self.payment_methods.iter().map(|p| p.weight).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sim_duration.is_finite() && self.sim_duration > 0.0) {
            return Err(ConfigError::InvalidHorizon {
                value: self.sim_duration,
            });
        }
        if self.employee_capacity == 0 {
            return Err(ConfigError::NonPositiveCapacity {
                pool: "employee".to_string(),
            });
        }
        for rate in [self.normal_arrival_rate, self.peak_arrival_rate] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(ConfigError::NonPositiveArrivalRate { rate });
            }
        }

        validate_weights(
            "fuel type",
            self.fuel_types.iter().map(|f| (f.name.as_str(), f.weight)),
        )?;
        for fuel in &self.fuel_types {
            if fuel.dispensers == 0 {
                return Err(ConfigError::NonPositiveCapacity {
                    pool: format!("dispenser:{}", fuel.name),
                });
            }
            validate_duration(&format!("{} fueling time", fuel.name), &fuel.service)?;
        }

        validate_weights(
            "payment method",
            self.payment_methods.iter().map(|p| (p.name.as_str(), p.weight)),
        )?;
        for method in &self.payment_methods {
            validate_duration(&format!("{} payment time", method.name), &method.duration)?;
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn validate_weights<'a>(
    table: &'static str,
    entries: impl Iterator<Item = (&'a str, f64)>,
) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut total = 0.0;
    let mut count = 0usize;
    for (name, weight) in entries {
        count += 1;
        if !names.insert(name) {
            return Err(ConfigError::DuplicateEntry {
                table,
                entry: name.to_string(),
            });
        }
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(ConfigError::InvalidWeight {
                table,
                entry: name.to_string(),
                weight,
            });
        }
        total += weight;
    }
    if count == 0 {
        return Err(ConfigError::EmptyWeightTable { table });
    }
    if total <= 0.0 {
        return Err(ConfigError::NonPositiveWeightTotal { table, total });
    }
    Ok(())
}

fn validate_duration(what: &str, duration: &ServiceTime) -> Result<(), ConfigError> {
    let value = duration.mean();
    if !(value.is_finite() && value >= 0.0) {
        return Err(ConfigError::NegativeDuration {
            what: what.to_string(),
            value,
        });
    }
    Ok(())
}
