//! Parameter variation framework for exploring station configurations.
//!
//! A [ParameterSpace] holds a base [StationConfig] plus the values to sweep on
//! each axis. [ParameterSpace::generate] expands the Cartesian product, one
//! [ParameterSet] per (configuration, seed) pair.

use sim_core::scenario::{AcquisitionPolicy, ArrivalProfile, StationConfig};

/// One configuration on the grid, before seeds are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ParameterCombination {
    employee_capacity: u32,
    arrival_profile: ArrivalProfile,
    acquisition_policy: AcquisitionPolicy,
}

/// Axis values with empty axes filled in from the base configuration.
struct ParameterVariations {
    employee_capacities: Vec<u32>,
    arrival_profiles: Vec<ArrivalProfile>,
    acquisition_policies: Vec<AcquisitionPolicy>,
}

impl ParameterVariations {
    fn from_space(space: &ParameterSpace) -> Self {
        fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
            if values.is_empty() {
                vec![base]
            } else {
                values.to_vec()
            }
        }

        Self {
            employee_capacities: or_base(&space.employee_capacities, space.base.employee_capacity),
            arrival_profiles: or_base(&space.arrival_profiles, space.base.arrival_profile),
            acquisition_policies: or_base(
                &space.acquisition_policies,
                space.base.acquisition_policy,
            ),
        }
    }

    fn generate_combinations(&self) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.employee_capacities.iter().flat_map(move |&employee_capacity| {
            self.arrival_profiles.iter().flat_map(move |&arrival_profile| {
                self.acquisition_policies
                    .iter()
                    .map(move |&acquisition_policy| ParameterCombination {
                        employee_capacity,
                        arrival_profile,
                        acquisition_policy,
                    })
            })
        })
    }
}

/// A single station configuration for one simulation run.
///
/// Runs sharing an `experiment_id` differ only in their seed and are
/// replications of the same configuration.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    /// Station configuration, seed not yet applied.
    pub config: StationConfig,
    /// Identifier shared by all replications of this configuration.
    pub experiment_id: String,
    /// Replication index within the experiment.
    pub run_id: usize,
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(config: StationConfig, experiment_id: String, run_id: usize, seed: u64) -> Self {
        Self {
            config,
            experiment_id,
            run_id,
            seed,
        }
    }

    /// The configuration with this run's seed applied.
    pub fn station_config(&self) -> StationConfig {
        self.config.clone().with_seed(self.seed)
    }
}

/// Grid of station configurations to explore.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    base: StationConfig,
    employee_capacities: Vec<u32>,
    arrival_profiles: Vec<ArrivalProfile>,
    acquisition_policies: Vec<AcquisitionPolicy>,
    seeds: Vec<u64>,
}

impl ParameterSpace {
    /// Create a parameter space over the default station.
    pub fn new() -> Self {
        Self {
            base: StationConfig::default(),
            employee_capacities: vec![],
            arrival_profiles: vec![],
            acquisition_policies: vec![],
            seeds: vec![],
        }
    }

    /// Create a new parameter space for grid search.
    pub fn grid() -> Self {
        Self::new()
    }

    pub fn employee_capacity(mut self, capacities: Vec<u32>) -> Self {
        self.employee_capacities = capacities;
        self
    }

    pub fn arrival_profile(mut self, profiles: Vec<ArrivalProfile>) -> Self {
        self.arrival_profiles = profiles;
        self
    }

    pub fn acquisition_policy(mut self, policies: Vec<AcquisitionPolicy>) -> Self {
        self.acquisition_policies = policies;
        self
    }

    /// Seeds to replicate every configuration with. Defaults to the base seed.
    pub fn seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Replicate every configuration with `count` consecutive seeds starting at `first`.
    pub fn replications(self, first: u64, count: usize) -> Self {
        let seeds = (0..count as u64).map(|i| first.wrapping_add(i)).collect();
        self.seeds(seeds)
    }

    /// Set base configuration (used for axes left empty).
    pub fn with_base(mut self, base: StationConfig) -> Self {
        self.base = base;
        self
    }

    /// Number of parameter sets [Self::generate] will return.
    pub fn len(&self) -> usize {
        let variations = ParameterVariations::from_space(self);
        variations.employee_capacities.len()
            * variations.arrival_profiles.len()
            * variations.acquisition_policies.len()
            * self.seeds.len().max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand the grid. Configurations are ordered by employee capacity, then
    /// arrival profile, then acquisition policy; seeds vary fastest.
    pub fn generate(&self) -> Vec<ParameterSet> {
        let variations = ParameterVariations::from_space(self);
        let seeds = if self.seeds.is_empty() {
            vec![self.base.seed]
        } else {
            self.seeds.clone()
        };

        variations
            .generate_combinations()
            .enumerate()
            .flat_map(|(experiment_id, combo)| {
                let config = self
                    .base
                    .clone()
                    .with_employee_capacity(combo.employee_capacity)
                    .with_arrival_profile(combo.arrival_profile)
                    .with_acquisition_policy(combo.acquisition_policy);
                seeds
                    .iter()
                    .enumerate()
                    .map(move |(run_id, &seed)| {
                        ParameterSet::new(
                            config.clone(),
                            format!("exp_{experiment_id}"),
                            run_id,
                            seed,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}
