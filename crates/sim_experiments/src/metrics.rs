//! Metrics extraction from station runs and aggregation across replications.

use serde::Serialize;
use sim_core::report::StationReport;

use crate::parameters::ParameterSet;

/// Flat record of one simulation run: parameter columns followed by metrics.
///
/// Waiting-time means are `None` when the run recorded no sample for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    pub employee_capacity: u32,
    pub arrival_profile: String,
    pub acquisition_policy: String,
    /// Simulated minutes.
    pub elapsed: f64,
    pub vehicles_arrived: u64,
    pub vehicles_served: u64,
    pub vehicles_in_system: u64,
    /// Vehicles served per simulated hour.
    pub throughput_per_hour: f64,
    pub mean_queue_wait: Option<f64>,
    pub median_queue_wait: Option<f64>,
    pub p90_queue_wait: Option<f64>,
    pub mean_dispenser_wait: Option<f64>,
    pub mean_employee_wait: Option<f64>,
    pub mean_service_duration: Option<f64>,
    pub mean_system_time: Option<f64>,
    pub employee_utilization: f64,
    /// Capacity-weighted utilization over all dispenser pools.
    pub dispenser_utilization: f64,
    /// Highest utilization of any single dispenser pool.
    pub max_dispenser_utilization: f64,
}

impl SimulationResult {
    pub fn from_report(param_set: &ParameterSet, report: &StationReport) -> Self {
        let config = &param_set.config;
        let employee_utilization = report
            .pool("employee")
            .map(|pool| pool.utilization)
            .unwrap_or(0.0);

        let dispensers: Vec<_> = report
            .pools
            .iter()
            .filter(|pool| pool.name.starts_with("dispenser:"))
            .collect();
        let dispenser_capacity: u32 = dispensers.iter().map(|pool| pool.capacity).sum();
        let dispenser_busy: f64 = dispensers.iter().map(|pool| pool.busy_time).sum();
        let dispenser_utilization = if dispenser_capacity > 0 && report.elapsed > 0.0 {
            (dispenser_busy / (dispenser_capacity as f64 * report.elapsed)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let max_dispenser_utilization = dispensers
            .iter()
            .map(|pool| pool.utilization)
            .fold(0.0, f64::max);

        let throughput_per_hour = if report.elapsed > 0.0 {
            report.vehicles_served as f64 / report.elapsed * 60.0
        } else {
            0.0
        };

        Self {
            experiment_id: param_set.experiment_id.clone(),
            run_id: param_set.run_id,
            seed: param_set.seed,
            employee_capacity: config.employee_capacity,
            arrival_profile: config.arrival_profile.as_str().to_string(),
            acquisition_policy: config.acquisition_policy.as_str().to_string(),
            elapsed: report.elapsed,
            vehicles_arrived: report.vehicles_arrived,
            vehicles_served: report.vehicles_served as u64,
            vehicles_in_system: report.vehicles_in_system as u64,
            throughput_per_hour,
            mean_queue_wait: report.mean_queue_wait,
            median_queue_wait: report.median_queue_wait,
            p90_queue_wait: report.p90_queue_wait,
            mean_dispenser_wait: report.mean_dispenser_wait,
            mean_employee_wait: report.mean_employee_wait,
            mean_service_duration: report.mean_service_duration,
            mean_system_time: report.mean_system_time,
            employee_utilization,
            dispenser_utilization,
            max_dispenser_utilization,
        }
    }
}

/// Mean and sample standard deviation of one metric across replications.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Replications that produced a value.
    pub n: usize,
    pub mean: Option<f64>,
    /// `None` with fewer than two values.
    pub std_dev: Option<f64>,
}

impl MetricSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                n,
                mean: None,
                std_dev: None,
            };
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let std_dev = (n > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });
        Self {
            n,
            mean: Some(mean),
            std_dev,
        }
    }

    fn from_options(values: impl Iterator<Item = Option<f64>>) -> Self {
        let values: Vec<f64> = values.flatten().collect();
        Self::from_values(&values)
    }
}

/// Replications of one configuration folded together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub experiment_id: String,
    pub employee_capacity: u32,
    pub arrival_profile: String,
    pub acquisition_policy: String,
    pub replications: usize,
    pub vehicles_served: MetricSummary,
    pub throughput_per_hour: MetricSummary,
    pub mean_queue_wait: MetricSummary,
    pub p90_queue_wait: MetricSummary,
    pub mean_system_time: MetricSummary,
    pub employee_utilization: MetricSummary,
    pub dispenser_utilization: MetricSummary,
}

/// Group results by `experiment_id` (first-seen order) and summarise each group.
pub fn summarize_replications(results: &[SimulationResult]) -> Vec<ReplicationSummary> {
    let mut groups: Vec<(&str, Vec<&SimulationResult>)> = Vec::new();
    for result in results {
        match groups
            .iter_mut()
            .find(|(id, _)| *id == result.experiment_id)
        {
            Some((_, members)) => members.push(result),
            None => groups.push((result.experiment_id.as_str(), vec![result])),
        }
    }

    groups
        .into_iter()
        .map(|(experiment_id, members)| {
            let first = members[0];
            let floats = |f: fn(&SimulationResult) -> f64| {
                MetricSummary::from_values(&members.iter().map(|r| f(r)).collect::<Vec<_>>())
            };
            let options = |f: fn(&SimulationResult) -> Option<f64>| {
                MetricSummary::from_options(members.iter().map(|r| f(r)))
            };
            ReplicationSummary {
                experiment_id: experiment_id.to_string(),
                employee_capacity: first.employee_capacity,
                arrival_profile: first.arrival_profile.clone(),
                acquisition_policy: first.acquisition_policy.clone(),
                replications: members.len(),
                vehicles_served: floats(|r| r.vehicles_served as f64),
                throughput_per_hour: floats(|r| r.throughput_per_hour),
                mean_queue_wait: options(|r| r.mean_queue_wait),
                p90_queue_wait: options(|r| r.p90_queue_wait),
                mean_system_time: options(|r| r.mean_system_time),
                employee_utilization: floats(|r| r.employee_utilization),
                dispenser_utilization: floats(|r| r.dispenser_utilization),
            }
        })
        .collect()
}
