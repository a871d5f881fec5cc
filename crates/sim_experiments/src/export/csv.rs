use crate::metrics::{MetricSummary, ReplicationSummary, SimulationResult};

use super::writer_utils::optional_field;

pub(crate) fn export_to_csv_impl(
    results: &[SimulationResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "experiment_id",
        "run_id",
        "seed",
        "employee_capacity",
        "arrival_profile",
        "acquisition_policy",
        "elapsed",
        "vehicles_arrived",
        "vehicles_served",
        "vehicles_in_system",
        "throughput_per_hour",
        "mean_queue_wait",
        "median_queue_wait",
        "p90_queue_wait",
        "mean_dispenser_wait",
        "mean_employee_wait",
        "mean_service_duration",
        "mean_system_time",
        "employee_utilization",
        "dispenser_utilization",
        "max_dispenser_utilization",
    ])?;

    for result in results {
        wtr.write_record([
            result.experiment_id.clone(),
            result.run_id.to_string(),
            result.seed.to_string(),
            result.employee_capacity.to_string(),
            result.arrival_profile.clone(),
            result.acquisition_policy.clone(),
            result.elapsed.to_string(),
            result.vehicles_arrived.to_string(),
            result.vehicles_served.to_string(),
            result.vehicles_in_system.to_string(),
            result.throughput_per_hour.to_string(),
            optional_field(result.mean_queue_wait),
            optional_field(result.median_queue_wait),
            optional_field(result.p90_queue_wait),
            optional_field(result.mean_dispenser_wait),
            optional_field(result.mean_employee_wait),
            optional_field(result.mean_service_duration),
            optional_field(result.mean_system_time),
            result.employee_utilization.to_string(),
            result.dispenser_utilization.to_string(),
            result.max_dispenser_utilization.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

const SUMMARY_METRICS: [&str; 7] = [
    "vehicles_served",
    "throughput_per_hour",
    "mean_queue_wait",
    "p90_queue_wait",
    "mean_system_time",
    "employee_utilization",
    "dispenser_utilization",
];

fn summary_metrics(summary: &ReplicationSummary) -> [&MetricSummary; 7] {
    [
        &summary.vehicles_served,
        &summary.throughput_per_hour,
        &summary.mean_queue_wait,
        &summary.p90_queue_wait,
        &summary.mean_system_time,
        &summary.employee_utilization,
        &summary.dispenser_utilization,
    ]
}

pub(crate) fn export_summaries_to_csv_impl(
    summaries: &[ReplicationSummary],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    let mut header: Vec<String> = [
        "experiment_id",
        "employee_capacity",
        "arrival_profile",
        "acquisition_policy",
        "replications",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for metric in SUMMARY_METRICS {
        header.push(format!("{metric}_mean"));
        header.push(format!("{metric}_std"));
    }
    wtr.write_record(&header)?;

    for summary in summaries {
        let mut row = vec![
            summary.experiment_id.clone(),
            summary.employee_capacity.to_string(),
            summary.arrival_profile.clone(),
            summary.acquisition_policy.clone(),
            summary.replications.to_string(),
        ];
        for metric in summary_metrics(summary) {
            row.push(optional_field(metric.mean));
            row.push(optional_field(metric.std_dev));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
