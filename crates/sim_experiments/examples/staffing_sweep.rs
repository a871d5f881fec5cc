//! Example: staffing sweep across arrival profiles and acquisition policies.
//!
//! Runs every (employees, profile, policy) combination with several seeds,
//! prints mean ± std per configuration, and writes the raw runs and the
//! summaries to the output directory (default: current directory).
//!
//! Run with: cargo run -p sim_experiments --example staffing_sweep --release [-- <out_dir>]

use std::path::PathBuf;

use sim_core::scenario::{AcquisitionPolicy, ArrivalProfile};
use sim_experiments::{
    export_summaries_to_csv, export_to_csv, export_to_parquet, run_parallel_experiments,
    summarize_replications, MetricSummary, ParameterSpace,
};
use tracing_subscriber::EnvFilter;

fn fmt_summary(summary: &MetricSummary) -> String {
    match (summary.mean, summary.std_dev) {
        (Some(mean), Some(std)) => format!("{mean:7.2} ± {std:5.2}"),
        (Some(mean), None) => format!("{mean:7.2}"),
        _ => "n/a".to_string(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let space = ParameterSpace::grid()
        .employee_capacity(vec![1, 2, 3, 4])
        .arrival_profile(vec![ArrivalProfile::Normal, ArrivalProfile::Peak])
        .acquisition_policy(vec![AcquisitionPolicy::Composite, AcquisitionPolicy::Sequential])
        .replications(1, 10);

    println!("Running {} simulations...", space.len());
    let results = run_parallel_experiments(space.generate(), None)?;
    let summaries = summarize_replications(&results);

    println!(
        "\n{:>9} {:>7} {:>11} {:>17} {:>17} {:>17}",
        "employees", "profile", "policy", "served", "queue wait", "employee util"
    );
    for summary in &summaries {
        println!(
            "{:>9} {:>7} {:>11} {:>17} {:>17} {:>17}",
            summary.employee_capacity,
            summary.arrival_profile,
            summary.acquisition_policy,
            fmt_summary(&summary.vehicles_served),
            fmt_summary(&summary.mean_queue_wait),
            fmt_summary(&summary.employee_utilization),
        );
    }

    export_to_csv(&results, out_dir.join("staffing_runs.csv"))?;
    export_to_parquet(&results, out_dir.join("staffing_runs.parquet"))?;
    export_summaries_to_csv(&summaries, out_dir.join("staffing_summary.csv"))?;
    println!("\nWrote results to {}", out_dir.display());

    Ok(())
}
