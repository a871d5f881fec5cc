//! Run one station day and print the report.
//!
//! Run with: cargo run -p sim_core --example station_run [-- peak|second-site|sequential]
//! Set RUST_LOG=sim_core=debug for per-vehicle tracing.

use bevy_ecs::prelude::World;
use sim_core::profiling::EventMetrics;
use sim_core::report::extract_report;
use sim_core::runner::{initialize_simulation, run_until_horizon, simulation_schedule};
use sim_core::scenario::{build_station, AcquisitionPolicy, ArrivalProfile, StationConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1).as_deref() {
        Some("peak") => StationConfig::default().with_arrival_profile(ArrivalProfile::Peak),
        Some("second-site") => StationConfig::second_site(),
        Some("sequential") => {
            StationConfig::default().with_acquisition_policy(AcquisitionPolicy::Sequential)
        }
        _ => StationConfig::default(),
    };

    let mut world = World::new();
    build_station(&mut world, &config)?;
    initialize_simulation(&mut world);
    let mut schedule = simulation_schedule();
    let summary = run_until_horizon(&mut world, &mut schedule, config.sim_duration)?;

    println!(
        "--- Station run ({:?} arrivals, {:?} acquisition, seed {}) ---",
        config.arrival_profile, config.acquisition_policy, config.seed
    );
    println!("Steps executed: {}", summary.steps);
    println!("Events discarded at horizon: {}", summary.pending_discarded);

    if let Some(report) = extract_report(&mut world) {
        report.print_summary();
    }
    world.resource::<EventMetrics>().print_summary();
    Ok(())
}
