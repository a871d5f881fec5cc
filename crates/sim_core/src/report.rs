//! Aggregate report read back from a finished run.

use bevy_ecs::prelude::{With, World};
use serde::Serialize;

use crate::clock::SimulationClock;
use crate::ecs::Vehicle;
use crate::resources::ResourcePools;
use crate::telemetry::{SampleKind, StationTelemetry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolUtilization {
    pub name: String,
    pub capacity: u32,
    pub busy_time: f64,
    /// busy_time / (capacity × elapsed), in [0, 1].
    pub utilization: f64,
}

/// Summary statistics of one run. Means are `None` when no sample was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReport {
    pub elapsed: f64,
    pub vehicles_arrived: u64,
    pub vehicles_served: usize,
    /// Vehicles still waiting or in service when the run stopped.
    pub vehicles_in_system: usize,
    pub mean_queue_wait: Option<f64>,
    pub median_queue_wait: Option<f64>,
    pub p90_queue_wait: Option<f64>,
    pub mean_dispenser_wait: Option<f64>,
    pub mean_employee_wait: Option<f64>,
    pub mean_service_duration: Option<f64>,
    pub mean_system_time: Option<f64>,
    pub pools: Vec<PoolUtilization>,
}

impl StationReport {
    pub fn pool(&self, name: &str) -> Option<&PoolUtilization> {
        self.pools.iter().find(|pool| pool.name == name)
    }

    pub fn print_summary(&self) {
        fn minutes(value: Option<f64>) -> String {
            value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2} min"))
        }

        println!("\n=== Station Report ({:.0} min) ===", self.elapsed);
        println!("Vehicles arrived:      {}", self.vehicles_arrived);
        println!("Vehicles served:       {}", self.vehicles_served);
        println!("Vehicles in system:    {}", self.vehicles_in_system);
        println!("Mean queue wait:       {}", minutes(self.mean_queue_wait));
        println!("Median queue wait:     {}", minutes(self.median_queue_wait));
        println!("P90 queue wait:        {}", minutes(self.p90_queue_wait));
        println!("Mean dispenser wait:   {}", minutes(self.mean_dispenser_wait));
        println!("Mean employee wait:    {}", minutes(self.mean_employee_wait));
        println!("Mean service duration: {}", minutes(self.mean_service_duration));
        println!("Mean system time:      {}", minutes(self.mean_system_time));
        println!("\nUtilization:");
        for pool in &self.pools {
            println!(
                "  {:24} (cap {:2}) : {:5.1}%",
                pool.name,
                pool.capacity,
                pool.utilization * 100.0
            );
        }
    }
}

/// Build the report from the world after a run. Returns `None` if the world
/// was not built as a station.
pub fn extract_report(world: &mut World) -> Option<StationReport> {
    let vehicles_in_system = world.query_filtered::<(), With<Vehicle>>().iter(world).count();
    let elapsed = world.get_resource::<SimulationClock>()?.now();
    let telemetry = world.get_resource::<StationTelemetry>()?;
    let pools = world.get_resource::<ResourcePools>()?;

    let pools = pools
        .pools()
        .iter()
        .map(|pool| PoolUtilization {
            name: pool.name().to_string(),
            capacity: pool.capacity(),
            busy_time: telemetry.busy_time(pool.id()),
            utilization: telemetry.utilization(pool.id(), pool.capacity(), elapsed),
        })
        .collect();

    Some(StationReport {
        elapsed,
        vehicles_arrived: telemetry.vehicles_arrived,
        vehicles_served: telemetry.vehicles_served(),
        vehicles_in_system,
        mean_queue_wait: telemetry.mean(SampleKind::QueueWait),
        median_queue_wait: telemetry.percentile(SampleKind::QueueWait, 0.5),
        p90_queue_wait: telemetry.percentile(SampleKind::QueueWait, 0.9),
        mean_dispenser_wait: telemetry.mean(SampleKind::DispenserWait),
        mean_employee_wait: telemetry.mean(SampleKind::EmployeeWait),
        mean_service_duration: telemetry.mean(SampleKind::ServiceDuration),
        mean_system_time: telemetry.mean(SampleKind::SystemTime),
        pools,
    })
}
