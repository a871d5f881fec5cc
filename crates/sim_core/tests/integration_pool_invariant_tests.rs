mod support;

use bevy_ecs::prelude::World;
use sim_core::report::extract_report;
use sim_core::resources::ResourcePools;
use sim_core::scenario::{build_station, ArrivalProfile, StationConfig};
use support::schedule::ScheduleRunner;
use support::world::TestWorldBuilder;

fn busy_station() -> World {
    let config = StationConfig::default()
        .with_arrival_profile(ArrivalProfile::Peak)
        .with_employee_capacity(1)
        .with_seed(11);
    let mut world = World::new();
    build_station(&mut world, &config).expect("build");
    world
}

#[test]
fn pools_stay_within_bounds_at_every_instant() {
    let mut world = busy_station();
    let mut last_time = 0.0;
    let mut checked = 0usize;
    ScheduleRunner::new()
        .run_to_with_hook(&mut world, 480.0, |world, event| {
            assert!(event.timestamp >= last_time, "clock moved backwards");
            last_time = event.timestamp;
            let pools = world.resource::<ResourcePools>();
            pools.check_invariants().expect("held <= capacity");
            for pool in pools.pools() {
                assert!(pool.held() <= pool.capacity());
            }
            checked += 1;
        })
        .expect("run");
    assert!(checked > 100, "expected a busy day, saw {checked} events");
}

#[test]
fn utilization_never_exceeds_one() {
    let mut world = busy_station();
    ScheduleRunner::new().run_to(&mut world, 480.0).expect("run");
    let report = extract_report(&mut world).expect("report");
    let employee = report.pool("employee").expect("employee");
    assert!(employee.utilization > 0.5, "one employee at peak should be busy");
    for pool in &report.pools {
        assert!((0.0..=1.0).contains(&pool.utilization), "{} = {}", pool.name, pool.utilization);
        assert!(pool.busy_time <= pool.capacity as f64 * report.elapsed + 1e-9);
    }
}

#[test]
fn every_arrival_is_served_or_still_in_system() {
    let mut world = busy_station();
    ScheduleRunner::new().run_to(&mut world, 480.0).expect("run");
    let report = extract_report(&mut world).expect("report");
    assert_eq!(
        report.vehicles_arrived as usize,
        report.vehicles_served + report.vehicles_in_system
    );
}

#[test]
fn overlapping_requests_drain_without_deadlock() {
    // Two dispensers share one employee; everybody needs both pools.
    let arrivals: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
    let mut world = TestWorldBuilder::new()
        .with_dispensers(2)
        .with_fixed_service(0.5)
        .with_arrivals(&arrivals)
        .build();
    ScheduleRunner::new().run_to(&mut world, 120.0).expect("run");
    let report = extract_report(&mut world).expect("report");
    assert_eq!(report.vehicles_served, 40);
    assert_eq!(report.vehicles_in_system, 0);
    let pools = world.resource::<ResourcePools>();
    assert!(pools.pools().iter().all(|p| p.held() == 0));
    assert_eq!(pools.waiting_requests().count(), 0);
}
