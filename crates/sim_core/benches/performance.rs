//! Performance benchmarks for sim_core using Criterion.rs.

use bevy_ecs::prelude::{Entity, World};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sim_core::resources::ResourcePools;
use sim_core::runner::{initialize_simulation, run_until_horizon, simulation_schedule};
use sim_core::scenario::{build_station, AcquisitionPolicy, ArrivalProfile, StationConfig};

fn bench_station_day(c: &mut Criterion) {
    let scenarios = vec![
        ("normal", ArrivalProfile::Normal, 480.0),
        ("peak", ArrivalProfile::Peak, 480.0),
        ("peak_week", ArrivalProfile::Peak, 7.0 * 480.0),
    ];

    let mut group = c.benchmark_group("station_run");
    for (name, profile, horizon) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(profile, horizon),
            |b, &(profile, horizon)| {
                b.iter(|| {
                    let mut world = World::new();
                    let config = StationConfig::default()
                        .with_seed(42)
                        .with_arrival_profile(profile)
                        .with_sim_duration(horizon);
                    build_station(&mut world, &config).expect("valid config");
                    initialize_simulation(&mut world);
                    let mut schedule = simulation_schedule();
                    black_box(run_until_horizon(&mut world, &mut schedule, horizon).expect("run"));
                });
            },
        );
    }
    group.finish();
}

fn bench_acquisition_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquisition_policy");
    for policy in [AcquisitionPolicy::Composite, AcquisitionPolicy::Sequential] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{policy:?}")),
            &policy,
            |b, &policy| {
                b.iter(|| {
                    let config = StationConfig::second_site()
                        .with_arrival_profile(ArrivalProfile::Peak)
                        .with_acquisition_policy(policy);
                    black_box(sim_core::runner::run_station(&config).expect("run"));
                });
            },
        );
    }
    group.finish();
}

fn bench_contended_pool(c: &mut Criterion) {
    c.bench_function("acquire_release_1000_waiters", |b| {
        b.iter(|| {
            let mut pools = ResourcePools::default();
            let dispenser = pools.add_pool("dispenser", 2).expect("pool");
            let employee = pools.add_pool("employee", 1).expect("pool");
            for i in 0..1000u32 {
                pools
                    .acquire_all(Entity::from_raw(i), &[dispenser, employee])
                    .expect("acquire");
            }
            for _ in 0..1000 {
                black_box(pools.release_all(&[dispenser, employee]).expect("release"));
            }
        });
    });
}

criterion_group!(benches, bench_station_day, bench_acquisition_policy, bench_contended_pool);
criterion_main!(benches);
