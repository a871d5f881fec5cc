use bevy_ecs::prelude::{Commands, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::Vehicle;
use crate::generator::VehicleGenerator;
use crate::rng::SimRng;
use crate::telemetry::StationTelemetry;

/// Admit one vehicle now and schedule the start of its process.
fn admit_vehicle(
    commands: &mut Commands,
    clock: &mut SimulationClock,
    generator: &mut VehicleGenerator,
    rng: &mut SimRng,
    telemetry: &mut StationTelemetry,
) {
    let now = clock.now();
    let fuel = generator.sample_fuel(rng);
    let id = generator.record_spawn();
    let entity = commands.spawn(Vehicle::new(id, fuel, now)).id();
    telemetry.vehicles_arrived += 1;
    clock.schedule_in(0.0, EventKind::ProcessStarted, Some(EventSubject::Vehicle(entity)));
    tracing::debug!(vehicle = id, fuel, at = now, "vehicle arrived");
}

fn schedule_next_arrival(
    clock: &mut SimulationClock,
    generator: &mut VehicleGenerator,
    rng: &mut SimRng,
) {
    if let Some(at) = generator.advance(clock.now(), rng) {
        clock.schedule_at(at, EventKind::VehicleArrival, None);
    }
}

/// Starts the generator: admits the initial burst, then schedules the first arrival.
pub fn simulation_started_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    generator: Option<ResMut<VehicleGenerator>>,
    mut rng: ResMut<SimRng>,
    mut telemetry: ResMut<StationTelemetry>,
) {
    let Some(mut generator) = generator else {
        return;
    };
    if generator.initialized() {
        return;
    }
    generator.set_initialized(true);

    for _ in 0..generator.config.initial_count {
        if !generator.should_spawn() {
            break;
        }
        admit_vehicle(&mut commands, &mut clock, &mut generator, &mut rng, &mut telemetry);
    }
    schedule_next_arrival(&mut clock, &mut generator, &mut rng);
}

/// Generator resume point: admit a vehicle, then sleep until the next arrival.
pub fn vehicle_arrival_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut generator: ResMut<VehicleGenerator>,
    mut rng: ResMut<SimRng>,
    mut telemetry: ResMut<StationTelemetry>,
) {
    if event.0.kind != EventKind::VehicleArrival || !generator.should_spawn() {
        return;
    }
    admit_vehicle(&mut commands, &mut clock, &mut generator, &mut rng, &mut telemetry);
    schedule_next_arrival(&mut clock, &mut generator, &mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};
    use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

    use crate::distributions::FixedInterArrival;
    use crate::generator::VehicleGeneratorConfig;

    fn world_with_generator(initial_count: usize, max_count: Option<usize>) -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimRng::seed_from_u64(5));
        world.insert_resource(StationTelemetry::default());
        world.insert_resource(
            VehicleGenerator::new(VehicleGeneratorConfig {
                inter_arrival_dist: Box::new(FixedInterArrival::new(3.0)),
                fuel_weights: vec![1.0],
                max_count,
                initial_count,
            })
            .expect("generator"),
        );
        world
    }

    #[test]
    fn start_admits_initial_burst_and_schedules_first_arrival() {
        let mut world = world_with_generator(2, None);
        let mut schedule = Schedule::default();
        schedule.add_systems((simulation_started_system, apply_deferred).chain());
        schedule.run(&mut world);

        let vehicles: Vec<_> = world.query::<&Vehicle>().iter(&world).map(|v| v.id).collect();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(world.resource::<StationTelemetry>().vehicles_arrived, 2);

        let mut clock = world.resource_mut::<SimulationClock>();
        assert_eq!(clock.pending_event_count(), 3);
        let kinds: Vec<_> = std::iter::from_fn(|| clock.pop_next()).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::ProcessStarted, EventKind::ProcessStarted, EventKind::VehicleArrival]
        );
        assert_eq!(clock.now(), 3.0);
    }

    #[test]
    fn start_runs_once() {
        let mut world = world_with_generator(1, None);
        let mut schedule = Schedule::default();
        schedule.add_systems((simulation_started_system, apply_deferred).chain());
        schedule.run(&mut world);
        schedule.run(&mut world);
        assert_eq!(world.resource::<StationTelemetry>().vehicles_arrived, 1);
    }

    #[test]
    fn capped_generator_stops_rescheduling() {
        let mut world = world_with_generator(0, Some(1));
        world.insert_resource(CurrentEvent(crate::clock::Event {
            timestamp: 0.0,
            seq: 0,
            kind: EventKind::VehicleArrival,
            subject: None,
        }));
        let mut schedule = Schedule::default();
        schedule.add_systems((vehicle_arrival_system, apply_deferred).chain());
        schedule.run(&mut world);

        assert_eq!(world.resource::<StationTelemetry>().vehicles_arrived, 1);
        let clock = world.resource::<SimulationClock>();
        assert_eq!(clock.pending_event_count(), 1, "only the ProcessStarted event");
    }
}
