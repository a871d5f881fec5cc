use bevy_ecs::prelude::{Commands, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::ecs::{ProcessState, Vehicle, VehiclePhase};
use crate::error::{InvariantViolation, KernelFault};
use crate::resources::ResourcePools;
use crate::telemetry::{CompletedVehicleRecord, SampleKind, StationTelemetry};

use super::{schedule_grants, vehicle_subject};

const EVENT: EventKind = EventKind::ServiceCompleted;

/// Final resume point: release every held pool, report, and terminate the vehicle.
pub fn service_completed_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut pools: ResMut<ResourcePools>,
    mut telemetry: ResMut<StationTelemetry>,
    mut fault: ResMut<KernelFault>,
    mut vehicles: Query<&mut Vehicle>,
) {
    if event.0.kind != EVENT {
        return;
    }
    let Some((entity, mut vehicle)) = vehicle_subject(&event.0)
        .and_then(|entity| vehicles.get_mut(entity).ok().map(|v| (entity, v)))
    else {
        fault.record(InvariantViolation::MissingProcess { event: EVENT.as_str() });
        return;
    };
    if vehicle.phase != VehiclePhase::InService {
        fault.record(InvariantViolation::UnexpectedResume {
            event: EVENT.as_str(),
            state: vehicle.phase.as_str(),
        });
        return;
    }

    let now = clock.now();
    vehicle.state = ProcessState::Running;
    vehicle.service_timer = None;

    let grants = match pools.release_all(vehicle.held_pools()) {
        Ok(grants) => grants,
        Err(violation) => {
            fault.record(violation);
            return;
        }
    };
    let service_duration = vehicle.service_duration.unwrap_or(0.0);
    for pool in vehicle.held.drain(..) {
        telemetry.add_busy_time(pool, service_duration);
    }
    schedule_grants(&mut clock, &grants);

    let record = CompletedVehicleRecord {
        entity,
        vehicle_id: vehicle.id,
        fuel: vehicle.fuel,
        payment: vehicle.payment.unwrap_or_default(),
        arrived_at: vehicle.arrived_at,
        service_started_at: vehicle.service_started_at.unwrap_or(now),
        completed_at: now,
        service_duration,
    };
    telemetry.record_sample(SampleKind::QueueWait, record.queue_wait());
    if let Some(wait) = vehicle.dispenser_wait {
        telemetry.record_sample(SampleKind::DispenserWait, wait);
    }
    if let Some(wait) = vehicle.employee_wait {
        telemetry.record_sample(SampleKind::EmployeeWait, wait);
    }
    telemetry.record_sample(SampleKind::ServiceDuration, service_duration);
    telemetry.record_sample(SampleKind::SystemTime, record.system_time());
    tracing::debug!(
        vehicle = record.vehicle_id,
        system_time = record.system_time(),
        released = grants.len(),
        "vehicle departed"
    );
    telemetry.record_completion(record);

    vehicle.state = ProcessState::Terminated;
    commands.entity(entity).despawn();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Entity, Schedule, World};
    use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

    use crate::clock::{Event, EventSubject};

    fn world_with_pool(capacity: u32) -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(StationTelemetry::default());
        world.insert_resource(KernelFault::default());
        let mut pools = ResourcePools::default();
        pools.add_pool("pump", capacity).expect("pool");
        world.insert_resource(pools);
        world
    }

    fn complete(world: &mut World, vehicle: Entity, at: f64) {
        world.resource_mut::<SimulationClock>().advance_to(at);
        world.insert_resource(CurrentEvent(Event {
            timestamp: at,
            seq: 0,
            kind: EVENT,
            subject: Some(EventSubject::Vehicle(vehicle)),
        }));
        let mut schedule = Schedule::default();
        schedule.add_systems((service_completed_system, apply_deferred).chain());
        schedule.run(world);
    }

    fn in_service(world: &mut World, arrived_at: f64, since: f64, service: f64) -> Entity {
        let pump = crate::resources::PoolId(0);
        let vehicle = world.spawn(Vehicle::new(1, 0, arrived_at)).id();
        let (request, _) = world
            .resource_mut::<ResourcePools>()
            .acquire_all(vehicle, &[pump])
            .expect("acquire");
        world
            .resource_mut::<ResourcePools>()
            .take_grant(request)
            .expect("granted");
        let mut v = world.get_mut::<Vehicle>(vehicle).expect("vehicle");
        v.phase = VehiclePhase::InService;
        v.state = ProcessState::Waiting;
        v.held.push(pump);
        v.service_started_at = Some(since);
        v.dispenser_wait = Some(since - arrived_at);
        v.employee_wait = Some(since - arrived_at);
        v.service_duration = Some(service);
        vehicle
    }

    #[test]
    fn completion_releases_reports_and_despawns() {
        let mut world = world_with_pool(1);
        let vehicle = in_service(&mut world, 1.0, 5.0, 4.0);
        complete(&mut world, vehicle, 9.0);

        assert!(world.get_entity(vehicle).is_none());
        let pools = world.resource::<ResourcePools>();
        assert_eq!(pools.pools()[0].held(), 0);

        let telemetry = world.resource::<StationTelemetry>();
        assert_eq!(telemetry.vehicles_served(), 1);
        assert_eq!(telemetry.busy_time(crate::resources::PoolId(0)), 4.0);
        assert_eq!(telemetry.mean(SampleKind::SystemTime), Some(8.0));
        assert_eq!(telemetry.mean(SampleKind::ServiceDuration), Some(4.0));
        assert_eq!(telemetry.completed[0].queue_wait(), 4.0);
        assert_eq!(telemetry.mean(SampleKind::QueueWait), Some(4.0));
        assert_eq!(telemetry.mean(SampleKind::DispenserWait), Some(4.0));
        assert_eq!(telemetry.mean(SampleKind::EmployeeWait), Some(4.0));
    }

    #[test]
    fn busy_time_is_service_duration_not_hold_time() {
        let mut world = world_with_pool(1);
        // Granted at t=2 but the service timer only covers 3 minutes.
        let vehicle = in_service(&mut world, 0.0, 2.0, 3.0);
        complete(&mut world, vehicle, 10.0);

        let telemetry = world.resource::<StationTelemetry>();
        assert_eq!(telemetry.busy_time(crate::resources::PoolId(0)), 3.0);
    }

    #[test]
    fn release_hands_pool_to_next_waiter() {
        let mut world = world_with_pool(1);
        let vehicle = in_service(&mut world, 0.0, 0.0, 5.0);
        let waiter = world.spawn(Vehicle::new(2, 0, 1.0)).id();
        world
            .resource_mut::<ResourcePools>()
            .acquire_all(waiter, &[crate::resources::PoolId(0)])
            .expect("queued");

        complete(&mut world, vehicle, 5.0);

        let mut clock = world.resource_mut::<SimulationClock>();
        let resumed = clock.pop_next().expect("grant event");
        assert_eq!(resumed.kind, EventKind::ResourcesGranted);
        assert_eq!(resumed.subject, Some(EventSubject::Vehicle(waiter)));
        assert_eq!(resumed.timestamp, 5.0);
    }

    #[test]
    fn premature_completion_is_a_fault() {
        let mut world = world_with_pool(1);
        let vehicle = world.spawn(Vehicle::new(1, 0, 0.0)).id();
        complete(&mut world, vehicle, 1.0);
        assert!(world.resource::<KernelFault>().get().is_some());
        assert!(world.get_entity(vehicle).is_some());
    }
}
