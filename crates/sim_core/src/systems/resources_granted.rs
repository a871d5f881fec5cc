use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{ProcessState, Vehicle, VehiclePhase};
use crate::error::{InvariantViolation, KernelFault};
use crate::resources::ResourcePools;
use crate::rng::SimRng;
use crate::scenario::StationModel;

use super::{schedule_grants, vehicle_subject};

const EVENT: EventKind = EventKind::ResourcesGranted;

/// Resume point after a request was granted. Either starts the service timer, or
/// (sequential policy, dispenser stage) suspends again on the employee.
pub fn resources_granted_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut pools: ResMut<ResourcePools>,
    model: Res<StationModel>,
    mut rng: ResMut<SimRng>,
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
    let Some(request) = vehicle.request.take() else {
        fault.record(InvariantViolation::UnexpectedResume {
            event: EVENT.as_str(),
            state: vehicle.phase.as_str(),
        });
        return;
    };
    let granted = match pools.take_grant(request) {
        Ok(granted) => granted,
        Err(violation) => {
            fault.record(violation);
            return;
        }
    };

    let now = clock.now();
    vehicle.state = ProcessState::Running;
    vehicle.held.extend_from_slice(&granted.pools);

    let phase = vehicle.phase;
    match phase {
        VehiclePhase::QueuedForBoth => {
            let wait = now - vehicle.arrived_at;
            vehicle.dispenser_wait = Some(wait);
            vehicle.employee_wait = Some(wait);
            let fuel_time = model.sample_fuel_time(vehicle.fuel, &mut rng);
            vehicle.fuel_time = Some(fuel_time);
            start_service(&mut vehicle, &mut clock, &model, &mut rng, entity);
        }
        VehiclePhase::QueuedForDispenser => {
            vehicle.dispenser_wait = Some(now - vehicle.arrived_at);
            let fuel_time = model.sample_fuel_time(vehicle.fuel, &mut rng);
            vehicle.fuel_time = Some(fuel_time);
            vehicle.employee_requested_at = Some(now);

            match pools.acquire_all(entity, &[model.employee]) {
                Ok((request, grants)) => {
                    vehicle.request = Some(request);
                    vehicle.phase = VehiclePhase::QueuedForEmployee;
                    vehicle.state = ProcessState::Waiting;
                    schedule_grants(&mut clock, &grants);
                }
                Err(violation) => fault.record(violation),
            }
        }
        VehiclePhase::QueuedForEmployee => {
            let requested_at = vehicle.employee_requested_at.unwrap_or(vehicle.arrived_at);
            vehicle.employee_wait = Some(now - requested_at);
            start_service(&mut vehicle, &mut clock, &model, &mut rng, entity);
        }
        VehiclePhase::Arrived | VehiclePhase::InService => {
            fault.record(InvariantViolation::UnexpectedResume {
                event: EVENT.as_str(),
                state: phase.as_str(),
            });
        }
    }
}

/// Draw payment and suspend on the service timer.
fn start_service(
    vehicle: &mut Vehicle,
    clock: &mut SimulationClock,
    model: &StationModel,
    rng: &mut SimRng,
    entity: Entity,
) {
    let now = clock.now();

    let payment = model.sample_payment(rng);
    let payment_time = model.sample_payment_time(payment, rng);
    let service = vehicle.fuel_time.unwrap_or(0.0) + payment_time;

    vehicle.payment = Some(payment);
    vehicle.service_duration = Some(service);
    vehicle.service_started_at = Some(now);
    vehicle.phase = VehiclePhase::InService;
    vehicle.state = ProcessState::Waiting;
    vehicle.service_timer = Some(clock.schedule_in(
        service,
        EventKind::ServiceCompleted,
        Some(EventSubject::Vehicle(entity)),
    ));
    tracing::debug!(
        vehicle = vehicle.id,
        wait = now - vehicle.arrived_at,
        service,
        "service started"
    );
}
