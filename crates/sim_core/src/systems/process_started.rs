use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::ecs::{ProcessState, Vehicle, VehiclePhase};
use crate::error::{InvariantViolation, KernelFault};
use crate::resources::ResourcePools;
use crate::scenario::{AcquisitionPolicy, StationModel};

use super::{schedule_grants, vehicle_subject};

/// First resume point of a vehicle: suspend on its resource request.
pub fn process_started_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut pools: ResMut<ResourcePools>,
    model: Res<StationModel>,
    mut fault: ResMut<KernelFault>,
    mut vehicles: Query<&mut Vehicle>,
) {
    if event.0.kind != EventKind::ProcessStarted {
        return;
    }
    let result = vehicle_subject(&event.0)
        .and_then(|entity| vehicles.get_mut(entity).ok().map(|v| (entity, v)))
        .ok_or(InvariantViolation::MissingProcess {
            event: EventKind::ProcessStarted.as_str(),
        })
        .and_then(|(entity, mut vehicle)| {
            if vehicle.state != ProcessState::Created {
                return Err(InvariantViolation::UnexpectedResume {
                    event: EventKind::ProcessStarted.as_str(),
                    state: vehicle.state.as_str(),
                });
            }
            vehicle.state = ProcessState::Running;

            let dispenser = model
                .dispenser(vehicle.fuel)
                .ok_or(InvariantViolation::MissingProcess {
                    event: EventKind::ProcessStarted.as_str(),
                })?;
            let (needs, phase) = match model.policy {
                AcquisitionPolicy::Composite => (
                    vec![dispenser, model.employee],
                    VehiclePhase::QueuedForBoth,
                ),
                AcquisitionPolicy::Sequential => {
                    (vec![dispenser], VehiclePhase::QueuedForDispenser)
                }
            };

            let (request, grants) = pools.acquire_all(entity, &needs)?;
            vehicle.request = Some(request);
            vehicle.phase = phase;
            vehicle.state = ProcessState::Waiting;
            tracing::trace!(
                vehicle = vehicle.id,
                ?request,
                phase = phase.as_str(),
                "vehicle waiting"
            );
            Ok(grants)
        });

    match result {
        Ok(grants) => schedule_grants(&mut clock, &grants),
        Err(violation) => fault.record(violation),
    }
}
