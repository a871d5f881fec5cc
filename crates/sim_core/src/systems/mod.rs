//! Event-reacting systems. Each system is the continuation body for one
//! [EventKind](crate::clock::EventKind); the runner gates them on
//! [CurrentEvent](crate::clock::CurrentEvent).

pub mod generator;
pub mod process_started;
pub mod resources_granted;
pub mod service_completed;

use bevy_ecs::prelude::Entity;

use crate::clock::{Event, EventKind, EventSubject, SimulationClock};
use crate::resources::Grant;

pub(crate) fn vehicle_subject(event: &Event) -> Option<Entity> {
    match event.subject {
        Some(EventSubject::Vehicle(entity)) => Some(entity),
        None => None,
    }
}

/// Resume every granted requester through the scheduler, in grant order.
pub(crate) fn schedule_grants(clock: &mut SimulationClock, grants: &[Grant]) {
    for grant in grants {
        clock.schedule_in(
            0.0,
            EventKind::ResourcesGranted,
            Some(EventSubject::Vehicle(grant.requester)),
        );
    }
}
