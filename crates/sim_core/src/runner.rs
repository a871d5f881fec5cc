//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event from [SimulationClock], inserts it as [CurrentEvent],
//! runs the schedule, then checks [KernelFault].

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::error::{KernelFault, SimError};
use crate::profiling::EventMetrics;
use crate::report::{extract_report, StationReport};
use crate::scenario::{build_station, SimulationHorizon, StationConfig};
use crate::systems::{
    generator::{simulation_started_system, vehicle_arrival_system},
    process_started::process_started_system,
    resources_granted::resources_granted_system,
    service_completed::service_completed_system,
};

fn is_kind(event: &Option<Res<CurrentEvent>>, kind: EventKind) -> bool {
    event.as_ref().is_some_and(|e| e.0.kind == kind)
}

fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    is_kind(&event, EventKind::SimulationStarted)
}

fn is_vehicle_arrival(event: Option<Res<CurrentEvent>>) -> bool {
    is_kind(&event, EventKind::VehicleArrival)
}

fn is_process_started(event: Option<Res<CurrentEvent>>) -> bool {
    is_kind(&event, EventKind::ProcessStarted)
}

fn is_resources_granted(event: Option<Res<CurrentEvent>>) -> bool {
    is_kind(&event, EventKind::ResourcesGranted)
}

fn is_service_completed(event: Option<Res<CurrentEvent>>) -> bool {
    is_kind(&event, EventKind::ServiceCompleted)
}

/// Outcome of [run_until_horizon].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Events fired.
    pub steps: usize,
    /// Clock value when the run stopped.
    pub end_time: f64,
    /// Events still pending at the horizon, dropped without firing.
    pub pending_discarded: usize,
}

/// Pop the next event if it is due at or before `horizon`, and run the schedule for it.
fn step(world: &mut World, schedule: &mut Schedule, horizon: Option<f64>) -> Option<Event> {
    let mut clock = world.get_resource_mut::<SimulationClock>()?;
    let next = clock.next_event_time()?;
    if horizon.is_some_and(|end| next > end) {
        return None;
    }
    let event = clock.pop_next()?;
    world.insert_resource(CurrentEvent(event));

    if let Some(mut metrics) = world.get_resource_mut::<EventMetrics>() {
        metrics.record_event(event.kind);
    }
    tracing::trace!(
        t = event.timestamp,
        kind = event.kind.as_str(),
        subject = ?event.subject,
        "event fired"
    );

    schedule.run(world);
    Some(event)
}

/// Return the first invariant violation a system recorded, if any.
pub fn check_fault(world: &mut World) -> Result<(), SimError> {
    match world
        .get_resource_mut::<KernelFault>()
        .and_then(|mut fault| fault.take())
    {
        Some(violation) => Err(violation.into()),
        None => Ok(()),
    }
}

/// Runs one simulation step: pops the next event, inserts it as [CurrentEvent], then runs
/// the schedule.
/// Returns `true` if an event was processed, `false` if the clock was empty or if the next event
/// lies past [SimulationHorizon] (when that resource is present).
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let horizon = world.get_resource::<SimulationHorizon>().map(|h| h.0);
    step(world, schedule, horizon).is_some()
}

/// Runs one simulation step and invokes `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    let horizon = world.get_resource::<SimulationHorizon>().map(|h| h.0);
    match step(world, schedule, horizon) {
        Some(event) => {
            hook(world, &event);
            true
        }
        None => false,
    }
}

/// Runs simulation steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Fire every event due at or before `horizon`, then move the clock to `horizon`
/// and discard whatever is still pending. Stops early with the first recorded
/// invariant violation.
pub fn run_until_horizon(
    world: &mut World,
    schedule: &mut Schedule,
    horizon: f64,
) -> Result<RunSummary, SimError> {
    run_until_horizon_with_hook(world, schedule, horizon, |_, _| {})
}

/// [run_until_horizon] with a hook invoked after every fired event.
pub fn run_until_horizon_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    horizon: f64,
    mut hook: F,
) -> Result<RunSummary, SimError>
where
    F: FnMut(&World, &Event),
{
    if world.get_resource::<SimulationClock>().is_none() {
        return Err(SimError::MissingResource("SimulationClock"));
    }

    let mut steps = 0;
    while let Some(event) = step(world, schedule, Some(horizon)) {
        steps += 1;
        check_fault(world)?;
        hook(world, &event);
    }

    let mut clock = world.resource_mut::<SimulationClock>();
    clock.advance_to(horizon);
    let pending_discarded = clock.discard_pending();
    let summary = RunSummary {
        steps,
        end_time: clock.now(),
        pending_discarded,
    };
    tracing::info!(
        steps,
        end_time = summary.end_time,
        pending_discarded,
        "run reached horizon"
    );
    Ok(summary)
}

/// Builds the default simulation schedule: all event-reacting systems plus [apply_deferred]
/// so that spawned and despawned vehicles are applied before the next step.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        simulation_started_system.run_if(is_simulation_started),
        vehicle_arrival_system.run_if(is_vehicle_arrival),
        process_started_system.run_if(is_process_started),
        resources_granted_system.run_if(is_resources_granted),
        service_completed_system.run_if(is_service_completed),
        apply_deferred,
    ));
    schedule
}

/// Initializes the simulation by scheduling the SimulationStarted event at time 0.
/// Call this after building the scenario and before running events.
pub fn initialize_simulation(world: &mut World) {
    if let Some(mut clock) = world.get_resource_mut::<SimulationClock>() {
        clock.schedule_at(0.0, EventKind::SimulationStarted, None);
    }
}

/// Build, run and report one station day.
pub fn run_station(config: &StationConfig) -> Result<StationReport, SimError> {
    let mut world = World::new();
    build_station(&mut world, config)?;
    run_built_station(&mut world)
}

/// Run a world already populated by [crate::scenario::build_station] (or a variant)
/// up to its [SimulationHorizon] and extract the report.
pub fn run_built_station(world: &mut World) -> Result<StationReport, SimError> {
    let horizon = world
        .get_resource::<SimulationHorizon>()
        .map(|h| h.0)
        .ok_or(SimError::MissingResource("SimulationHorizon"))?;
    initialize_simulation(world);
    let mut schedule = simulation_schedule();
    run_until_horizon(world, &mut schedule, horizon)?;
    extract_report(world).ok_or(SimError::MissingResource("StationTelemetry"))
}
