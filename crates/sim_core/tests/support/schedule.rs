#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use sim_core::clock::Event;
use sim_core::error::SimError;
use sim_core::runner::{
    initialize_simulation, run_next_event, run_until_empty, run_until_horizon,
    run_until_horizon_with_hook, simulation_schedule, RunSummary,
};

/// Helper that owns a reusable `Schedule` so tests can step or drain the event queue.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    /// Create a runner with the default simulation schedule.
    pub fn new() -> Self {
        Self {
            schedule: simulation_schedule(),
        }
    }

    /// Schedule `SimulationStarted` at t=0.
    pub fn start(&mut self, world: &mut World) {
        initialize_simulation(world);
    }

    /// Run a single event (returns `true` if an event was processed).
    pub fn run_one(&mut self, world: &mut World) -> bool {
        run_next_event(world, &mut self.schedule)
    }

    /// Run multiple events up to `max_steps`, returning the number of steps executed.
    pub fn run_until_empty(&mut self, world: &mut World, max_steps: usize) -> usize {
        run_until_empty(world, &mut self.schedule, max_steps)
    }

    /// Start the run and drive it to `horizon`.
    pub fn run_to(&mut self, world: &mut World, horizon: f64) -> Result<RunSummary, SimError> {
        self.start(world);
        run_until_horizon(world, &mut self.schedule, horizon)
    }

    /// Start the run and drive it to `horizon`, calling `hook` after every event.
    pub fn run_to_with_hook<F>(
        &mut self,
        world: &mut World,
        horizon: f64,
        hook: F,
    ) -> Result<RunSummary, SimError>
    where
        F: FnMut(&World, &Event),
    {
        self.start(world);
        run_until_horizon_with_hook(world, &mut self.schedule, horizon, hook)
    }
}
