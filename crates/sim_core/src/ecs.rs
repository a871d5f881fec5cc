use bevy_ecs::prelude::Component;

use crate::clock::EventHandle;
use crate::resources::{PoolId, RequestId};

/// Lifecycle of an entity process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Created,
    /// Suspended on a resource request or a timer.
    Waiting,
    /// Executing between two suspension points.
    Running,
    Terminated,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Created => "created",
            ProcessState::Waiting => "waiting",
            ProcessState::Running => "running",
            ProcessState::Terminated => "terminated",
        }
    }
}

/// What a waiting vehicle is currently suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehiclePhase {
    /// Not started yet.
    Arrived,
    /// Waiting for dispenser and employee together.
    QueuedForBoth,
    /// Waiting for the dispenser alone (sequential policy).
    QueuedForDispenser,
    /// Holding the dispenser, waiting for an employee (sequential policy).
    QueuedForEmployee,
    /// Service timer running.
    InService,
}

impl VehiclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehiclePhase::Arrived => "arrived",
            VehiclePhase::QueuedForBoth => "queued for dispenser and employee",
            VehiclePhase::QueuedForDispenser => "queued for dispenser",
            VehiclePhase::QueuedForEmployee => "queued for employee",
            VehiclePhase::InService => "in service",
        }
    }
}

#[derive(Debug, Clone, Component)]
pub struct Vehicle {
    /// Admission sequence number (1-based).
    pub id: u64,
    /// Index into the configured fuel types.
    pub fuel: usize,
    pub state: ProcessState,
    pub phase: VehiclePhase,
    pub arrived_at: f64,
    pub request: Option<RequestId>,
    /// Pools granted so far, released together on completion.
    pub held: Vec<PoolId>,
    /// Time the employee request was issued (sequential policy).
    pub employee_requested_at: Option<f64>,
    /// Waits measured at grant time, reported on completion.
    pub dispenser_wait: Option<f64>,
    pub employee_wait: Option<f64>,
    pub fuel_time: Option<f64>,
    pub payment: Option<usize>,
    pub service_started_at: Option<f64>,
    pub service_duration: Option<f64>,
    pub service_timer: Option<EventHandle>,
}

impl Vehicle {
    pub fn new(id: u64, fuel: usize, arrived_at: f64) -> Self {
        Self {
            id,
            fuel,
            state: ProcessState::Created,
            phase: VehiclePhase::Arrived,
            arrived_at,
            request: None,
            held: Vec::new(),
            employee_requested_at: None,
            dispenser_wait: None,
            employee_wait: None,
            fuel_time: None,
            payment: None,
            service_started_at: None,
            service_duration: None,
            service_timer: None,
        }
    }

    pub fn held_pools(&self) -> &[PoolId] {
        &self.held
    }

    /// Arrival until service start; `None` before service has started.
    pub fn queue_wait(&self) -> Option<f64> {
        self.service_started_at.map(|start| start - self.arrived_at)
    }
}
