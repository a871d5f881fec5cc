//! Error taxonomy: configuration problems caught before a run starts, and
//! kernel invariant violations that stop a run.

use bevy_ecs::prelude::Resource;
use thiserror::Error;

use crate::resources::{PoolId, RequestId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{table} weight table is empty")]
    EmptyWeightTable { table: &'static str },
    #[error("{table} weight for `{entry}` must be finite and non-negative, got {weight}")]
    InvalidWeight {
        table: &'static str,
        entry: String,
        weight: f64,
    },
    #[error("{table} weights must sum to a positive total, got {total}")]
    NonPositiveWeightTotal { table: &'static str, total: f64 },
    #[error("duplicate {table} entry `{entry}`")]
    DuplicateEntry { table: &'static str, entry: String },
    #[error("capacity of `{pool}` must be positive")]
    NonPositiveCapacity { pool: String },
    #[error("arrival rate must be positive and finite, got {rate}")]
    NonPositiveArrivalRate { rate: f64 },
    #[error("{what} must be a finite non-negative duration, got {value}")]
    NegativeDuration { what: String, value: f64 },
    #[error("simulation duration must be positive and finite, got {value}")]
    InvalidHorizon { value: f64 },
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("pool {pool:?} would hold {held} units with capacity {capacity}")]
    CapacityExceeded { pool: PoolId, held: u32, capacity: u32 },
    #[error("pool {pool:?} released more units than it holds")]
    ReleaseUnderflow { pool: PoolId },
    #[error("request {request:?} resumed without holding every member pool")]
    PartialGrant { request: RequestId },
    #[error("unknown pool {0:?}")]
    UnknownPool(PoolId),
    #[error("unknown request {0:?}")]
    UnknownRequest(RequestId),
    #[error("request names pool {0:?} more than once")]
    DuplicatePool(PoolId),
    #[error("request names no pools")]
    EmptyRequest,
    #[error("event {event} names no live vehicle")]
    MissingProcess { event: &'static str },
    #[error("vehicle resumed by {event} while {state}")]
    UnexpectedResume {
        event: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error("world is missing the {0} resource")]
    MissingResource(&'static str),
}

/// First invariant violation raised by a system. The runner checks it after every
/// step and aborts the run when it is set.
#[derive(Debug, Default, Resource)]
pub struct KernelFault(Option<InvariantViolation>);

impl KernelFault {
    pub fn record(&mut self, violation: InvariantViolation) {
        tracing::warn!(%violation, "kernel invariant violated");
        if self.0.is_none() {
            self.0 = Some(violation);
        }
    }

    pub fn get(&self) -> Option<&InvariantViolation> {
        self.0.as_ref()
    }

    pub fn take(&mut self) -> Option<InvariantViolation> {
        self.0.take()
    }
}
