//! Statistics collector: per-vehicle timing samples and per-pool busy time.
//!
//! Pure accumulator. Aggregates are only meaningful after the run completes and
//! return `None` when there is nothing to aggregate.

use std::collections::{BTreeMap, HashMap};

use bevy_ecs::prelude::{Entity, Resource};
use serde::Serialize;

use crate::resources::PoolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    /// Arrival until service begins.
    QueueWait,
    /// Arrival until the dispenser was granted.
    DispenserWait,
    /// Employee request until an employee was granted.
    EmployeeWait,
    /// Fuel time plus payment time.
    ServiceDuration,
    /// Arrival until departure.
    SystemTime,
}

/// One vehicle that finished service, recorded when it releases its pools.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedVehicleRecord {
    pub entity: Entity,
    pub vehicle_id: u64,
    pub fuel: usize,
    pub payment: usize,
    pub arrived_at: f64,
    pub service_started_at: f64,
    pub completed_at: f64,
    pub service_duration: f64,
}

impl CompletedVehicleRecord {
    pub fn queue_wait(&self) -> f64 {
        self.service_started_at - self.arrived_at
    }

    pub fn system_time(&self) -> f64 {
        self.completed_at - self.arrived_at
    }
}

#[derive(Debug, Default, Resource)]
pub struct StationTelemetry {
    pub vehicles_arrived: u64,
    pub completed: Vec<CompletedVehicleRecord>,
    samples: HashMap<SampleKind, Vec<f64>>,
    busy_time: BTreeMap<PoolId, f64>,
}

impl StationTelemetry {
    pub fn record_sample(&mut self, kind: SampleKind, value: f64) {
        self.samples.entry(kind).or_default().push(value);
    }

    pub fn add_busy_time(&mut self, pool: PoolId, duration: f64) {
        *self.busy_time.entry(pool).or_insert(0.0) += duration.max(0.0);
    }

    pub fn record_completion(&mut self, record: CompletedVehicleRecord) {
        self.completed.push(record);
    }

    pub fn samples(&self, kind: SampleKind) -> &[f64] {
        self.samples.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: SampleKind) -> usize {
        self.samples(kind).len()
    }

    pub fn mean(&self, kind: SampleKind) -> Option<f64> {
        let values = self.samples(kind);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Nearest-rank percentile, `p` in [0, 1].
    pub fn percentile(&self, kind: SampleKind, p: f64) -> Option<f64> {
        let mut values = self.samples(kind).to_vec();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let rank = ((values.len() - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
        values.get(rank).copied()
    }

    pub fn busy_time(&self, pool: PoolId) -> f64 {
        self.busy_time.get(&pool).copied().unwrap_or(0.0)
    }

    /// busy_time / (capacity × elapsed), clamped to [0, 1]. Zero when nothing elapsed.
    pub fn utilization(&self, pool: PoolId, capacity: u32, elapsed: f64) -> f64 {
        let available = capacity as f64 * elapsed;
        if available <= 0.0 || !available.is_finite() {
            return 0.0;
        }
        (self.busy_time(pool) / available).clamp(0.0, 1.0)
    }

    pub fn vehicles_served(&self) -> usize {
        self.completed.len()
    }
}
