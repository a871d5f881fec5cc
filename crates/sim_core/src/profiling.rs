//! Event throughput counters for a run.

use std::collections::BTreeMap;
use std::time::Instant;

use bevy_ecs::prelude::Resource;

use crate::clock::EventKind;

/// Counts fired events per kind and measures wall-clock throughput.
#[derive(Debug, Default, Resource)]
pub struct EventMetrics {
    pub events_processed: u64,
    /// Wall-clock instant of the first recorded event.
    pub start_time: Option<Instant>,
    pub events_by_kind: BTreeMap<EventKind, u64>,
}

impl EventMetrics {
    pub fn record_event(&mut self, kind: EventKind) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.events_processed += 1;
        *self.events_by_kind.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.events_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Events per wall-clock second since the first recorded event.
    pub fn events_per_second(&self) -> f64 {
        let Some(start) = self.start_time else {
            return 0.0;
        };
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.events_processed as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Event Processing Summary ===");
        println!("Total events processed: {}", self.events_processed);
        if let Some(start) = self.start_time {
            println!("Wall time: {:.3}s", start.elapsed().as_secs_f64());
            println!("Events per second: {:.0}", self.events_per_second());
        }
        println!("\nEvents by kind:");
        for (kind, count) in &self.events_by_kind {
            println!("  {:20} : {}", kind.as_str(), count);
        }
    }
}
