//! Virtual clock and event queue.
//!
//! Simulation time is measured in minutes as `f64`. Events are ordered by
//! `(timestamp, seq)`; `seq` is assigned when the event is enqueued, so events
//! sharing a timestamp fire in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

/// Resumption point an event hands control to when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    /// The vehicle generator wakes up and admits the next vehicle.
    VehicleArrival,
    /// A freshly admitted vehicle starts its lifecycle and requests resources.
    ProcessStarted,
    /// A waiting vehicle has been granted every pool it asked for.
    ResourcesGranted,
    /// A vehicle's service timer elapsed.
    ServiceCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SimulationStarted => "SimulationStarted",
            EventKind::VehicleArrival => "VehicleArrival",
            EventKind::ProcessStarted => "ProcessStarted",
            EventKind::ResourcesGranted => "ResourcesGranted",
            EventKind::ServiceCompleted => "ServiceCompleted",
        }
    }
}

/// The suspended process an event resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSubject {
    Vehicle(Entity),
}

/// Opaque handle returned by the scheduling methods; used to cancel an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(u64);

#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub timestamp: f64,
    pub seq: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Event {
    pub fn handle(&self) -> EventHandle {
        EventHandle(self.seq)
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap on (timestamp, seq).
        other
            .timestamp
            .total_cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

/// The event currently being processed; inserted by the runner before each schedule run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: f64,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Schedule an event at an absolute simulation time.
    ///
    /// Times in the past are clamped to `now`. A NaN time can never be reached
    /// and is parked at infinity so it never fires within a finite horizon.
    pub fn schedule_at(
        &mut self,
        timestamp: f64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> EventHandle {
        debug_assert!(
            !timestamp.is_nan() && timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let timestamp = if timestamp.is_nan() {
            f64::INFINITY
        } else {
            timestamp.max(self.now)
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp,
            seq,
            kind,
            subject,
        });
        EventHandle(seq)
    }

    /// Schedule an event `delay` minutes from now. A zero delay queues the event
    /// behind every event already pending for the current instant.
    pub fn schedule_in(
        &mut self,
        delay: f64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> EventHandle {
        debug_assert!(delay >= 0.0, "delay must be non-negative");
        self.schedule_at(self.now + delay.max(0.0), kind, subject)
    }

    /// Remove a pending event without firing it. Returns `false` if the event
    /// already fired or was cancelled before.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.seq != handle.0);
        self.events.len() != before
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.events.peek().map(|event| event.timestamp)
    }

    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Move the clock forward without firing anything. Never moves it backwards.
    pub fn advance_to(&mut self, timestamp: f64) {
        if timestamp > self.now {
            self.now = timestamp;
        }
    }

    /// Drop every pending event, returning how many were discarded.
    pub fn discard_pending(&mut self) -> usize {
        let discarded = self.events.len();
        self.events.clear();
        discarded
    }
}
