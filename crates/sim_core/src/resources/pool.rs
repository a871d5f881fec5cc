use std::collections::VecDeque;

use serde::Serialize;

use crate::error::InvariantViolation;

/// Index of a pool inside [super::ResourcePools].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PoolId(pub usize);

/// Identifier of a pending request. Assigned monotonically, so ordering by id is
/// ordering by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestId(pub u64);

/// Fixed-capacity counter with a FIFO wait line.
///
/// `held` never leaves `[0, capacity]`: [ResourcePool::try_acquire] refuses
/// instead of overshooting and [ResourcePool::release] reports underflow.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    id: PoolId,
    name: String,
    capacity: u32,
    held: u32,
    wait_queue: VecDeque<RequestId>,
}

impl ResourcePool {
    pub fn new(id: PoolId, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            held: 0,
            wait_queue: VecDeque::new(),
        }
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn held(&self) -> u32 {
        self.held
    }

    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.held)
    }

    /// Requests waiting on this pool, oldest first.
    pub fn wait_queue(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.wait_queue.iter().copied()
    }

    /// Take `amount` units if they are all free.
    pub fn try_acquire(&mut self, amount: u32) -> bool {
        match self.held.checked_add(amount) {
            Some(held) if held <= self.capacity => {
                self.held = held;
                true
            }
            _ => false,
        }
    }

    pub fn release(&mut self, amount: u32) -> Result<(), InvariantViolation> {
        self.held = self
            .held
            .checked_sub(amount)
            .ok_or(InvariantViolation::ReleaseUnderflow { pool: self.id })?;
        Ok(())
    }

    pub fn enqueue(&mut self, request: RequestId) {
        self.wait_queue.push_back(request);
    }

    pub(super) fn remove_waiting(&mut self, request: RequestId) {
        self.wait_queue.retain(|queued| *queued != request);
    }

    pub(super) fn check_bounds(&self) -> Result<(), InvariantViolation> {
        if self.held > self.capacity {
            return Err(InvariantViolation::CapacityExceeded {
                pool: self.id,
                held: self.held,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}
