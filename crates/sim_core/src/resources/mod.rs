//! Resource pools and the composite acquisition coordinator.
//!
//! A request names one or more pools and is granted atomically: either every
//! pool hands it one unit within the same step, or none does. The request is
//! linked into the wait queue of each pool it names; whenever one of those pools
//! changes, the linked requests are re-examined in arrival order.
//!
//! Fairness: a waiting request may be overtaken only by a later request that
//! needs none of the pools the earlier one is still short of.

mod pool;

use std::collections::{BTreeMap, BTreeSet};

use bevy_ecs::prelude::{Entity, Resource};

use crate::error::{ConfigError, InvariantViolation};

pub use pool::{PoolId, RequestId, ResourcePool};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub requester: Entity,
    pub pools: Vec<PoolId>,
    pub satisfied: bool,
}

/// A request that became satisfied during an acquire or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub request: RequestId,
    pub requester: Entity,
}

#[derive(Debug, Default, Resource)]
pub struct ResourcePools {
    pools: Vec<ResourcePool>,
    requests: BTreeMap<RequestId, PendingRequest>,
    next_request: u64,
}

impl ResourcePools {
    pub fn add_pool(
        &mut self,
        name: impl Into<String>,
        capacity: u32,
    ) -> Result<PoolId, ConfigError> {
        let name = name.into();
        if capacity == 0 {
            return Err(ConfigError::NonPositiveCapacity { pool: name });
        }
        let id = PoolId(self.pools.len());
        self.pools.push(ResourcePool::new(id, name, capacity));
        Ok(id)
    }

    pub fn pool(&self, id: PoolId) -> Option<&ResourcePool> {
        self.pools.get(id.0)
    }

    pub fn pools(&self) -> &[ResourcePool] {
        &self.pools
    }

    pub fn request(&self, id: RequestId) -> Option<&PendingRequest> {
        self.requests.get(&id)
    }

    /// Requests not yet granted, oldest first.
    pub fn waiting_requests(&self) -> impl Iterator<Item = &PendingRequest> {
        self.requests.values().filter(|request| !request.satisfied)
    }

    /// Register a request for one unit of every pool in `pools` on behalf of
    /// `requester`. Returns the new request's id together with every grant the
    /// registration made possible (possibly including the new request itself).
    pub fn acquire_all(
        &mut self,
        requester: Entity,
        pools: &[PoolId],
    ) -> Result<(RequestId, Vec<Grant>), InvariantViolation> {
        if pools.is_empty() {
            return Err(InvariantViolation::EmptyRequest);
        }
        let mut seen = BTreeSet::new();
        for &pool in pools {
            if self.pools.get(pool.0).is_none() {
                return Err(InvariantViolation::UnknownPool(pool));
            }
            if !seen.insert(pool) {
                return Err(InvariantViolation::DuplicatePool(pool));
            }
        }

        let id = RequestId(self.next_request);
        self.next_request += 1;
        for &pool in pools {
            self.pool_mut(pool)?.enqueue(id);
        }
        self.requests.insert(
            id,
            PendingRequest {
                id,
                requester,
                pools: pools.to_vec(),
                satisfied: false,
            },
        );
        tracing::trace!(request = ?id, ?requester, ?pools, "request registered");

        let grants = self.reevaluate(pools)?;
        Ok((id, grants))
    }

    /// Return one unit to every pool in `pools` and hand freed capacity to the
    /// waiting requests.
    pub fn release_all(&mut self, pools: &[PoolId]) -> Result<Vec<Grant>, InvariantViolation> {
        for &pool in pools {
            self.pool_mut(pool)?.release(1)?;
        }
        tracing::trace!(?pools, "pools released");
        self.reevaluate(pools)
    }

    /// Hand a satisfied request back to its requester and forget it. Fails if the
    /// request is unknown or was never granted.
    pub fn take_grant(&mut self, id: RequestId) -> Result<PendingRequest, InvariantViolation> {
        match self.requests.get(&id) {
            None => return Err(InvariantViolation::UnknownRequest(id)),
            Some(request) if !request.satisfied => {
                return Err(InvariantViolation::PartialGrant { request: id })
            }
            Some(_) => {}
        }
        self.requests
            .remove(&id)
            .ok_or(InvariantViolation::UnknownRequest(id))
    }

    /// Verify `held <= capacity` for every pool.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.pools.iter().try_for_each(ResourcePool::check_bounds)
    }

    fn pool_mut(&mut self, id: PoolId) -> Result<&mut ResourcePool, InvariantViolation> {
        self.pools
            .get_mut(id.0)
            .ok_or(InvariantViolation::UnknownPool(id))
    }

    /// Walk the requests queued on `changed` pools in arrival order and grant
    /// every one that can be satisfied without overtaking an earlier request on
    /// a pool that request is still short of.
    fn reevaluate(&mut self, changed: &[PoolId]) -> Result<Vec<Grant>, InvariantViolation> {
        let mut candidates: Vec<RequestId> = changed
            .iter()
            .filter_map(|id| self.pools.get(id.0))
            .flat_map(|pool| pool.wait_queue())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut blocked: BTreeSet<PoolId> = BTreeSet::new();
        let mut grants = Vec::new();
        for id in candidates {
            let request = self
                .requests
                .get(&id)
                .ok_or(InvariantViolation::UnknownRequest(id))?;
            if request.satisfied {
                continue;
            }
            let needs = request.pools.clone();
            let requester = request.requester;

            let overtakes = needs.iter().any(|pool| blocked.contains(pool));
            if !overtakes && self.reserve_all(&needs)? {
                self.confirm(id, &needs)?;
                tracing::debug!(request = ?id, ?requester, pools = ?needs, "request granted");
                grants.push(Grant {
                    request: id,
                    requester,
                });
                continue;
            }

            for &pool in &needs {
                if self.pool_mut(pool)?.available() == 0 {
                    blocked.insert(pool);
                }
            }
        }
        Ok(grants)
    }

    /// Provisionally take one unit from each pool; on the first refusal roll back
    /// everything taken so far.
    fn reserve_all(&mut self, pools: &[PoolId]) -> Result<bool, InvariantViolation> {
        let mut reserved = Vec::with_capacity(pools.len());
        for &pool in pools {
            if self.pool_mut(pool)?.try_acquire(1) {
                reserved.push(pool);
                continue;
            }
            for taken in reserved {
                self.pool_mut(taken)?.release(1)?;
            }
            return Ok(false);
        }
        Ok(true)
    }

    fn confirm(&mut self, id: RequestId, pools: &[PoolId]) -> Result<(), InvariantViolation> {
        for &pool in pools {
            let pool = self.pool_mut(pool)?;
            pool.check_bounds()?;
            pool.remove_waiting(id);
        }
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(InvariantViolation::UnknownRequest(id))?;
        request.satisfied = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(n: u32) -> Entity {
        Entity::from_raw(n)
    }

    fn two_pools(a: u32, b: u32) -> (ResourcePools, PoolId, PoolId) {
        let mut pools = ResourcePools::default();
        let first = pools.add_pool("dispenser", a).expect("pool");
        let second = pools.add_pool("employee", b).expect("pool");
        (pools, first, second)
    }

    #[test]
    fn zero_capacity_is_a_config_error() {
        let mut pools = ResourcePools::default();
        assert!(matches!(
            pools.add_pool("kerosene", 0),
            Err(ConfigError::NonPositiveCapacity { .. })
        ));
    }

    #[test]
    fn free_pools_grant_immediately() {
        let (mut pools, a, b) = two_pools(1, 1);
        let (id, grants) = pools.acquire_all(entity(1), &[a, b]).expect("acquire");
        assert_eq!(grants, vec![Grant { request: id, requester: entity(1) }]);
        assert_eq!(pools.pool(a).map(ResourcePool::held), Some(1));
        assert_eq!(pools.pool(b).map(ResourcePool::held), Some(1));
        assert!(pools.take_grant(id).is_ok());
    }

    #[test]
    fn composite_request_never_holds_partially() {
        let (mut pools, a, b) = two_pools(1, 1);
        let (first, _) = pools.acquire_all(entity(1), &[b]).expect("employee only");
        let (second, grants) = pools.acquire_all(entity(2), &[a, b]).expect("both");
        assert!(grants.is_empty());
        assert_eq!(
            pools.pool(a).map(ResourcePool::held),
            Some(0),
            "dispenser not held speculatively"
        );
        assert_eq!(
            pools.take_grant(second),
            Err(InvariantViolation::PartialGrant { request: second })
        );

        pools.take_grant(first).expect("first granted");
        let grants = pools.release_all(&[b]).expect("release");
        assert_eq!(grants, vec![Grant { request: second, requester: entity(2) }]);
        assert_eq!(pools.pool(a).map(ResourcePool::held), Some(1));
        assert_eq!(pools.pool(b).map(ResourcePool::held), Some(1));
    }

    #[test]
    fn single_pool_grants_in_arrival_order() {
        let mut pools = ResourcePools::default();
        let pump = pools.add_pool("pump", 1).expect("pool");
        let (first, _) = pools.acquire_all(entity(1), &[pump]).expect("acquire");
        let (second, _) = pools.acquire_all(entity(2), &[pump]).expect("acquire");
        let (third, _) = pools.acquire_all(entity(3), &[pump]).expect("acquire");
        pools.take_grant(first).expect("first");

        let grants = pools.release_all(&[pump]).expect("release");
        assert_eq!(grants.iter().map(|g| g.request).collect::<Vec<_>>(), vec![second]);
        pools.take_grant(second).expect("second");
        let grants = pools.release_all(&[pump]).expect("release");
        assert_eq!(grants.iter().map(|g| g.request).collect::<Vec<_>>(), vec![third]);
    }

    #[test]
    fn later_request_may_pass_only_on_unrelated_pools() {
        // Head waits on the dispenser; a later employee-only request may take the free
        // employee, but a later dispenser request must queue behind the head.
        let (mut pools, a, b) = two_pools(1, 2);
        let (holder, _) = pools.acquire_all(entity(1), &[a]).expect("hold dispenser");
        let (head, grants) = pools.acquire_all(entity(2), &[a, b]).expect("head");
        assert!(grants.is_empty());

        let (pass, grants) = pools.acquire_all(entity(3), &[b]).expect("employee only");
        assert_eq!(grants, vec![Grant { request: pass, requester: entity(3) }]);

        let (behind, grants) = pools.acquire_all(entity(4), &[a]).expect("dispenser only");
        assert!(grants.is_empty());

        pools.take_grant(holder).expect("holder");
        let grants = pools.release_all(&[a]).expect("release");
        assert_eq!(grants.iter().map(|g| g.request).collect::<Vec<_>>(), vec![head]);
        assert!(pools.request(behind).is_some_and(|r| !r.satisfied));
    }

    #[test]
    fn overlapping_composite_requests_do_not_deadlock() {
        let (mut pools, a, b) = two_pools(1, 1);
        let (first, _) = pools.acquire_all(entity(1), &[a, b]).expect("first");
        let (second, grants) = pools.acquire_all(entity(2), &[b, a]).expect("second");
        assert!(grants.is_empty());
        pools.take_grant(first).expect("first");

        let grants = pools.release_all(&[a, b]).expect("release");
        assert_eq!(grants, vec![Grant { request: second, requester: entity(2) }]);
        pools.check_invariants().expect("bounds hold");
    }

    #[test]
    fn malformed_requests_are_rejected() {
        let (mut pools, a, _) = two_pools(1, 1);
        assert_eq!(
            pools.acquire_all(entity(1), &[]),
            Err(InvariantViolation::EmptyRequest)
        );
        assert_eq!(
            pools.acquire_all(entity(1), &[a, a]),
            Err(InvariantViolation::DuplicatePool(a))
        );
        assert_eq!(
            pools.acquire_all(entity(1), &[PoolId(9)]),
            Err(InvariantViolation::UnknownPool(PoolId(9)))
        );
        assert_eq!(
            pools.release_all(&[a]),
            Err(InvariantViolation::ReleaseUnderflow { pool: a })
        );
        assert_eq!(pools.waiting_requests().count(), 0);
    }
}
