//! Capacity-allocation policies and the beds they produce.
//!
//! A [`BedPolicy`] describes how beds are partitioned between the two units. [`Beds`] turns it into pools and decides,
//! for each admission request, which pool is asked and at what priority.

use crate::pathway::Unit;
use crate::resources::{Acquisition, BedToken, Grant, PoolId, Priority, ResourcePool};
use crate::Error;

use log::warn;
use serde::{Deserialize, Serialize};

/// How beds are shared between the acute and rehabilitation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BedPolicy {
    /// Each unit has its own beds.
    Dedicated { acute_beds: u32, rehab_beds: u32 },
    /// One shared set of beds, first come first served.
    Pooled { beds: u32 },
    /// Dedicated beds for each unit plus a shared overflow pool.
    PartiallyPooled {
        acute_beds: u32,
        rehab_beds: u32,
        pooled_beds: u32,
        #[serde(default)]
        acute_routing: Routing,
        #[serde(default)]
        rehab_routing: Routing,
        #[serde(default)]
        priority: PooledPriority,
    },
}

impl BedPolicy {
    /// Every bed across all pools.
    pub fn total_beds(&self) -> u32 {
        match *self {
            BedPolicy::Dedicated { acute_beds, rehab_beds } => acute_beds + rehab_beds,
            BedPolicy::Pooled { beds } => beds,
            BedPolicy::PartiallyPooled {
                acute_beds,
                rehab_beds,
                pooled_beds,
                ..
            } => acute_beds + rehab_beds + pooled_beds,
        }
    }

    /// Beds a patient of `unit` could ever be given.
    pub fn reachable_beds(&self, unit: Unit) -> u32 {
        match (*self, unit) {
            (BedPolicy::Dedicated { acute_beds, .. }, Unit::Acute) => acute_beds,
            (BedPolicy::Dedicated { rehab_beds, .. }, Unit::Rehab) => rehab_beds,
            (BedPolicy::Pooled { beds }, _) => beds,
            (
                BedPolicy::PartiallyPooled {
                    acute_beds, pooled_beds, ..
                },
                Unit::Acute,
            ) => acute_beds + pooled_beds,
            (
                BedPolicy::PartiallyPooled {
                    rehab_beds, pooled_beds, ..
                },
                Unit::Rehab,
            ) => rehab_beds + pooled_beds,
        }
    }
}

/// Which sub-pool a partially pooled unit tries first.
///
/// When the first choice has no free bed the request goes to the other sub-pool, waiting there if it is full too.
/// A request that waits at the other sub-pool stays in that queue: a bed freed later in its first choice is not
/// offered to it and may sit empty until a new request arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    #[default]
    DedicatedFirst,
    PooledFirst,
}

/// Which unit's requests are served first when beds are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PooledPriority {
    /// Patients stepping down into rehabilitation go ahead of new acute admissions.
    #[default]
    RehabFirst,
    AcuteFirst,
    /// Arrival order only.
    Fifo,
}

impl PooledPriority {
    /// Queue priority for requests from `unit`.
    pub fn priority(self, unit: Unit) -> Priority {
        match (self, unit) {
            (PooledPriority::Fifo, _) => 0,
            (PooledPriority::RehabFirst, Unit::Rehab) | (PooledPriority::AcuteFirst, Unit::Acute) => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Route {
    first: PoolId,
    second: Option<PoolId>,
    priority: Priority,
}

/// A patient (or any other waiter) placed in a bed.
#[derive(Debug)]
pub struct Admission<W> {
    pub unit: Unit,
    pub token: BedToken,
    pub waiter: W,
}

#[derive(Debug)]
struct Waiting<W> {
    unit: Unit,
    waiter: W,
}

/// Snapshot of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub name: String,
    pub capacity: usize,
    pub occupancy: usize,
    pub queue_len: usize,
    pub peak_queue: usize,
}

/// Bed pools laid out by a [`BedPolicy`], with a census of patients in care per unit.
#[derive(Debug)]
pub struct Beds<W> {
    pools: Vec<ResourcePool<Waiting<W>>>,
    routes: [Route; 2],
    census: [usize; 2],
}

impl<W> Beds<W> {
    pub fn new(policy: &BedPolicy) -> Self {
        let (pools, routes) = match *policy {
            BedPolicy::Dedicated { acute_beds, rehab_beds } => (
                vec![
                    ResourcePool::new(0, "acute", acute_beds as usize),
                    ResourcePool::new(1, "rehab", rehab_beds as usize),
                ],
                [
                    Route {
                        first: 0,
                        second: None,
                        priority: 0,
                    },
                    Route {
                        first: 1,
                        second: None,
                        priority: 0,
                    },
                ],
            ),
            BedPolicy::Pooled { beds } => {
                let shared = Route {
                    first: 0,
                    second: None,
                    priority: 0,
                };
                (vec![ResourcePool::new(0, "pooled", beds as usize)], [shared, shared])
            },
            BedPolicy::PartiallyPooled {
                acute_beds,
                rehab_beds,
                pooled_beds,
                acute_routing,
                rehab_routing,
                priority,
            } => {
                let route = |dedicated: PoolId, routing: Routing, unit: Unit| {
                    let (first, second) = match routing {
                        Routing::DedicatedFirst => (dedicated, 2),
                        Routing::PooledFirst => (2, dedicated),
                    };
                    Route {
                        first,
                        second: Some(second),
                        priority: priority.priority(unit),
                    }
                };
                (
                    vec![
                        ResourcePool::new(0, "acute_dedicated", acute_beds as usize),
                        ResourcePool::new(1, "rehab_dedicated", rehab_beds as usize),
                        ResourcePool::new(2, "pooled", pooled_beds as usize),
                    ],
                    [
                        route(0, acute_routing, Unit::Acute),
                        route(1, rehab_routing, Unit::Rehab),
                    ],
                )
            },
        };

        for unit in Unit::ALL {
            if policy.reachable_beds(unit) == 0 {
                warn!("{unit} unit has no beds under {policy:?}; its admissions will wait forever");
            }
        }

        Self {
            pools,
            routes,
            census: [0; 2],
        }
    }

    /// Ask for a bed in `unit`. Returns the admission if a bed was free, or `None` once the request is queued.
    pub fn request(&mut self, unit: Unit, waiter: W) -> Option<Admission<W>> {
        let route = self.routes[unit.index()];
        let pool = match route.second {
            Some(second) if !self.pools[route.first].has_free_slot() => second,
            _ => route.first,
        };

        match self.pools[pool].request(route.priority, Waiting { unit, waiter }) {
            Acquisition::Granted(grant) => Some(self.admit(grant)),
            Acquisition::Queued => None,
        }
    }

    /// Free the bed a patient of `unit` was holding. A queued request that takes over the bed is returned already
    /// admitted.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignToken`] if the token does not match any pool with beds in use.
    pub fn release(&mut self, unit: Unit, token: BedToken) -> Result<Option<Admission<W>>, Error> {
        let pool = self.pools.get_mut(token.pool()).ok_or_else(|| Error::ForeignToken {
            pool: format!("#{}", token.pool()),
        })?;
        let next = pool.release(token)?;

        let census = &mut self.census[unit.index()];
        *census = census.saturating_sub(1);
        Ok(next.map(|grant| self.admit(grant)))
    }

    fn admit(&mut self, grant: Grant<Waiting<W>>) -> Admission<W> {
        let Waiting { unit, waiter } = grant.waiter;
        self.census[unit.index()] += 1;
        Admission {
            unit,
            token: grant.token,
            waiter,
        }
    }

    /// Patients currently in a bed of `unit`, whichever pool the bed came from.
    pub fn census(&self, unit: Unit) -> usize {
        self.census[unit.index()]
    }

    /// Beds in use per pool, in pool order.
    pub fn pool_occupancy(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.pools.iter().map(|pool| (pool.name(), pool.occupancy()))
    }

    /// Requests still waiting for `unit`.
    pub fn waiting_for(&self, unit: Unit) -> usize {
        let route = self.routes[unit.index()];
        std::iter::once(route.first)
            .chain(route.second)
            .map(|id| self.pools[id].waiting_for(|waiting| waiting.unit == unit))
            .sum()
    }

    pub fn status(&self) -> Vec<PoolStatus> {
        self.pools
            .iter()
            .map(|pool| PoolStatus {
                name: pool.name().to_string(),
                capacity: pool.capacity(),
                occupancy: pool.occupancy(),
                queue_len: pool.queue_len(),
                peak_queue: pool.peak_queue(),
            })
            .collect()
    }
}
