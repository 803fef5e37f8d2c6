//! Capacity-bounded bed pools with priority-ordered waiting lists.

use crate::Error;

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Position in a waiting list. Lower values are served first.
pub type Priority = u8;

/// Index of a pool within the [`Beds`] that own it.
///
/// [`Beds`]: crate::policy::Beds
pub type PoolId = usize;

/// Proof of a held bed. Consumed by [`ResourcePool::release()`], so a bed cannot be handed back twice.
#[derive(Debug, PartialEq, Eq)]
pub struct BedToken {
    pool: PoolId,
    serial: u64,
}

impl BedToken {
    /// The pool that granted this token.
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    /// Issue number within the pool, counting from zero.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Outcome of [`ResourcePool::request()`].
#[derive(Debug)]
pub enum Acquisition<W> {
    /// A bed was free and is now held by the returned waiter.
    Granted(Grant<W>),
    /// Every bed is taken; the waiter sits in the queue until a release reaches it.
    Queued,
}

/// A bed handed to a waiter, either immediately or when a queued request reached the front.
#[derive(Debug)]
pub struct Grant<W> {
    pub token: BedToken,
    pub waiter: W,
}

#[derive(Debug)]
struct PendingRequest<W> {
    priority: Priority,
    sequence: u64,
    waiter: W,
}

impl<W> PartialEq for PendingRequest<W> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl<W> Eq for PendingRequest<W> {}

impl<W> PartialOrd for PendingRequest<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W> Ord for PendingRequest<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

/// A fixed number of beds and the requests waiting for them.
///
/// Beds in use never exceed capacity. Whenever a bed frees up, the waiting request with the lowest [`Priority`] value
/// takes it, ties going to whichever asked first. A pool of capacity zero is allowed and simply never grants anything.
///
/// `W` is whatever a request needs to carry while it waits; the pathway model queues the patient itself.
#[derive(Debug)]
pub struct ResourcePool<W> {
    id: PoolId,
    name: String,
    capacity: usize,
    in_use: usize,
    waiting: BinaryHeap<Reverse<PendingRequest<W>>>,
    requests_made: u64,
    tokens_issued: u64,
    peak_queue: usize,
}

impl<W> ResourcePool<W> {
    pub fn new(id: PoolId, name: impl Into<String>, capacity: usize) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            in_use: 0,
            waiting: BinaryHeap::new(),
            requests_made: 0,
            tokens_issued: 0,
            peak_queue: 0,
        }
    }

    /// Ask for a bed on behalf of `waiter`.
    ///
    /// The request only jumps straight to a bed when nobody else is waiting, so an early arrival at a higher
    /// priority is never overtaken by a later one that happens to find the pool momentarily free.
    pub fn request(&mut self, priority: Priority, waiter: W) -> Acquisition<W> {
        let sequence = self.requests_made;
        self.requests_made += 1;

        if self.has_free_slot() && self.waiting.is_empty() {
            self.in_use += 1;
            return Acquisition::Granted(Grant {
                token: self.issue_token(),
                waiter,
            });
        }

        self.waiting.push(Reverse(PendingRequest {
            priority,
            sequence,
            waiter,
        }));
        self.peak_queue = self.peak_queue.max(self.waiting.len());
        Acquisition::Queued
    }

    /// Hand a bed back. If anyone is waiting, the front of the queue gets the bed straight away and is returned so the
    /// caller can resume it within the same instant.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignToken`] if the token came from another pool, or this pool has no beds in use.
    pub fn release(&mut self, token: BedToken) -> Result<Option<Grant<W>>, Error> {
        if token.pool != self.id || self.in_use == 0 {
            return Err(Error::ForeignToken {
                pool: self.name.clone(),
            });
        }
        self.in_use -= 1;

        if !self.has_free_slot() {
            return Ok(None);
        }
        Ok(self.waiting.pop().map(|Reverse(pending)| {
            self.in_use += 1;
            Grant {
                token: self.issue_token(),
                waiter: pending.waiter,
            }
        }))
    }

    fn issue_token(&mut self) -> BedToken {
        let serial = self.tokens_issued;
        self.tokens_issued += 1;
        BedToken { pool: self.id, serial }
    }

    /// Beds currently held.
    pub fn occupancy(&self) -> usize {
        self.in_use
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_free_slot(&self) -> bool {
        self.in_use < self.capacity
    }

    /// Requests still waiting for a bed.
    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    /// Waiting requests whose payload matches `predicate`.
    pub fn waiting_for(&self, mut predicate: impl FnMut(&W) -> bool) -> usize {
        self.waiting
            .iter()
            .filter(|Reverse(pending)| predicate(&pending.waiter))
            .count()
    }

    /// Longest the waiting list has been.
    pub fn peak_queue(&self) -> usize {
        self.peak_queue
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
