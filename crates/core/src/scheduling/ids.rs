//! Task id allocation
//!
//! Two allocation policies share the same base value but differ on reuse:
//!
//! - [`RecyclingIdAllocator`] (in-process backend) hands released ids back
//!   out, smallest first.
//! - [`MonotonicIdAllocator`] (delegating backend) never reuses an id within
//!   a process lifetime and persists its counter through a
//!   [`CounterStore`](super::ports::CounterStore) after every allocation, so
//!   a restart cannot reissue an id the external scheduler may still treat
//!   as the old task.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chime_domain::constants::TASK_ID_BASE;
use chime_domain::{Result, TaskId};
use tracing::debug;

use super::ports::CounterStore;

/// Recycling allocator: smallest released id first, counter otherwise.
#[derive(Debug)]
pub struct RecyclingIdAllocator {
    next: i32,
    free: BTreeSet<i32>,
    active: HashSet<i32>,
}

impl RecyclingIdAllocator {
    /// Allocator seeded at the shared id base.
    pub fn new() -> Self {
        Self::with_base(TASK_ID_BASE)
    }

    /// Allocator seeded at a custom base (tests).
    pub fn with_base(base: i32) -> Self {
        Self { next: base, free: BTreeSet::new(), active: HashSet::new() }
    }

    /// Hand out the smallest previously released id, or the next counter
    /// value if the free pool is empty.
    pub fn allocate(&mut self) -> TaskId {
        let raw = match self.free.pop_first() {
            Some(recycled) => recycled,
            None => {
                let fresh = self.next;
                self.next += 1;
                fresh
            }
        };
        self.active.insert(raw);
        TaskId::new(raw)
    }

    /// Return `id` to the free pool. Idempotent: releasing an id that is
    /// not currently allocated is a no-op, never an error.
    pub fn release(&mut self, id: TaskId) {
        if self.active.remove(&id.raw()) {
            self.free.insert(id.raw());
        }
    }

    /// Whether `id` is currently handed out.
    pub fn is_active(&self, id: TaskId) -> bool {
        self.active.contains(&id.raw())
    }

    /// Number of currently live ids.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl Default for RecyclingIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic allocator: never reuses an id, persists the counter.
pub struct MonotonicIdAllocator {
    next: i32,
    active: HashSet<i32>,
    store: Arc<dyn CounterStore>,
}

impl MonotonicIdAllocator {
    /// Build an allocator seeded from the persisted counter (or the id base
    /// when nothing was persisted yet).
    pub fn new(store: Arc<dyn CounterStore>) -> Result<Self> {
        let persisted = store.load()?;
        let next = persisted.map_or(i64::from(TASK_ID_BASE), |v| v.max(i64::from(TASK_ID_BASE)));
        debug!(next, "seeded monotonic id allocator");
        Ok(Self { next: next as i32, active: HashSet::new(), store })
    }

    /// Allocate the next id, persisting the advanced counter first.
    ///
    /// When the persist fails the counter is not advanced and no id is
    /// handed out, so a crash can never leave the store behind the live
    /// id range.
    pub fn allocate(&mut self) -> Result<TaskId> {
        let raw = self.next;
        self.store.save(i64::from(raw) + 1)?;
        self.next += 1;
        self.active.insert(raw);
        Ok(TaskId::new(raw))
    }

    /// Drop `id` from the live set. The id is gone for good; monotonic
    /// allocation never recycles. Idempotent.
    pub fn release(&mut self, id: TaskId) {
        self.active.remove(&id.raw());
    }

    /// Whether `id` is currently live.
    pub fn is_active(&self, id: TaskId) -> bool {
        self.active.contains(&id.raw())
    }

    /// Number of currently live ids.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
