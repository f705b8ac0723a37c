//! Shared mock implementations for scheduler integration tests.
//!
//! In-memory stand-ins for the alarm boundary, the reminder sink and the
//! counter store, with switchable failure modes for exercising the error
//! paths deterministically.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chime_core::scheduling::ports::{AlarmBoundary, CounterStore, ReminderSink};
use chime_domain::{ArmRequest, ChimeError, ReminderFire, Result, TaskId};

/// Recording boundary: remembers every arm and cancel, keeps an active set
/// for the query calls, and can be told to fail any operation group.
pub struct RecordingBoundary {
    persistent: bool,
    fail_arm: AtomicBool,
    fail_cancel: AtomicBool,
    fail_queries: AtomicBool,
    armed: Mutex<Vec<ArmRequest>>,
    active: Mutex<HashMap<TaskId, i64>>,
    canceled: Mutex<Vec<TaskId>>,
    enabled: Mutex<Option<bool>>,
}

impl RecordingBoundary {
    /// Boundary that probes as non-persistent.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    /// Boundary that probes as persistent.
    pub fn persistent() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(persistent: bool) -> Self {
        Self {
            persistent,
            fail_arm: AtomicBool::new(false),
            fail_cancel: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
            armed: Mutex::new(Vec::new()),
            active: Mutex::new(HashMap::new()),
            canceled: Mutex::new(Vec::new()),
            enabled: Mutex::new(None),
        }
    }

    pub fn set_fail_arm(&self, fail: bool) {
        self.fail_arm.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn arm_count(&self) -> usize {
        self.armed.lock().expect("armed lock").len()
    }

    pub fn last_armed(&self) -> Option<ArmRequest> {
        self.armed.lock().expect("armed lock").last().cloned()
    }

    pub fn canceled_ids(&self) -> Vec<TaskId> {
        self.canceled.lock().expect("canceled lock").clone()
    }

    pub fn last_enabled(&self) -> Option<bool> {
        *self.enabled.lock().expect("enabled lock")
    }
}

#[async_trait]
impl AlarmBoundary for RecordingBoundary {
    async fn arm(&self, request: &ArmRequest) -> Result<()> {
        if self.fail_arm.load(Ordering::SeqCst) {
            return Err(ChimeError::Boundary("arm refused".into()));
        }
        self.active.lock().expect("active lock").insert(request.id, request.trigger_at_ms);
        self.armed.lock().expect("armed lock").push(request.clone());
        Ok(())
    }

    async fn cancel(&self, id: TaskId) -> Result<()> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(ChimeError::Boundary("cancel refused".into()));
        }
        self.active.lock().expect("active lock").remove(&id);
        self.canceled.lock().expect("canceled lock").push(id);
        Ok(())
    }

    async fn cancel_all(&self, ids: &[TaskId]) -> Result<()> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(ChimeError::Boundary("cancelAll refused".into()));
        }
        let mut active = self.active.lock().expect("active lock");
        for id in ids {
            active.remove(id);
        }
        self.canceled.lock().expect("canceled lock").extend_from_slice(ids);
        Ok(())
    }

    async fn is_scheduled(&self, id: TaskId) -> Result<bool> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ChimeError::Boundary("query refused".into()));
        }
        Ok(self.active.lock().expect("active lock").contains_key(&id))
    }

    async fn next_fire_at(&self, id: TaskId) -> Result<i64> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ChimeError::Boundary("query refused".into()));
        }
        Ok(self.active.lock().expect("active lock").get(&id).copied().unwrap_or(0))
    }

    async fn set_globally_enabled(&self, enabled: bool) -> Result<()> {
        *self.enabled.lock().expect("enabled lock") = Some(enabled);
        Ok(())
    }

    async fn ensure_permissions(&self) -> Result<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }
}

/// Sink that counts delivered fires, with an optional failure switch.
pub struct CountingSink {
    fires: Mutex<Vec<ReminderFire>>,
    fail: AtomicBool,
}

impl CountingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { fires: Mutex::new(Vec::new()), fail: AtomicBool::new(false) })
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fire_count(&self) -> usize {
        self.fires.lock().expect("fires lock").len()
    }

    pub fn fires(&self) -> Vec<ReminderFire> {
        self.fires.lock().expect("fires lock").clone()
    }
}

#[async_trait]
impl ReminderSink for CountingSink {
    async fn deliver(&self, fire: &ReminderFire) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChimeError::Internal("sink refused".into()));
        }
        self.fires.lock().expect("fires lock").push(fire.clone());
        Ok(())
    }
}

/// In-memory counter store.
pub struct MemoryCounterStore {
    value: Mutex<Option<i64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { value: Mutex::new(None) })
    }
}

impl CounterStore for MemoryCounterStore {
    fn load(&self) -> Result<Option<i64>> {
        Ok(*self.value.lock().expect("store lock"))
    }

    fn save(&self, next: i64) -> Result<()> {
        *self.value.lock().expect("store lock") = Some(next);
        Ok(())
    }
}
