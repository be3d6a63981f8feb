//! In-memory store for tests and ephemeral runs

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tidings_api::NotificationRequest;
use tidings_util::NotificationId;

use crate::{FiredHistory, NotificationStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    requests: BTreeMap<NotificationId, String>,
    fired: FiredHistory,
}

/// Store backed by process memory
///
/// Both namespaces live behind one lock so removal of a request and its
/// fired record is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw JSON without validation (for seeding corrupted data)
    pub fn insert_raw(&self, id: NotificationId, json: impl Into<String>) -> StoreResult<()> {
        self.write()?.requests.insert(id, json.into());
        Ok(())
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.check()?;
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.check()?;
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl NotificationStore for MemoryStore {
    fn get_raw(&self, id: NotificationId) -> StoreResult<Option<String>> {
        Ok(self.read()?.requests.get(&id).cloned())
    }

    fn get_all_raw(&self) -> StoreResult<BTreeMap<NotificationId, String>> {
        Ok(self.read()?.requests.clone())
    }

    fn save(&self, request: &NotificationRequest) -> StoreResult<()> {
        let json = serde_json::to_string(request)?;
        self.write()?.requests.insert(request.id, json);
        Ok(())
    }

    fn remove(&self, id: NotificationId) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.requests.remove(&id);
        inner.fired.remove(&id);
        Ok(())
    }

    fn register_fired(&self, id: NotificationId, at: i64) -> StoreResult<()> {
        self.write()?.fired.insert(id, at);
        Ok(())
    }

    fn fired_snapshot(&self) -> StoreResult<FiredHistory> {
        Ok(self.read()?.fired.clone())
    }

    fn is_healthy(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst) && self.inner.read().is_ok()
    }
}
