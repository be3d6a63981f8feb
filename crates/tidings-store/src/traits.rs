//! Store trait definitions

use std::collections::{BTreeMap, HashMap};
use tidings_api::NotificationRequest;
use tidings_util::NotificationId;
use tracing::warn;

use crate::{StoreError, StoreResult};

/// Last-fired timestamps (epoch ms) by notification id
pub type FiredHistory = HashMap<NotificationId, i64>;

/// Main store trait
pub trait NotificationStore: Send + Sync {
    // Requests

    /// Raw persisted JSON for `id`
    fn get_raw(&self, id: NotificationId) -> StoreResult<Option<String>>;

    /// Raw persisted JSON of every request
    fn get_all_raw(&self) -> StoreResult<BTreeMap<NotificationId, String>>;

    /// Upsert a request keyed by its id
    fn save(&self, request: &NotificationRequest) -> StoreResult<()>;

    /// Delete the request and its fired record. Idempotent.
    fn remove(&self, id: NotificationId) -> StoreResult<()>;

    // Fired records

    /// Upsert the fired record for `id`
    fn register_fired(&self, id: NotificationId, at: i64) -> StoreResult<()>;

    /// Snapshot of every fired record
    fn fired_snapshot(&self) -> StoreResult<FiredHistory>;

    /// Last fired timestamp for `id`, 0 if none
    fn last_fired(&self, id: NotificationId) -> StoreResult<i64> {
        Ok(self.fired_snapshot()?.get(&id).copied().unwrap_or(0))
    }

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;

    /// Get a request. Malformed data is logged and reported as absent.
    fn get(&self, id: NotificationId) -> StoreResult<Option<NotificationRequest>> {
        let Some(json) = self.get_raw(id)? else {
            return Ok(None);
        };

        match NotificationRequest::from_json(&json) {
            Ok(request) => Ok(Some(request)),
            Err(e) => {
                warn!(id = %id, error = %e, "Ignoring malformed persisted request");
                Ok(None)
            }
        }
    }

    /// All well-formed requests
    fn get_all(&self) -> StoreResult<HashMap<NotificationId, NotificationRequest>> {
        let mut requests = HashMap::new();
        for (id, json) in self.get_all_raw()? {
            match NotificationRequest::from_json(&json) {
                Ok(request) => {
                    requests.insert(id, request);
                }
                Err(e) => warn!(id = %id, error = %e, "Skipping malformed persisted request"),
            }
        }
        Ok(requests)
    }

    /// Ids of every persisted request
    fn ids(&self) -> StoreResult<Vec<NotificationId>> {
        Ok(self.get_all_raw()?.into_keys().collect())
    }

    /// Validate and save a raw JSON request under `id`
    fn save_raw(&self, id: NotificationId, json: &str) -> StoreResult<()> {
        let request = NotificationRequest::from_json(json).map_err(|e| StoreError::Malformed {
            id: Some(id),
            reason: e.to_string(),
        })?;

        if request.id != id {
            return Err(StoreError::Malformed {
                id: Some(id),
                reason: format!("payload id {} does not match key {}", request.id, id),
            });
        }

        self.save(&request)
    }
}
