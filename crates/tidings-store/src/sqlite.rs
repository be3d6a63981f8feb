//! SQLite-based store implementation

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tidings_api::NotificationRequest;
use tidings_util::NotificationId;
use tracing::{debug, warn};

use crate::{FiredHistory, NotificationStore, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Stored JSON as a string. Invalid UTF-8 is replaced so the JSON
    /// parser rejects the row as malformed; non-text values yield `None`.
    fn request_json(value: ValueRef<'_>) -> Option<String> {
        match value {
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
            ValueRef::Null | ValueRef::Integer(_) | ValueRef::Real(_) => None,
        }
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Notification requests, one row per id
            CREATE TABLE IF NOT EXISTS requests (
                id INTEGER PRIMARY KEY,
                request_json TEXT NOT NULL
            );

            -- Last registered firing per id
            CREATE TABLE IF NOT EXISTS fired (
                id INTEGER PRIMARY KEY,
                fired_at INTEGER NOT NULL
            );
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl NotificationStore for SqliteStore {
    fn get_raw(&self, id: NotificationId) -> StoreResult<Option<String>> {
        let conn = self.conn()?;

        let json: Option<Option<String>> = conn
            .query_row(
                "SELECT request_json FROM requests WHERE id = ?",
                [id.get()],
                |row| Ok(Self::request_json(row.get_ref(0)?)),
            )
            .optional()?;

        match json {
            Some(None) => {
                warn!(id = %id, "Ignoring request stored with a non-text value");
                Ok(None)
            }
            Some(json) => Ok(json),
            None => Ok(None),
        }
    }

    fn get_all_raw(&self) -> StoreResult<BTreeMap<NotificationId, String>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id, request_json FROM requests ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            Ok((id, Self::request_json(row.get_ref(1)?)))
        })?;

        let mut requests = BTreeMap::new();
        for row in rows {
            let (raw_id, json) = row?;
            let Ok(id) = i32::try_from(raw_id) else {
                warn!(id = raw_id, "Skipping request with out-of-range id");
                continue;
            };
            let id = NotificationId::new(id);
            match json {
                Some(json) => {
                    requests.insert(id, json);
                }
                None => warn!(id = %id, "Skipping request stored with a non-text value"),
            }
        }

        Ok(requests)
    }

    fn save(&self, request: &NotificationRequest) -> StoreResult<()> {
        let json = serde_json::to_string(request)?;
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO requests (id, request_json)
            VALUES (?, ?)
            ON CONFLICT(id)
            DO UPDATE SET request_json = excluded.request_json
            "#,
            params![request.id.get(), json],
        )?;

        debug!(id = %request.id, at_time = request.at_time, "Request saved");
        Ok(())
    }

    fn remove(&self, id: NotificationId) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM requests WHERE id = ?", [id.get()])?;
        tx.execute("DELETE FROM fired WHERE id = ?", [id.get()])?;
        tx.commit()?;

        debug!(id = %id, existed = removed > 0, "Request removed");
        Ok(())
    }

    fn register_fired(&self, id: NotificationId, at: i64) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO fired (id, fired_at)
            VALUES (?, ?)
            ON CONFLICT(id)
            DO UPDATE SET fired_at = excluded.fired_at
            "#,
            params![id.get(), at],
        )?;

        debug!(id = %id, fired_at = at, "Firing registered");
        Ok(())
    }

    fn last_fired(&self, id: NotificationId) -> StoreResult<i64> {
        let conn = self.conn()?;

        let fired_at: Option<rusqlite::Result<i64>> = conn
            .query_row("SELECT fired_at FROM fired WHERE id = ?", [id.get()], |row| {
                Ok(row.get::<_, i64>(0))
            })
            .optional()?;

        match fired_at {
            Some(Ok(at)) => Ok(at),
            Some(Err(e)) => {
                warn!(id = %id, error = %e, "Unparseable fired timestamp");
                Ok(0)
            }
            None => Ok(0),
        }
    }

    fn fired_snapshot(&self) -> StoreResult<FiredHistory> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id, fired_at FROM fired")?;
        let rows = stmt.query_map([], |row| {
            let id: i32 = row.get(0)?;
            Ok((NotificationId::new(id), row.get::<_, i64>(1)))
        })?;

        let mut history = FiredHistory::new();
        for row in rows {
            match row? {
                (id, Ok(at)) => {
                    history.insert(id, at);
                }
                (id, Err(e)) => warn!(id = %id, error = %e, "Skipping unparseable fired timestamp"),
            }
        }

        Ok(history)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
