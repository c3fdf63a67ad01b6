use anyhow::Result;
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

pub const TICKETS_KEY: &str = "helpdesk-tickets";
pub const KNOWLEDGE_KEY: &str = "helpdesk-knowledge";
pub const ADMIN_SESSION_KEY: &str = "helpdesk-admin-session";

/// Key-value persistence adapter. Implementations never panic and never
/// return an error: a failed read is `None`, a failed write is `false`,
/// and the diagnostic goes to the log. Callers keep operating on their
/// in-memory copy when a write fails.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn remove(&self, key: &str) -> bool;
}

/// SQLite-backed adapter over a single `kv` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opening is the one loud failure point; everything after goes
    /// through the infallible adapter contract.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );
        "#,
    )?;
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.conn();
        match conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        }) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(err) => {
                tracing::error!(key, %err, "kv read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> bool {
        let conn = self.conn();
        let result = conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET
              value=excluded.value,
              updated_at=strftime('%Y-%m-%dT%H:%M:%fZ','now')
            "#,
            params![key, value],
        );
        match result {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(key, %err, "kv write failed");
                false
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        let conn = self.conn();
        match conn.execute("DELETE FROM kv WHERE key = ?1", params![key]) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(key, %err, "kv delete failed");
                false
            }
        }
    }
}

/// In-memory adapter for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.entries().insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&self, key: &str) -> bool {
        self.entries().remove(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        assert!(store.set("k", "v"));
        assert_eq!(store.get("k"), Some("v".to_string()));
        assert!(store.remove("k"));
        assert_eq!(store.get("k"), None);
        // Removing an absent key is still a success.
        assert!(store.remove("k"));
    }

    #[test]
    fn sqlite_store_upserts_by_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.set("k", "first"));
        assert!(store.set("k", "second"));
        assert_eq!(store.get("k"), Some("second".to_string()));
    }

    #[test]
    fn sqlite_store_missing_key_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("missing"), None);
    }
}
