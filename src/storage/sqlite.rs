//! SQLite-backed settings: channel-play bindings and feature flags.
//!
//! Active call state is runtime-only and kept in memory next to the connection.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::SettingsStore;
use crate::error::{Error, Result};

const LOGGER_FLAG: &str = "logger";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    calls: Mutex<HashSet<i64>>,
}

/// One row of the `channel_play` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub group_id: i64,
    pub channel_id: i64,
    pub updated_at: i64,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("sqlite open: {}", e)))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("sqlite open: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS channel_play (
                group_id INTEGER PRIMARY KEY,
                channel_id INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS flags (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| Error::Storage(format!("sqlite init: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
            calls: Mutex::new(HashSet::new()),
        })
    }

    /// All channel-play bindings, oldest first.
    pub async fn bindings(&self) -> Result<Vec<Binding>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT group_id, channel_id, updated_at FROM channel_play ORDER BY updated_at")
            .map_err(|e| Error::Storage(format!("sqlite prepare bindings: {}", e)))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Binding {
                    group_id: row.get(0)?,
                    channel_id: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })
            .map_err(|e| Error::Storage(format!("sqlite query bindings: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get_cmode(&self, group_id: i64) -> Result<Option<i64>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT channel_id FROM channel_play WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Storage(format!("sqlite read binding: {}", e)))
    }

    async fn set_cmode(&self, group_id: i64, channel_id: Option<i64>) -> Result<()> {
        let conn = self.conn.lock().await;
        match channel_id {
            Some(channel_id) => {
                conn.execute(
                    "INSERT INTO channel_play (group_id, channel_id, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(group_id) DO UPDATE SET channel_id = excluded.channel_id, updated_at = excluded.updated_at",
                    params![group_id, channel_id, chrono::Utc::now().timestamp_millis()],
                )
                .map_err(|e| Error::Storage(format!("sqlite write binding: {}", e)))?;
                tracing::info!("Channel play for {} bound to {}", group_id, channel_id);
            }
            None => {
                conn.execute(
                    "DELETE FROM channel_play WHERE group_id = ?1",
                    params![group_id],
                )
                .map_err(|e| Error::Storage(format!("sqlite clear binding: {}", e)))?;
                tracing::info!("Channel play for {} cleared", group_id);
            }
        }
        Ok(())
    }

    async fn is_logger(&self) -> Result<bool> {
        let conn = self.conn.lock().await;
        let value: Option<i64> = conn
            .query_row(
                "SELECT value FROM flags WHERE key = ?1",
                params![LOGGER_FLAG],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Storage(format!("sqlite read flag: {}", e)))?;
        Ok(value.unwrap_or(0) != 0)
    }

    async fn set_logger(&self, enabled: bool) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO flags (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LOGGER_FLAG, enabled as i64],
        )
        .map_err(|e| Error::Storage(format!("sqlite write flag: {}", e)))?;
        Ok(())
    }

    async fn get_call(&self, destination: i64) -> bool {
        self.calls.lock().await.contains(&destination)
    }

    async fn set_call(&self, destination: i64, active: bool) {
        let mut calls = self.calls.lock().await;
        if active {
            calls.insert(destination);
        } else {
            calls.remove(&destination);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_binding_last_write_wins() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_cmode(-100).await.unwrap(), None);

        store.set_cmode(-100, Some(-1001)).await.unwrap();
        store.set_cmode(-100, Some(-1002)).await.unwrap();
        assert_eq!(store.get_cmode(-100).await.unwrap(), Some(-1002));
        assert_eq!(store.bindings().await.unwrap().len(), 1);

        store.set_cmode(-100, None).await.unwrap();
        assert_eq!(store.get_cmode(-100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clearing_missing_binding_is_ok() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_cmode(-5, None).await.unwrap();
        assert!(store.bindings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logger_flag_defaults_off() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.is_logger().await.unwrap());
        store.set_logger(true).await.unwrap();
        assert!(store.is_logger().await.unwrap());
        store.set_logger(false).await.unwrap();
        assert!(!store.is_logger().await.unwrap());
    }

    #[tokio::test]
    async fn test_call_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.get_call(7).await);
        store.set_call(7, true).await;
        assert!(store.get_call(7).await);
        assert!(!store.get_call(8).await);
        store.set_call(7, false).await;
        assert!(!store.get_call(7).await);
    }

    #[tokio::test]
    async fn test_bindings_persist_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("settings.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set_cmode(-1, Some(-2)).await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_cmode(-1).await.unwrap(), Some(-2));
    }
}
