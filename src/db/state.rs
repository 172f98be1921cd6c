use super::db::Db;
use crate::libs::persistence::{StateStorage, StoredValue};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

const SCHEMA_KV_STATE: &str = "CREATE TABLE IF NOT EXISTS kv_state (
    key TEXT NOT NULL PRIMARY KEY,
    value TEXT NOT NULL,
    revision INTEGER NOT NULL,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);";
const SELECT_STATE: &str = "SELECT value, revision FROM kv_state WHERE key = ?1";
const SELECT_REVISION: &str = "SELECT revision FROM kv_state WHERE key = ?1";
const UPSERT_STATE: &str = "INSERT INTO kv_state (key, value, revision, updated_at) VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, revision = excluded.revision, updated_at = CURRENT_TIMESTAMP";
const DELETE_STATE: &str = "DELETE FROM kv_state WHERE key = ?1";

/// Key-value state table. Queries run on the blocking pool.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Storage in `eisen.db` under the data directory.
    pub fn new() -> Result<SqliteStorage> {
        Self::from_db(Db::new()?)
    }

    /// Storage in the database at `path`, created if missing.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or the table cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SqliteStorage> {
        Self::from_db(Db::open(path)?)
    }

    fn from_db(db: Db) -> Result<SqliteStorage> {
        db.conn.execute(SCHEMA_KV_STATE, [])?;
        Ok(SqliteStorage {
            conn: Arc::new(Mutex::new(db.conn)),
        })
    }
}

#[async_trait]
impl StateStorage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<StoredValue>> {
            let conn = conn.lock();
            let stored = conn
                .query_row(SELECT_STATE, params![key], |row| {
                    Ok(StoredValue {
                        value: row.get(0)?,
                        revision: row.get::<_, i64>(1)? as u64,
                    })
                })
                .optional()?;
            Ok(stored)
        })
        .await?
    }

    async fn set(&self, key: &str, value: &str, revision: u64) -> Result<bool> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            // Compare and write under one lock so two writers cannot interleave.
            let conn = conn.lock();
            let current: Option<i64> = conn.query_row(SELECT_REVISION, params![key], |row| row.get(0)).optional()?;
            if matches!(current, Some(stored) if stored as u64 > revision) {
                return Ok(false);
            }
            conn.execute(UPSERT_STATE, params![key, value, revision as i64])?;
            Ok(true)
        })
        .await?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            conn.lock().execute(DELETE_STATE, params![key])?;
            Ok(())
        })
        .await?
    }
}
