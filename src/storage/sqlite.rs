//! SQLite key/value store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{run_blocking, KeyValueStore, StoreError};

/// Key/value table in a SQLite database file.
#[derive(Debug)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database and its table.
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = connect(&self.db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }
}

fn connect(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let (path, key) = (self.db_path.clone(), key.to_string());
        run_blocking(move || {
            let text: Option<String> = connect(&path)?
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            match text {
                Some(t) => Ok(Some(serde_json::from_str(&t)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let (path, key) = (self.db_path.clone(), key.to_string());
        let text = serde_json::to_string(&value)?;
        run_blocking(move || {
            connect(&path)?.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, text, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let (path, key) = (self.db_path.clone(), key.to_string());
        run_blocking(move || {
            connect(&path)?.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
            Ok(())
        })
        .await
    }
}
