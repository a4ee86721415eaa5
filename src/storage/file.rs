//! JSON file store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{run_blocking, KeyValueStore, StoreError};

/// All keys in one JSON object on disk, rewritten atomically on each change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write of the whole document.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_all(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(io_error(path, e)),
    };
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Unavailable(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
    }
}

fn write_all(path: &Path, map: &Map<String, Value>) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), map)?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        let (path, key) = (self.path.clone(), key.to_string());
        run_blocking(move || Ok(read_all(&path)?.remove(&key))).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let (path, key) = (self.path.clone(), key.to_string());
        run_blocking(move || {
            let mut map = read_all(&path)?;
            map.insert(key, value);
            write_all(&path, &map)
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let (path, key) = (self.path.clone(), key.to_string());
        run_blocking(move || {
            let mut map = read_all(&path)?;
            if map.remove(&key).is_some() {
                write_all(&path, &map)?;
            }
            Ok(())
        })
        .await
    }
}
