//! Local persistence for scraped records.
//!
//! Records live under two keys in a key-value store, each holding the whole
//! record array. Two backends implement `KeyValueStore`:
//! - `FileStore`: one JSON document on disk (primary)
//! - `SqliteStore`: a key/value table in SQLite (secondary)
//!
//! `FallbackStore` tries the primary and falls back to the secondary,
//! reporting which tier served each call. `RecordStore` layers
//! last-write-wins upserts on top.

mod fallback;
mod file;
mod memory;
mod records;
mod sqlite;

pub use fallback::{FallbackStore, StoreTier, TierValues};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use records::{RecordKind, RecordStore, SaveOutcome};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

/// Key holding the product array.
pub const PRODUCTS_KEY: &str = "scrapedProducts";
/// Key holding the order array.
pub const ORDERS_KEY: &str = "scrapedOrders";

/// Errors from store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("primary store failed ({primary}); secondary store failed ({secondary})")]
    AllTiersFailed {
        primary: Box<StoreError>,
        secondary: Box<StoreError>,
    },
}

/// A string-keyed store of JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Shared backend handle.
pub type BoxedStore = std::sync::Arc<dyn KeyValueStore>;

/// Run blocking store I/O off the async runtime.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
}
