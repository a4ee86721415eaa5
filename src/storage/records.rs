//! Last-write-wins record collections.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{FallbackStore, StoreError, StoreTier, ORDERS_KEY, PRODUCTS_KEY};
use crate::models::{OrderRecord, ProductRecord};

/// Which record collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum RecordKind {
    Products,
    Orders,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "products" | "product" => Some(Self::Products),
            "orders" | "order" => Some(Self::Orders),
            _ => None,
        }
    }

    /// Store key holding this collection.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Products => PRODUCTS_KEY,
            Self::Orders => ORDERS_KEY,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Tier the collection was written to.
    pub tier: StoreTier,
    /// Whether an existing record with the same key was replaced.
    pub replaced: bool,
    /// Collection size after the write.
    pub total: usize,
}

/// Product and order collections over a fallback store.
///
/// Each upsert reads the whole collection from both tiers, replaces or
/// appends one entry, and writes the collection back. A write that lands on
/// the primary empties the secondary. Upserts within one process are
/// serialized; separate processes are last-write-wins.
pub struct RecordStore {
    kv: FallbackStore,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(kv: FallbackStore) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// The collection as both tiers see it. Secondary entries were written
    /// while the primary was failing, so they win over primary entries with
    /// the same key. The flag reports whether the secondary held anything.
    async fn load<T>(&self, key: &str) -> Result<(Vec<T>, bool), StoreError>
    where
        T: Keyed + Serialize + DeserializeOwned,
    {
        let values = self.kv.get_tiers(key).await?;
        let mut records = decode::<T>(key, values.primary);
        let pending = decode::<T>(key, values.secondary);
        let had_secondary = !pending.is_empty();

        for record in pending {
            if let Some(idx) = records.iter().position(|r| r.same_record(&record)) {
                records[idx] = record;
            } else if record.has_key() || !contains_identical(&records, &record) {
                // A secondary written while the primary was readable repeats
                // its keyless entries verbatim.
                records.push(record);
            }
        }
        Ok((records, had_secondary))
    }

    async fn upsert<T>(&self, key: &str, record: &T) -> Result<SaveOutcome, StoreError>
    where
        T: Keyed + Serialize + DeserializeOwned + Clone,
    {
        let _guard = self.write_lock.lock().await;
        let (mut records, had_secondary) = self.load::<T>(key).await?;

        let replaced = match records.iter().position(|r| r.same_record(record)) {
            Some(idx) => {
                records[idx] = record.clone();
                true
            }
            None => {
                records.push(record.clone());
                false
            }
        };

        let tier = self.kv.set(key, serde_json::to_value(&records)?).await?;
        if tier == StoreTier::Primary && had_secondary {
            debug!("Primary store recovered; folded secondary {} back in", key);
            self.kv.discard_secondary(key).await;
        }
        Ok(SaveOutcome {
            tier,
            replaced,
            total: records.len(),
        })
    }

    /// Upsert a product keyed by (identifier, source).
    pub async fn save_product(&self, record: &ProductRecord) -> Result<SaveOutcome, StoreError> {
        let outcome = self.upsert(PRODUCTS_KEY, record).await?;
        debug!(
            "Saved product {} to {} store (replaced: {})",
            record.label(),
            outcome.tier,
            outcome.replaced
        );
        Ok(outcome)
    }

    /// Upsert an order keyed by order identifier.
    pub async fn save_order(&self, order: &OrderRecord) -> Result<SaveOutcome, StoreError> {
        let outcome = self.upsert(ORDERS_KEY, order).await?;
        debug!(
            "Saved order {} to {} store (replaced: {})",
            order.key().unwrap_or("?"),
            outcome.tier,
            outcome.replaced
        );
        Ok(outcome)
    }

    pub async fn products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        Ok(self.load(PRODUCTS_KEY).await?.0)
    }

    pub async fn orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self.load(ORDERS_KEY).await?.0)
    }

    /// Number of records in a collection.
    pub async fn count(&self, kind: RecordKind) -> Result<usize, StoreError> {
        Ok(match kind {
            RecordKind::Products => self.products().await?.len(),
            RecordKind::Orders => self.orders().await?.len(),
        })
    }

    /// Drop a whole collection.
    pub async fn clear(&self, kind: RecordKind) -> Result<StoreTier, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(kind.key()).await
    }
}

/// Records that upsert by an optional key. Keyless records never match.
trait Keyed {
    fn has_key(&self) -> bool;

    fn same_record(&self, other: &Self) -> bool;
}

impl Keyed for ProductRecord {
    fn has_key(&self) -> bool {
        self.key().is_some()
    }

    fn same_record(&self, other: &Self) -> bool {
        self.has_key() && self.key() == other.key()
    }
}

impl Keyed for OrderRecord {
    fn has_key(&self) -> bool {
        self.key().is_some()
    }

    fn same_record(&self, other: &Self) -> bool {
        self.has_key() && self.key() == other.key()
    }
}

fn contains_identical<T: Serialize>(records: &[T], record: &T) -> bool {
    let Ok(needle) = serde_json::to_value(record) else {
        return false;
    };
    records
        .iter()
        .any(|r| serde_json::to_value(r).is_ok_and(|v| v == needle))
}

fn decode<T: DeserializeOwned>(key: &str, value: Option<Value>) -> Vec<T> {
    let entries = match value {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!("{} holds {}, not an array; treating as empty", key, kind_of(&other));
            Vec::new()
        }
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<T>(entry) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Dropping malformed entry under {}: {}", key, e);
                None
            }
        })
        .collect()
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
