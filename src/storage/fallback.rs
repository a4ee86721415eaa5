//! Ordered primary/secondary fallback.

use serde_json::Value;
use tracing::{debug, warn};

use super::{BoxedStore, StoreError};

/// Which backend served a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTier {
    Primary,
    Secondary,
}

impl StoreTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for StoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What each tier holds for one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierValues {
    pub primary: Option<Value>,
    /// Only populated by writes made while the primary was failing.
    pub secondary: Option<Value>,
}

/// Two stores tried in order. A call fails only when both tiers fail.
#[derive(Clone)]
pub struct FallbackStore {
    primary: BoxedStore,
    secondary: BoxedStore,
}

impl FallbackStore {
    pub fn new(primary: BoxedStore, secondary: BoxedStore) -> Self {
        Self { primary, secondary }
    }

    /// Read a key from both tiers. An unreachable tier reads as `None`;
    /// the call fails only when neither tier can be read.
    pub async fn get_tiers(&self, key: &str) -> Result<TierValues, StoreError> {
        let primary = self.primary.get(key).await;
        let secondary = self.secondary.get(key).await;
        match (primary, secondary) {
            (Ok(p), Ok(s)) => Ok(TierValues {
                primary: p,
                secondary: s,
            }),
            (Ok(p), Err(e)) => {
                debug!("{} store read of {} failed: {}", self.secondary.name(), key, e);
                Ok(TierValues {
                    primary: p,
                    secondary: None,
                })
            }
            (Err(e), Ok(s)) => {
                warn!(
                    "{} store read of {} failed, using {}: {}",
                    self.primary.name(),
                    key,
                    self.secondary.name(),
                    e
                );
                Ok(TierValues {
                    primary: None,
                    secondary: s,
                })
            }
            (Err(p), Err(s)) => Err(both(p, s)),
        }
    }

    pub async fn set(&self, key: &str, value: Value) -> Result<StoreTier, StoreError> {
        match self.primary.set(key, value.clone()).await {
            Ok(()) => Ok(StoreTier::Primary),
            Err(primary) => {
                warn!(
                    "{} store write of {} failed, using {}: {}",
                    self.primary.name(),
                    key,
                    self.secondary.name(),
                    primary
                );
                match self.secondary.set(key, value).await {
                    Ok(()) => Ok(StoreTier::Secondary),
                    Err(secondary) => Err(both(primary, secondary)),
                }
            }
        }
    }

    /// Drop a key from the secondary once the primary holds its contents.
    pub async fn discard_secondary(&self, key: &str) {
        if let Err(e) = self.secondary.remove(key).await {
            warn!(
                "{} store still holds {} after it was moved to {}: {}",
                self.secondary.name(),
                key,
                self.primary.name(),
                e
            );
        }
    }

    /// Remove a key from every tier that is reachable.
    pub async fn remove(&self, key: &str) -> Result<StoreTier, StoreError> {
        let primary = self.primary.remove(key).await;
        let secondary = self.secondary.remove(key).await;
        match (primary, secondary) {
            (Ok(()), _) => Ok(StoreTier::Primary),
            (Err(p), Ok(())) => {
                warn!("{} store remove of {} failed: {}", self.primary.name(), key, p);
                Ok(StoreTier::Secondary)
            }
            (Err(p), Err(s)) => Err(both(p, s)),
        }
    }
}

fn both(primary: StoreError, secondary: StoreError) -> StoreError {
    StoreError::AllTiersFailed {
        primary: Box::new(primary),
        secondary: Box::new(secondary),
    }
}
