//! Pacing for chunk starts.
//!
//! The bulk pipeline asks a `Pacer` for permission before each chunk.
//! Two implementations:
//! - `TokenBucket`: fixed-rate pacing (one chunk per interval by default)
//! - `Unpaced`: no waiting, for tests and saved-file runs

mod bucket;

pub use bucket::TokenBucket;

use async_trait::async_trait;

/// Grants permission to start the next unit of work.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until one unit may start, then consume it.
    async fn acquire(&self);
}

/// A pacer that never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

#[async_trait]
impl Pacer for Unpaced {
    async fn acquire(&self) {}
}

/// Shared pacer handle.
pub type BoxedPacer = std::sync::Arc<dyn Pacer>;
