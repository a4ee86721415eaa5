//! Bulk scraping pipeline.
//!
//! Discover product links on a listing page, filter them by what the cards
//! show, then fetch, parse, validate and save them in paced chunks. Each
//! chunk runs its items concurrently and settles completely before the next
//! one starts.

pub mod events;
mod handle;
pub mod runner;

pub use events::{
    ChunkResult, ItemOutcome, OutcomeCounts, PipelineError, PipelineEvent, PipelineSnapshot,
    PipelineState, PipelineSummary,
};
pub use handle::StopHandle;
pub use runner::BulkPipeline;

use crate::models::WorkItem;

/// Default number of items fetched concurrently per chunk.
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Inclusive price bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Pre-fetch filtering over discovered items.
#[derive(Debug, Clone, Default)]
pub struct WorkFilter {
    /// Bounds on the price shown on the listing card. Items whose card
    /// shows no price are kept.
    pub price: PriceRange,
    /// Maximum number of items to process, applied after the price filter.
    pub limit: Option<usize>,
}

impl WorkFilter {
    pub fn apply(&self, items: Vec<WorkItem>) -> Vec<WorkItem> {
        let filtered = items.into_iter().filter(|item| match item.listed_price {
            Some(p) => self.price.contains(p),
            None => true,
        });
        match self.limit {
            Some(limit) => filtered.take(limit).collect(),
            None => filtered.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize, price: Option<f64>) -> WorkItem {
        let mut item = WorkItem::new(format!("https://www.amazon.com/dp/B00000000{}", n));
        item.listed_price = price;
        item
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let range = PriceRange::new(Some(5.0), Some(50.0));
        assert!(range.contains(5.0));
        assert!(range.contains(50.0));
        assert!(!range.contains(4.99));
        assert!(!range.contains(50.01));
        assert!(PriceRange::default().contains(0.0));
    }

    #[test]
    fn test_filter_keeps_items_without_listed_price() {
        let filter = WorkFilter {
            price: PriceRange::new(Some(5.0), Some(50.0)),
            limit: None,
        };
        let kept = filter.apply(vec![
            item(1, Some(1.0)),
            item(2, None),
            item(3, Some(20.0)),
            item(4, Some(99.0)),
        ]);
        let urls: Vec<_> = kept.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://www.amazon.com/dp/B000000002", "https://www.amazon.com/dp/B000000003"]
        );
    }

    #[test]
    fn test_limit_applies_after_price_filter() {
        let filter = WorkFilter {
            price: PriceRange::new(Some(10.0), None),
            limit: Some(2),
        };
        let kept = filter.apply(vec![
            item(1, Some(1.0)),
            item(2, Some(10.0)),
            item(3, Some(11.0)),
            item(4, Some(12.0)),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].listed_price, Some(10.0));
    }
}
