//! Pipeline runner: discovery, filtering, then paced concurrent chunks.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::events::{
    ChunkResult, ItemOutcome, OutcomeCounts, PipelineError, PipelineEvent, PipelineSnapshot,
    PipelineState, PipelineSummary,
};
use super::{StopHandle, WorkFilter, DEFAULT_BATCH_SIZE};
use crate::models::{Site, WorkItem};
use crate::rate_limit::BoxedPacer;
use crate::scrapers::{Scraper, SiteProfile};
use crate::storage::RecordStore;
use crate::validation::prepare;

/// Drives one bulk run at a time.
///
/// State lives here and is published as `PipelineSnapshot`s on a watch
/// channel; per-item detail goes out as `PipelineEvent`s. The event
/// receiver must be drained or the run stalls once the channel is full.
pub struct BulkPipeline {
    scraper: Scraper,
    store: Arc<RecordStore>,
    pacer: BoxedPacer,
    batch_size: usize,
    stop: StopHandle,
    snapshot: watch::Sender<PipelineSnapshot>,
}

impl BulkPipeline {
    pub fn new(scraper: Scraper, store: Arc<RecordStore>, pacer: BoxedPacer) -> Self {
        let (snapshot, _) = watch::channel(PipelineSnapshot::default());
        Self {
            scraper,
            store,
            pacer,
            batch_size: DEFAULT_BATCH_SIZE,
            stop: StopHandle::new(),
            snapshot,
        }
    }

    /// Items per chunk; values below one are treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Live snapshots of the current run.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.snapshot.borrow().clone()
    }

    fn set_state(&self, state: PipelineState) {
        self.snapshot.send_modify(|s| s.state = state);
    }

    /// Discover items on a listing page and process them.
    pub async fn run(
        &self,
        listing: &str,
        site: Option<Site>,
        filter: &WorkFilter,
        events: &mpsc::Sender<PipelineEvent>,
    ) -> Result<PipelineSummary, PipelineError> {
        self.snapshot.send_replace(PipelineSnapshot {
            state: PipelineState::Discovering,
            ..Default::default()
        });

        let (profile, items) = match self.scraper.discover(listing, site).await {
            Ok(found) => found,
            Err(e) => {
                self.set_state(PipelineState::Done);
                return Err(e.into());
            }
        };
        info!(
            "Discovered {} items on {} ({})",
            items.len(),
            listing,
            profile.site()
        );
        let _ = events
            .send(PipelineEvent::Discovered {
                listing: listing.to_string(),
                items: items.len(),
            })
            .await;

        self.run_items(&profile, items, filter, events).await
    }

    /// Filter and process an already discovered worklist.
    pub async fn run_items(
        &self,
        profile: &SiteProfile,
        items: Vec<WorkItem>,
        filter: &WorkFilter,
        events: &mpsc::Sender<PipelineEvent>,
    ) -> Result<PipelineSummary, PipelineError> {
        self.set_state(PipelineState::Filtering);
        let discovered = items.len();
        let items = filter.apply(items);
        let _ = events
            .send(PipelineEvent::Filtered {
                kept: items.len(),
                removed: discovered - items.len(),
            })
            .await;

        if items.is_empty() {
            self.set_state(PipelineState::Done);
            return Err(PipelineError::EmptyWorklist { discovered });
        }

        let total = items.len();
        let chunks: Vec<&[WorkItem]> = items.chunks(self.batch_size).collect();
        self.snapshot.send_modify(|s| {
            s.state = PipelineState::Running;
            s.total = total;
            s.chunks = chunks.len();
            s.chunk = 0;
            s.counts = OutcomeCounts::default();
        });
        info!(
            "Processing {} items in {} chunks of up to {}",
            total,
            chunks.len(),
            self.batch_size
        );

        let mut summary = PipelineSummary {
            discovered,
            total,
            ..Default::default()
        };

        for (index, chunk) in chunks.iter().enumerate() {
            if self.stop.is_stopped() {
                summary.stopped = true;
                break;
            }
            self.pacer.acquire().await;
            if self.stop.is_stopped() {
                summary.stopped = true;
                break;
            }

            self.snapshot.send_modify(|s| s.chunk = index + 1);
            let _ = events
                .send(PipelineEvent::ChunkStarted {
                    index,
                    size: chunk.len(),
                })
                .await;

            let outcomes = join_all(
                chunk
                    .iter()
                    .map(|item| self.process_item(profile, item, events)),
            )
            .await;

            let mut result = ChunkResult::default();
            for outcome in &outcomes {
                result.record(outcome);
                summary.counts.record(outcome);
            }
            summary.chunks_run += 1;
            debug!("Chunk {} settled: {:?}", index + 1, result);
            let _ = events
                .send(PipelineEvent::ChunkCompleted { index, result })
                .await;
        }

        if summary.stopped {
            let remaining = total - summary.counts.processed();
            self.set_state(PipelineState::Stopping);
            info!("Stop requested; {} items not attempted", remaining);
            let _ = events.send(PipelineEvent::Stopped { remaining }).await;
        }

        self.set_state(PipelineState::Done);
        info!(
            "Bulk run finished: {} saved, {} skipped, {} failed",
            summary.counts.success, summary.counts.skipped, summary.counts.failed
        );
        let _ = events.send(PipelineEvent::Finished { summary }).await;
        Ok(summary)
    }

    /// Fetch, parse, sanitize, validate and save one item. Never fails;
    /// every error becomes an outcome.
    async fn process_item(
        &self,
        profile: &SiteProfile,
        item: &WorkItem,
        events: &mpsc::Sender<PipelineEvent>,
    ) -> ItemOutcome {
        let label = item.label().to_string();
        let _ = events
            .send(PipelineEvent::ItemStarted {
                label: label.clone(),
                url: item.url.clone(),
            })
            .await;

        let outcome = match self.scraper.scrape_item(item, profile).await {
            Err(e) => {
                warn!("Failed to scrape {}: {}", item.url, e);
                ItemOutcome::Failed {
                    error: e.to_string(),
                }
            }
            Ok(record) => {
                let (record, validation) = prepare(record);
                if !validation.valid {
                    debug!("Skipping {}: {}", label, validation.summary());
                    ItemOutcome::Skipped {
                        reasons: validation.reasons,
                    }
                } else {
                    match self.store.save_product(&record).await {
                        Ok(saved) => ItemOutcome::Success { tier: saved.tier },
                        Err(e) => {
                            warn!("Failed to save {}: {}", label, e);
                            ItemOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    }
                }
            }
        };

        self.snapshot.send_modify(|s| s.counts.record(&outcome));
        let event = match &outcome {
            ItemOutcome::Success { tier } => PipelineEvent::ItemCompleted { label, tier: *tier },
            ItemOutcome::Skipped { reasons } => PipelineEvent::ItemSkipped {
                label,
                reasons: reasons.clone(),
            },
            ItemOutcome::Failed { error } => PipelineEvent::ItemFailed {
                label,
                error: error.clone(),
            },
        };
        let _ = events.send(event).await;
        outcome
    }
}
