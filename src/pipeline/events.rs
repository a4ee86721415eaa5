//! Pipeline state, events and errors.

use thiserror::Error;

use crate::scrapers::ScrapeError;
use crate::storage::StoreTier;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Nothing left to do after filtering; raised before any fetch.
    #[error("no items to process ({discovered} discovered, none left after filtering)")]
    EmptyWorklist { discovered: usize },
    #[error("failed to read listing page: {0}")]
    Discovery(#[from] ScrapeError),
}

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Discovering,
    Filtering,
    Running,
    /// Stop requested; no further chunks will start.
    Stopping,
    Done,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Filtering => "filtering",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one work item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Validated and saved.
    Success { tier: StoreTier },
    /// Parsed but failed validation.
    Skipped { reasons: Vec<String> },
    /// Fetch, parse or save error.
    Failed { error: String },
}

/// Running totals by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Success { .. } => self.success += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Items accounted for so far.
    pub fn processed(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

/// Immutable view of a run, published after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSnapshot {
    pub state: PipelineState,
    pub counts: OutcomeCounts,
    /// Items left after filtering.
    pub total: usize,
    /// Chunks started so far.
    pub chunk: usize,
    pub chunks: usize,
}

/// Result of one chunk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkResult {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ChunkResult {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Success { .. } => self.succeeded += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Progress events, sent as they happen.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Discovered {
        listing: String,
        items: usize,
    },
    Filtered {
        kept: usize,
        removed: usize,
    },
    ChunkStarted {
        index: usize,
        size: usize,
    },
    ItemStarted {
        label: String,
        url: String,
    },
    ItemCompleted {
        label: String,
        tier: StoreTier,
    },
    ItemSkipped {
        label: String,
        reasons: Vec<String>,
    },
    ItemFailed {
        label: String,
        error: String,
    },
    ChunkCompleted {
        index: usize,
        result: ChunkResult,
    },
    Stopped {
        remaining: usize,
    },
    Finished {
        summary: PipelineSummary,
    },
}

/// Final report of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub counts: OutcomeCounts,
    /// Items discovered on the listing page.
    pub discovered: usize,
    /// Items left after filtering.
    pub total: usize,
    pub chunks_run: usize,
    pub stopped: bool,
}
