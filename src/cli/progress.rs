//! Progress display for bulk runs.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::pipeline::{PipelineEvent, PipelineSnapshot, PipelineState};

/// Progress bar fed by pipeline snapshots, with one line per item event.
pub struct BulkProgress {
    bar: ProgressBar,
    snapshots: JoinHandle<()>,
    events: JoinHandle<()>,
}

impl BulkProgress {
    pub fn start(
        mut snapshots: watch::Receiver<PipelineSnapshot>,
        mut events: mpsc::Receiver<PipelineEvent>,
    ) -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );

        let pb = bar.clone();
        let snapshots = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snap = snapshots.borrow_and_update().clone();
                render(&pb, &snap);
                if snap.state == PipelineState::Done {
                    break;
                }
            }
        });

        let pb = bar.clone();
        let events = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(line) = event_line(&event) {
                    pb.println(line);
                }
            }
        });

        Ok(Self {
            bar,
            snapshots,
            events,
        })
    }

    /// Wait for the event stream to drain, then clear the bar. The event
    /// sender must be dropped first.
    pub async fn finish(self) {
        let _ = self.events.await;
        self.snapshots.abort();
        self.bar.finish_and_clear();
    }
}

fn render(bar: &ProgressBar, snap: &PipelineSnapshot) {
    bar.set_length(snap.total as u64);
    bar.set_position(snap.counts.processed() as u64);
    bar.set_message(format!(
        "{} chunk {}/{}  {} {}  {} {}  {} {}",
        snap.state,
        snap.chunk,
        snap.chunks,
        style("✓").green(),
        snap.counts.success,
        style("○").yellow(),
        snap.counts.skipped,
        style("✗").red(),
        snap.counts.failed
    ));
}

fn event_line(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::Discovered { listing, items } => Some(format!(
            "{} Found {} items on {}",
            style("→").cyan(),
            items,
            listing
        )),
        PipelineEvent::Filtered { kept, removed } if *removed > 0 => Some(format!(
            "{} Filtered out {} items, {} left",
            style("→").dim(),
            removed,
            kept
        )),
        PipelineEvent::ItemCompleted { label, tier } => Some(format!(
            "  {} {} ({})",
            style("✓").green(),
            label,
            tier
        )),
        PipelineEvent::ItemSkipped { label, reasons } => Some(format!(
            "  {} {}: {}",
            style("○").yellow(),
            label,
            reasons.join("; ")
        )),
        PipelineEvent::ItemFailed { label, error } => Some(format!(
            "  {} {}: {}",
            style("✗").red(),
            label,
            error
        )),
        PipelineEvent::Stopped { remaining } => Some(format!(
            "{} Stopped, {} items not attempted",
            style("!").yellow(),
            remaining
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreTier;

    #[test]
    fn test_event_lines() {
        let line = event_line(&PipelineEvent::ItemCompleted {
            label: "Kettle".to_string(),
            tier: StoreTier::Secondary,
        })
        .unwrap();
        assert!(line.contains("Kettle"));
        assert!(line.contains("secondary"));

        assert!(event_line(&PipelineEvent::Filtered { kept: 3, removed: 0 }).is_none());
        assert!(event_line(&PipelineEvent::ChunkStarted { index: 0, size: 3 }).is_none());
    }
}
