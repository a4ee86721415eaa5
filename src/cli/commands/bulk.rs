//! Bulk scrape command.

use console::style;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::Settings;
use crate::models::Site;
use crate::pipeline::{BulkPipeline, PipelineError, PriceRange, WorkFilter};

use crate::cli::helpers::{build_scraper, open_store};
use crate::cli::progress::BulkProgress;

/// Flags that override the configured bulk settings for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkOptions {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: Option<usize>,
    pub batch_size: Option<usize>,
    pub delay_ms: Option<u64>,
}

/// Discover products on a listing page and scrape them in paced chunks.
/// Ctrl-C stops the run after the chunk in flight.
pub async fn cmd_bulk(
    mut settings: Settings,
    listing: &str,
    site: Option<Site>,
    options: BulkOptions,
) -> anyhow::Result<()> {
    if let Some(batch_size) = options.batch_size {
        settings.bulk.batch_size = batch_size;
    }
    if let Some(delay_ms) = options.delay_ms {
        settings.bulk.chunk_delay_ms = delay_ms;
    }
    settings.validate()?;

    let filter = WorkFilter {
        price: PriceRange::new(options.min_price, options.max_price),
        limit: options.limit,
    };

    let scraper = build_scraper(&settings)?;
    let store = open_store(&settings)?;
    let pipeline = BulkPipeline::new(scraper, store, settings.pacer())
        .with_batch_size(settings.bulk.batch_size);

    let stop = pipeline.stop_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current chunk");
            eprintln!(
                "{} Stopping after the current chunk...",
                style("!").yellow()
            );
            stop.stop();
        }
    });

    let (tx, rx) = mpsc::channel(64);
    let progress = BulkProgress::start(pipeline.subscribe(), rx)?;

    let result = pipeline.run(listing, site, &filter, &tx).await;
    drop(tx);
    progress.finish().await;
    ctrl_c.abort();

    match result {
        Ok(summary) => {
            println!(
                "{} {} {} saved, {} skipped, {} failed ({} of {} discovered, {} chunks)",
                if summary.stopped {
                    style("!").yellow()
                } else {
                    style("✓").green()
                },
                if summary.stopped { "Stopped:" } else { "Done:" },
                summary.counts.success,
                summary.counts.skipped,
                summary.counts.failed,
                summary.total,
                summary.discovered,
                summary.chunks_run
            );
            Ok(())
        }
        Err(e @ PipelineError::EmptyWorklist { .. }) => {
            println!("{} {}", style("!").yellow(), e);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
