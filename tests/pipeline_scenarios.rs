//! End-to-end bulk pipeline runs against stubbed pages and in-memory stores.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use cartscrape::models::{Site, WorkItem};
use cartscrape::pipeline::{
    BulkPipeline, PipelineError, PipelineEvent, PipelineState, PriceRange, StopHandle, WorkFilter,
};
use cartscrape::rate_limit::Unpaced;
use cartscrape::scrapers::{
    FetchError, FetchedPage, OrderCatalog, PageFetcher, Scraper, SiteProfile, SiteRegistry,
};
use cartscrape::storage::{FallbackStore, MemoryStore, RecordStore};

/// Serves product pages by URL. URLs containing "broken" fail, URLs
/// containing "noprice" return a page without a price.
#[derive(Default)]
struct StubShop {
    log: Mutex<Vec<String>>,
    stop_on: Option<(String, StopHandle)>,
}

impl StubShop {
    fn stopping_on(url: &str, stop: StopHandle) -> Self {
        Self {
            stop_on: Some((url.to_string(), stop)),
            ..Default::default()
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubShop {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.log.lock().unwrap().push(format!("start {}", url));
        if let Some((trigger, stop)) = &self.stop_on {
            if trigger == url {
                stop.stop();
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.log.lock().unwrap().push(format!("end {}", url));

        if url.contains("broken") {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        let price = if url.contains("noprice") {
            String::new()
        } else {
            r#"<span class="a-price"><span class="a-offscreen">$19.99</span></span>"#.to_string()
        };
        Ok(FetchedPage::local(
            url,
            format!(
                r#"<html><body><span id="productTitle">Item {}</span>{}</body></html>"#,
                url, price
            ),
        ))
    }
}

fn setup(shop: Arc<StubShop>) -> (BulkPipeline, Arc<RecordStore>, SiteProfile) {
    let registry = SiteRegistry::builtin().unwrap();
    let profile = registry.get(Site::Amazon).unwrap().clone();
    let scraper = Scraper::new(
        shop,
        Arc::new(registry),
        Arc::new(OrderCatalog::builtin().compile().unwrap()),
    );
    let store = Arc::new(RecordStore::new(FallbackStore::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
    )));
    let pipeline = BulkPipeline::new(scraper, store.clone(), Arc::new(Unpaced));
    (pipeline, store, profile)
}

fn item(n: usize, tag: &str, price: Option<f64>) -> WorkItem {
    let id = format!("B{:09}", n);
    let mut item = WorkItem::new(format!("https://www.amazon.com/{}/dp/{}", tag, id)).with_id(id);
    item.listed_price = price;
    item
}

async fn drain(mut rx: mpsc::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_filter_validate_and_persist() {
    let shop = Arc::new(StubShop::default());
    let (pipeline, store, profile) = setup(shop.clone());

    let items = vec![
        item(1, "ok", Some(10.0)),
        item(2, "ok", Some(2.0)),
        item(3, "broken", Some(20.0)),
        item(4, "ok", Some(45.0)),
        item(5, "ok", Some(80.0)),
        item(6, "noprice", Some(5.0)),
        item(7, "ok", Some(50.0)),
    ];
    let filter = WorkFilter {
        price: PriceRange::new(Some(5.0), Some(50.0)),
        limit: None,
    };

    let (tx, rx) = mpsc::channel(256);
    let summary = pipeline
        .run_items(&profile, items, &filter, &tx)
        .await
        .unwrap();
    drop(tx);
    let events = drain(rx).await;

    assert_eq!(summary.discovered, 7);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.counts.success, 3);
    assert_eq!(summary.counts.skipped, 1);
    assert_eq!(summary.counts.failed, 1);
    assert!(!summary.stopped);

    let stored: HashSet<String> = store
        .products()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|p| p.id)
        .collect();
    let expected: HashSet<String> = ["B000000001", "B000000004", "B000000007"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(stored, expected);

    assert!(shop.log().iter().all(|l| !l.contains("B000000002")));
    assert!(matches!(
        events.first(),
        Some(PipelineEvent::Filtered {
            kept: 5,
            removed: 2
        })
    ));
    assert!(matches!(events.last(), Some(PipelineEvent::Finished { .. })));

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.state, PipelineState::Done);
    assert_eq!(snapshot.counts, summary.counts);
}

#[tokio::test(start_paused = true)]
async fn test_chunks_settle_before_the_next_starts() {
    let shop = Arc::new(StubShop::default());
    let (pipeline, _store, profile) = setup(shop.clone());
    let items: Vec<WorkItem> = (1..=7).map(|n| item(n, "ok", None)).collect();
    let urls: Vec<String> = items.iter().map(|i| i.url.clone()).collect();

    let (tx, rx) = mpsc::channel(256);
    let summary = pipeline
        .run_items(&profile, items, &WorkFilter::default(), &tx)
        .await
        .unwrap();
    drop(tx);
    let events = drain(rx).await;

    let chunk_starts = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::ChunkStarted { .. }))
        .count();
    assert_eq!(chunk_starts, 3);
    assert_eq!(summary.chunks_run, 3);
    assert_eq!(summary.counts.success, 7);

    let log = shop.log();
    let position = |entry: String| log.iter().position(|l| *l == entry).unwrap();
    for (k, chunk) in urls.chunks(3).enumerate() {
        let Some(next) = urls.chunks(3).nth(k + 1) else {
            break;
        };
        let last_end = chunk
            .iter()
            .map(|u| position(format!("end {}", u)))
            .max()
            .unwrap();
        let first_start = next
            .iter()
            .map(|u| position(format!("start {}", u)))
            .min()
            .unwrap();
        assert!(
            last_end < first_start,
            "chunk {} started before chunk {} settled",
            k + 2,
            k + 1
        );
    }

    // Items inside one chunk overlap.
    assert!(position(format!("start {}", urls[1])) < position(format!("end {}", urls[0])));
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_second_chunk() {
    let stop = StopHandle::new();
    let items: Vec<WorkItem> = (1..=8).map(|n| item(n, "ok", None)).collect();
    let shop = Arc::new(StubShop::stopping_on(&items[4].url, stop.clone()));
    let (pipeline, store, profile) = setup(shop.clone());
    let pipeline = pipeline.with_batch_size(3).with_stop_handle(stop);

    let (tx, rx) = mpsc::channel(256);
    let summary = pipeline
        .run_items(&profile, items.clone(), &WorkFilter::default(), &tx)
        .await
        .unwrap();
    drop(tx);
    let events = drain(rx).await;

    assert!(summary.stopped);
    assert_eq!(summary.chunks_run, 2);
    assert_eq!(summary.counts.processed(), 6);
    assert_eq!(store.products().await.unwrap().len(), 6);

    let log = shop.log();
    for untouched in &items[6..] {
        assert!(log.iter().all(|l| !l.ends_with(&untouched.url)));
    }
    assert!(events
        .iter()
        .any(|e| matches!(e, PipelineEvent::Stopped { remaining: 2 })));
}

#[tokio::test]
async fn test_empty_worklist_fails_before_fetching() {
    let shop = Arc::new(StubShop::default());
    let (pipeline, _store, profile) = setup(shop.clone());
    let filter = WorkFilter {
        price: PriceRange::new(Some(100.0), None),
        limit: None,
    };

    let (tx, _rx) = mpsc::channel(16);
    let err = pipeline
        .run_items(&profile, vec![item(1, "ok", Some(5.0))], &filter, &tx)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyWorklist { discovered: 1 }));
    assert!(shop.log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_runs_keep_one_record_per_product() {
    let shop = Arc::new(StubShop::default());
    let (pipeline, store, profile) = setup(shop);
    let items: Vec<WorkItem> = (1..=2).map(|n| item(n, "ok", None)).collect();

    for _ in 0..2 {
        let (tx, rx) = mpsc::channel(256);
        pipeline
            .run_items(&profile, items.clone(), &WorkFilter::default(), &tx)
            .await
            .unwrap();
        drop(tx);
        drain(rx).await;
    }
    assert_eq!(store.products().await.unwrap().len(), 2);
}
