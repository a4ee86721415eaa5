//! Export to disk, clear, and restore.

use std::collections::HashSet;
use std::sync::Arc;

use cartscrape::export::{ExportError, ExportFormat, Exporter};
use cartscrape::models::{OrderItem, OrderRecord, ProductRecord, Site};
use cartscrape::storage::{FallbackStore, FileStore, MemoryStore, RecordKind, RecordStore};

fn store_in(dir: &std::path::Path) -> Arc<RecordStore> {
    Arc::new(RecordStore::new(FallbackStore::new(
        Arc::new(FileStore::new(dir.join("store.json"))),
        Arc::new(MemoryStore::new()),
    )))
}

fn product(id: &str, site: Site) -> ProductRecord {
    let mut p = ProductRecord::new(format!("https://example.test/{}", id), site);
    p.id = Some(id.to_string());
    p.price = Some(4.5);
    p.title = Some(format!("Product {}", id));
    p
}

#[tokio::test]
async fn test_json_export_then_import_restores_products() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("exports");
    let store = store_in(dir.path());
    for (id, site) in [("A1", Site::Amazon), ("C2", Site::Costco), ("Y3", Site::Yami)] {
        store.save_product(&product(id, site)).await.unwrap();
    }

    let exporter = Exporter::new(store.clone());
    let report = exporter
        .export(RecordKind::Products, ExportFormat::Json, &out)
        .await
        .unwrap();

    assert_eq!(report.count, 3);
    assert!(report.cleared);
    assert!(report.path.starts_with(&out));
    assert!(report
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("scraped-products-") && n.ends_with(".json")));
    assert_eq!(store.count(RecordKind::Products).await.unwrap(), 0);

    let imported = exporter.import(&report.path).await.unwrap();
    assert_eq!(imported.kind, RecordKind::Products);
    assert_eq!(imported.imported, 3);
    assert_eq!(imported.replaced, 0);

    let ids: HashSet<String> = store
        .products()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|p| p.id)
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains("C2"));

    // Importing again replaces instead of duplicating.
    let again = exporter.import(&report.path).await.unwrap();
    assert_eq!(again.replaced, 3);
    assert_eq!(store.count(RecordKind::Products).await.unwrap(), 3);
}

#[tokio::test]
async fn test_order_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());

    let mut order = OrderRecord::new("https://www.ebay.com/mesh/ord/details?orderid=12-34");
    order.order_id = Some("12-34".to_string());
    order.financials.total_sale = Some(25.0);
    order.items.push(OrderItem {
        title: Some("Vintage \"Lamp\"".to_string()),
        item_id: Some("1234567890".to_string()),
    });
    store.save_order(&order).await.unwrap();

    let report = Exporter::new(store.clone())
        .export(RecordKind::Orders, ExportFormat::Csv, dir.path())
        .await
        .unwrap();

    let text = std::fs::read_to_string(&report.path).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("\"Order ID\",\"Order Date\""));
    let row = lines.next().unwrap();
    assert!(row.starts_with("\"12-34\""));
    assert!(row.contains("\"25.00\""));
    assert!(row.contains("\"Vintage \"\"Lamp\"\"\""));
    assert!(lines.next().is_none());
    assert_eq!(store.count(RecordKind::Orders).await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_or_unsupported_export_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("exports");
    let store = store_in(dir.path());
    let exporter = Exporter::new(store.clone());

    let err = exporter
        .export(RecordKind::Orders, ExportFormat::Json, &out)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Empty(RecordKind::Orders)));

    store.save_product(&product("A1", Site::Amazon)).await.unwrap();
    let err = exporter
        .export(RecordKind::Products, ExportFormat::Csv, &out)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Unsupported { .. }));

    assert!(!out.exists());
    assert_eq!(store.count(RecordKind::Products).await.unwrap(), 1);
}
