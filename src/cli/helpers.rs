//! Shared helper functions for CLI commands.

use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::models::{OrderRecord, ProductRecord};
use crate::scrapers::{Fetcher, HttpFetcher, Scraper};
use crate::storage::RecordStore;

/// Build a scraper from settings: HTTP plus saved-file fetching, site
/// adapters with configured overrides, and the order page catalog.
pub fn build_scraper(settings: &Settings) -> anyhow::Result<Scraper> {
    let http = HttpFetcher::with_user_agent(
        settings.request_timeout(),
        settings.user_agent.as_deref(),
    )?;
    let registry = settings.registry()?;
    let orders = settings.order_catalog().compile()?;
    Ok(Scraper::new(
        Arc::new(Fetcher::new(http)),
        Arc::new(registry),
        Arc::new(orders),
    ))
}

/// Open the record store, creating the data directory first.
pub fn open_store(settings: &Settings) -> anyhow::Result<Arc<RecordStore>> {
    settings.ensure_directories()?;
    Ok(Arc::new(settings.open_store()))
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${:.2}", p),
        None => "-".to_string(),
    }
}

/// One-line product summary.
pub fn product_line(product: &ProductRecord) -> String {
    format!(
        "{:<12} {:<7} {:>10}  {}",
        product.id.as_deref().unwrap_or("-"),
        product.source,
        format_price(product.price),
        product.title.as_deref().unwrap_or("(untitled)")
    )
}

/// One-line order summary.
pub fn order_line(order: &OrderRecord) -> String {
    format!(
        "{:<16} {:<12} {:>10}  {}",
        order.order_id.as_deref().unwrap_or("-"),
        order.order_date.as_deref().unwrap_or("-"),
        format_price(order.financials.total_sale),
        order
            .first_item()
            .and_then(|i| i.title.as_deref())
            .unwrap_or("(no items)")
    )
}

/// Print validation reasons under a warning glyph.
pub fn print_reasons(what: &str, reasons: &[String]) {
    println!("{} {} not saved:", style("!").yellow(), what);
    for reason in reasons {
        println!("  {} {}", style("→").dim(), reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(3.5)), "$3.50");
        assert_eq!(format_price(None), "-");
    }

    #[test]
    fn test_product_line() {
        let mut p = ProductRecord::new("https://www.yami.com/p/x/1", Site::Yami);
        p.id = Some("1".to_string());
        p.price = Some(9.99);
        p.title = Some("Shrimp Chips".to_string());
        let line = product_line(&p);
        assert!(line.contains("yami"));
        assert!(line.contains("$9.99"));
        assert!(line.ends_with("Shrimp Chips"));
    }
}
