//! Turn parsed pages into records by walking a compiled catalog.
//!
//! Nothing here fails on missing fields: a selector that matches nothing
//! leaves the field empty and the validator decides what that means.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::price::parse_price;
use super::sites::{CompiledOrderCatalog, Ebay, SiteProfile};
use crate::models::{OrderItem, OrderRecord, ProductRecord, MAX_IMAGES};
use crate::utils::resolve_url;

static CANONICAL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("link[rel='canonical'], meta[property='og:url']").unwrap()
});

/// Errors raised before extraction can start.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("document is empty")]
    Empty,
}

/// Parse raw markup. Fails only when there is no markup at all; html5ever
/// recovers from everything else.
pub fn parse_document(html: &str) -> Result<Html, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(Html::parse_document(html))
}

/// The page's own idea of its URL (`<link rel=canonical>` or `og:url`).
/// Used to place saved pages back on their site.
pub fn canonical_url(document: &Html) -> Option<String> {
    document.select(&CANONICAL).find_map(|el| {
        let v = el.value();
        v.attr("href")
            .or_else(|| v.attr("content"))
            .map(str::trim)
            .filter(|s| s.starts_with("http"))
            .map(str::to_string)
    })
}

/// Build a product record from a page.
///
/// `known_id` (usually read off a listing card) wins over anything on the
/// page; after that the catalog's id rules, then the site's URL pattern.
pub fn extract(
    document: &Html,
    known_id: Option<&str>,
    source_url: &str,
    profile: &SiteProfile,
) -> ProductRecord {
    let root = document.root_element();
    let catalog = &profile.catalog;
    let adapter = &profile.adapter;

    let mut record = ProductRecord::new(source_url, profile.site());

    record.id = known_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| catalog.id.first(root))
        .or_else(|| adapter.id_from_url(source_url));

    record.title = catalog.title.first(root);

    record.price = catalog
        .price
        .first(root)
        .and_then(|text| parse_price(&text))
        .or_else(|| adapter.price_fallback(root));

    let mut seen = HashSet::new();
    record.images = catalog
        .images
        .all_values(root)
        .into_iter()
        .filter(|src| !src.starts_with("data:"))
        .filter_map(|src| resolve_url(source_url, &src))
        .map(|url| adapter.upscale_image(&url))
        // Thumbnails of one picture upscale to the same URL.
        .filter(|url| seen.insert(url.clone()))
        .take(MAX_IMAGES)
        .collect();

    record.description = catalog.description.first(root);
    record.bullet_points = catalog.bullets.first_list(root);

    for row in catalog.spec_rows.first_elements(root) {
        if let (Some(key), Some(value)) = (catalog.spec_key.first(row), catalog.spec_value.first(row))
        {
            record.specifications.entry(key).or_insert(value);
        }
    }

    record
}

/// Build an order record from a seller order details page.
pub fn extract_order(document: &Html, source_url: &str, catalog: &CompiledOrderCatalog) -> OrderRecord {
    let root = document.root_element();
    let mut order = OrderRecord::new(source_url);

    order.order_id = catalog
        .order_id
        .first(root)
        .map(|id| id.trim_start_matches('#').trim().to_string())
        .or_else(|| Ebay::order_id_from_url(source_url));
    order.order_date = catalog.order_date.first(root);
    order.status = catalog.status.first(root);

    order.buyer.username = catalog.buyer_username.first(root);
    order.buyer.name = catalog.buyer_name.first(root);

    order.shipping.name = catalog.shipping_name.first(root);
    let lines = catalog.shipping_address.first_list(root);
    if !lines.is_empty() {
        order.shipping.address = Some(lines.join(", "));
    }

    let money = |rules: &super::catalog::RuleSet| rules.first(root).and_then(|t| parse_price(&t));
    order.financials.total_sale = money(&catalog.total_sale);
    order.financials.ebay_fees = money(&catalog.ebay_fees);
    order.financials.earnings = money(&catalog.earnings);
    order.financials.shipping_cost = money(&catalog.shipping_cost);

    order.items = catalog
        .item_rows
        .first_elements(root)
        .into_iter()
        .map(|row| OrderItem {
            title: catalog.item_title.first(row),
            item_id: catalog.item_id.first(row),
        })
        .filter(|item| item.title.is_some() || item.item_id.is_some())
        .collect();

    order.tracking.number = catalog.tracking_number.first(root);
    order.tracking.carrier = catalog.carrier.first(root);

    order
}
