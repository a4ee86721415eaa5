//! CSV rendering for orders.

use csv::{QuoteStyle, WriterBuilder};

use crate::models::OrderRecord;

pub const ORDER_COLUMNS: [&str; 17] = [
    "Order ID",
    "Order Date",
    "Status",
    "Buyer Username",
    "Shipping Name",
    "Shipping Address",
    "Total Sale",
    "Your Earnings",
    "eBay Fees",
    "Shipping Cost",
    "Item Count",
    "Item Title",
    "Item ID",
    "Tracking Number",
    "Carrier",
    "URL",
    "Scraped At",
];

fn text(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

fn money(v: Option<f64>) -> String {
    v.map(|m| format!("{:.2}", m)).unwrap_or_default()
}

fn order_row(order: &OrderRecord) -> [String; 17] {
    let item = order.first_item();
    [
        text(&order.order_id),
        text(&order.order_date),
        text(&order.status),
        text(&order.buyer.username),
        text(&order.shipping.name),
        text(&order.shipping.address),
        money(order.financials.total_sale),
        money(order.financials.earnings),
        money(order.financials.ebay_fees),
        money(order.financials.shipping_cost),
        order.items.len().to_string(),
        item.map(|i| text(&i.title)).unwrap_or_default(),
        item.map(|i| text(&i.item_id)).unwrap_or_default(),
        text(&order.tracking.number),
        text(&order.tracking.carrier),
        order.url.clone(),
        order.scraped_at.to_rfc3339(),
    ]
}

/// One row per order, first item only; every field quoted.
pub fn render_orders(orders: &[OrderRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(ORDER_COLUMNS)?;
    for order in orders {
        writer.write_record(order_row(order))?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
