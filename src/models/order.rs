//! eBay seller order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Buyer details shown on the order page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Ship-to block. `address` is the flattened, single-line address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Money breakdown for an order. Each amount is absent when not shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFinancials {
    #[serde(default)]
    pub total_sale: Option<f64>,
    #[serde(default)]
    pub ebay_fees: Option<f64>,
    #[serde(default)]
    pub earnings: Option<f64>,
    #[serde(default)]
    pub shipping_cost: Option<f64>,
}

/// Lightweight reference to a sold item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
}

/// A single seller order captured from an order details page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub buyer: BuyerInfo,
    #[serde(default)]
    pub shipping: ShippingAddress,
    #[serde(default)]
    pub financials: OrderFinancials,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub tracking: TrackingInfo,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            order_id: None,
            order_date: None,
            status: None,
            buyer: BuyerInfo::default(),
            shipping: ShippingAddress::default(),
            financials: OrderFinancials::default(),
            items: Vec::new(),
            tracking: TrackingInfo::default(),
            url: url.into(),
            scraped_at: Utc::now(),
        }
    }

    /// Storage identity.
    pub fn key(&self) -> Option<&str> {
        self.order_id.as_deref()
    }

    /// First item, the only one represented in CSV exports.
    pub fn first_item(&self) -> Option<&OrderItem> {
        self.items.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_defaults_when_fields_missing() {
        let json = r#"{"url": "https://www.ebay.com/mesh/ord/details?orderid=1", "scrapedAt": "2024-05-01T10:00:00Z"}"#;
        let order: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(order.key(), None);
        assert!(order.items.is_empty());
        assert_eq!(order.financials, OrderFinancials::default());
    }

    #[test]
    fn test_first_item() {
        let mut order = OrderRecord::new("https://www.ebay.com/o");
        assert!(order.first_item().is_none());
        order.items.push(OrderItem {
            title: Some("Lamp".to_string()),
            item_id: Some("1234".to_string()),
        });
        order.items.push(OrderItem::default());
        assert_eq!(order.first_item().unwrap().item_id.as_deref(), Some("1234"));
    }
}
