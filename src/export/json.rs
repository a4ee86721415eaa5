//! JSON archive format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{OrderRecord, ProductRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductArchive {
    pub exported_at: DateTime<Utc>,
    pub total_products: usize,
    pub products: Vec<ProductRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderArchive {
    pub exported_at: DateTime<Utc>,
    pub total_orders: usize,
    pub orders: Vec<OrderRecord>,
}

/// Either archive, told apart by which array it carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Archive {
    Products(ProductArchive),
    Orders(OrderArchive),
}

pub fn render_products(products: Vec<ProductRecord>) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(&ProductArchive {
        exported_at: Utc::now(),
        total_products: products.len(),
        products,
    })
}

pub fn render_orders(orders: Vec<OrderRecord>) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(&OrderArchive {
        exported_at: Utc::now(),
        total_orders: orders.len(),
        orders,
    })
}

pub fn parse_archive(bytes: &[u8]) -> Result<Archive, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;

    #[test]
    fn test_product_archive_shape() {
        let mut p = ProductRecord::new("https://www.amazon.com/dp/B000000001", Site::Amazon);
        p.id = Some("B000000001".to_string());
        let bytes = render_products(vec![p]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert!(value.get("exportedAt").is_some());
        assert_eq!(value["totalProducts"], 1);
        assert_eq!(value["products"][0]["id"], "B000000001");
        assert_eq!(value["products"][0]["source"], "amazon");
        assert!(value["products"][0].get("bulletPoints").is_some());
    }

    #[test]
    fn test_parse_archive_tells_kinds_apart() {
        let orders = render_orders(vec![OrderRecord::new("https://www.ebay.com/o")]).unwrap();
        assert!(matches!(parse_archive(&orders).unwrap(), Archive::Orders(a) if a.total_orders == 1));

        let products = render_products(Vec::new()).unwrap();
        assert!(matches!(parse_archive(&products).unwrap(), Archive::Products(_)));

        assert!(parse_archive(br#"{"something": "else"}"#).is_err());
    }
}
