//! Record validation and text sanitizing before persistence.
//!
//! Validation decides whether a record is worth keeping; a failing record is
//! counted as skipped, never as an error. Sanitizing normalizes whatever
//! free text survived extraction.

use std::collections::{BTreeMap, HashSet};

use crate::models::{OrderRecord, ProductRecord};
use crate::utils::{clean_text, truncate_chars};

/// Longest title kept, in characters.
pub const MAX_TITLE_CHARS: usize = 500;
/// Longest description kept, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Outcome of validating one record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validation {
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl Validation {
    fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            valid: reasons.is_empty(),
            reasons,
        }
    }

    /// Reasons joined for a log line.
    pub fn summary(&self) -> String {
        self.reasons.join("; ")
    }
}

/// A product needs an identifier and a positive, finite price.
pub fn validate(record: &ProductRecord) -> Validation {
    let mut reasons = Vec::new();

    if record.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        reasons.push("missing identifier".to_string());
    }

    match record.price {
        None => reasons.push("missing price".to_string()),
        Some(p) if !p.is_finite() => reasons.push("price is not a finite number".to_string()),
        Some(p) if p <= 0.0 => reasons.push(format!("price must be positive (got {})", p)),
        Some(_) => {}
    }

    Validation::from_reasons(reasons)
}

/// An order needs an order identifier.
pub fn validate_order(order: &OrderRecord) -> Validation {
    let mut reasons = Vec::new();
    if order.order_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        reasons.push("missing order identifier".to_string());
    }
    Validation::from_reasons(reasons)
}

fn clean_opt(value: Option<String>, max: Option<usize>) -> Option<String> {
    value
        .map(|v| clean_text(&v))
        .map(|v| match max {
            Some(max) => truncate_chars(&v, max),
            None => v,
        })
        .filter(|v| !v.is_empty())
}

/// Normalize every text field of a product in place.
pub fn sanitize(mut record: ProductRecord) -> ProductRecord {
    record.id = clean_opt(record.id, None);
    record.title = clean_opt(record.title, Some(MAX_TITLE_CHARS));
    record.description = clean_opt(record.description, Some(MAX_DESCRIPTION_CHARS));

    let mut seen = HashSet::new();
    record.bullet_points = record
        .bullet_points
        .iter()
        .map(|b| clean_text(b))
        .filter(|b| !b.is_empty())
        .filter(|b| seen.insert(b.clone()))
        .collect();

    record.specifications = record
        .specifications
        .iter()
        .map(|(k, v)| (clean_text(k), clean_text(v)))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect::<BTreeMap<_, _>>();

    record.images.retain(|i| !i.trim().is_empty());
    record
}

/// Sanitize, then validate what would actually be stored. Text that cleans
/// down to nothing counts as missing.
pub fn prepare(record: ProductRecord) -> (ProductRecord, Validation) {
    let record = sanitize(record);
    let validation = validate(&record);
    (record, validation)
}

/// Order counterpart of [`prepare`].
pub fn prepare_order(order: OrderRecord) -> (OrderRecord, Validation) {
    let order = sanitize_order(order);
    let validation = validate_order(&order);
    (order, validation)
}

/// Normalize every text field of an order in place.
pub fn sanitize_order(mut order: OrderRecord) -> OrderRecord {
    order.order_id = clean_opt(order.order_id, None);
    order.order_date = clean_opt(order.order_date, None);
    order.status = clean_opt(order.status, None);
    order.buyer.username = clean_opt(order.buyer.username, None);
    order.buyer.name = clean_opt(order.buyer.name, None);
    order.shipping.name = clean_opt(order.shipping.name, None);
    order.shipping.address = clean_opt(order.shipping.address, None);
    order.tracking.number = clean_opt(order.tracking.number, None);
    order.tracking.carrier = clean_opt(order.tracking.carrier, None);
    for item in &mut order.items {
        item.title = clean_opt(item.title.take(), Some(MAX_TITLE_CHARS));
        item.item_id = clean_opt(item.item_id.take(), None);
    }
    order
}
