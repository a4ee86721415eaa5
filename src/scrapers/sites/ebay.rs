//! eBay item pages and seller order details pages.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{PageKind, SiteAdapter};
use crate::models::Site;
use crate::scrapers::catalog::{CatalogError, FieldRule, ListingCatalog, RuleSet, SelectorCatalog};

static ITEM_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/itm/(?:[^/?#]+/)?(\d{9,})").unwrap());

static ORDER_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&]orderid=([0-9-]+)").unwrap());

/// `s-l64.jpg`, `s-l300.webp` and friends.
static THUMB_SIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/s-l\d+\.").unwrap());

pub struct Ebay;

impl Ebay {
    /// Order identifier carried in an order details URL.
    pub fn order_id_from_url(url: &str) -> Option<String> {
        ORDER_IN_URL
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl SiteAdapter for Ebay {
    fn site(&self) -> Site {
        Site::Ebay
    }

    fn owns_domain(&self, domain: &str) -> bool {
        domain.starts_with("ebay.") || domain.contains(".ebay.")
    }

    fn catalog(&self) -> SelectorCatalog {
        SelectorCatalog {
            id: vec![FieldRule::attr("[data-listing-id]", "data-listing-id")],
            title: vec![
                FieldRule::text("h1.x-item-title__mainTitle"),
                FieldRule::text("h1#itemTitle"),
                FieldRule::attr("meta[property='og:title']", "content"),
            ],
            price: vec![
                FieldRule::text(".x-price-primary"),
                FieldRule::text("#prcIsum"),
                FieldRule::attr("[itemprop='price']", "content"),
            ],
            images: vec![
                FieldRule::attr(".ux-image-carousel-item img", "data-zoom-src"),
                FieldRule::attr(".ux-image-carousel-item img", "src"),
                FieldRule::attr("#icImg", "src"),
            ],
            description: vec![FieldRule::text("#viTabs_0_is")],
            bullets: vec![],
            spec_rows: vec![FieldRule::text(".ux-layout-section-evo__col")],
            spec_key: vec![FieldRule::text(".ux-labels-values__labels")],
            spec_value: vec![FieldRule::text(".ux-labels-values__values")],
            listing: ListingCatalog {
                card: vec![FieldRule::text("li.s-item"), FieldRule::text("li.s-card")],
                id_attr: Some("data-listingid".to_string()),
                link: vec![FieldRule::attr("a.s-item__link", "href"), FieldRule::attr("a", "href")],
                id: vec![],
                price: vec![FieldRule::text(".s-item__price"), FieldRule::text(".s-card__price")],
                title: vec![FieldRule::text(".s-item__title"), FieldRule::text(".s-card__title")],
            },
        }
    }

    fn id_from_url(&self, url: &str) -> Option<String> {
        ITEM_IN_URL
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn classify(&self, url: &str) -> PageKind {
        if Self::order_id_from_url(url).is_some() || url.contains("/ord/details") {
            PageKind::Order
        } else if self.id_from_url(url).is_some() {
            PageKind::Product
        } else if url.contains("/sch/") || url.contains("/b/") {
            PageKind::Listing
        } else {
            PageKind::Other
        }
    }

    fn upscale_image(&self, url: &str) -> String {
        THUMB_SIZE.replace(url, "/s-l1600.").into_owned()
    }
}

/// Rules for every field of a seller order details page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderCatalog {
    #[serde(default)]
    pub order_id: Vec<FieldRule>,
    #[serde(default)]
    pub order_date: Vec<FieldRule>,
    #[serde(default)]
    pub status: Vec<FieldRule>,
    #[serde(default)]
    pub buyer_username: Vec<FieldRule>,
    #[serde(default)]
    pub buyer_name: Vec<FieldRule>,
    #[serde(default)]
    pub shipping_name: Vec<FieldRule>,
    /// Address lines; all values are joined into one line.
    #[serde(default)]
    pub shipping_address: Vec<FieldRule>,
    #[serde(default)]
    pub total_sale: Vec<FieldRule>,
    #[serde(default)]
    pub ebay_fees: Vec<FieldRule>,
    #[serde(default)]
    pub earnings: Vec<FieldRule>,
    #[serde(default)]
    pub shipping_cost: Vec<FieldRule>,
    /// Sold item containers.
    #[serde(default)]
    pub item_rows: Vec<FieldRule>,
    /// Item title, relative to an item row.
    #[serde(default)]
    pub item_title: Vec<FieldRule>,
    /// Item id, relative to an item row.
    #[serde(default)]
    pub item_id: Vec<FieldRule>,
    #[serde(default)]
    pub tracking_number: Vec<FieldRule>,
    #[serde(default)]
    pub carrier: Vec<FieldRule>,
}

impl OrderCatalog {
    /// Rules for the current seller hub order details layout.
    pub fn builtin() -> Self {
        Self {
            order_id: vec![
                FieldRule::text(".order-info .order-number .info-value"),
                FieldRule::text("[data-test-id='order-number']"),
                FieldRule::attr("[data-orderid]", "data-orderid"),
            ],
            order_date: vec![
                FieldRule::text(".order-info .date-sold .info-value"),
                FieldRule::text("[data-test-id='order-date']"),
            ],
            status: vec![
                FieldRule::text(".order-status .status-label"),
                FieldRule::text("[data-test-id='order-status']"),
            ],
            buyer_username: vec![
                FieldRule::text(".buyer-info .user-id"),
                FieldRule::text("[data-test-id='buyer-username']"),
            ],
            buyer_name: vec![
                FieldRule::text(".buyer-info .buyer-name"),
                FieldRule::text("[data-test-id='buyer-name']"),
            ],
            shipping_name: vec![
                FieldRule::text(".shipping-address .name"),
                FieldRule::text("[data-test-id='ship-to-name']"),
            ],
            shipping_address: vec![
                FieldRule::text(".shipping-address .address-line"),
                FieldRule::text("[data-test-id='ship-to-address'] span"),
            ],
            total_sale: vec![
                FieldRule::text(".payment-info .order-total .amount"),
                FieldRule::text("[data-test-id='order-total']"),
            ],
            ebay_fees: vec![
                FieldRule::text(".payment-info .fees .amount"),
                FieldRule::text("[data-test-id='ebay-fees']"),
            ],
            earnings: vec![
                FieldRule::text(".payment-info .earnings .amount"),
                FieldRule::text("[data-test-id='order-earnings']"),
            ],
            shipping_cost: vec![
                FieldRule::text(".payment-info .shipping-cost .amount"),
                FieldRule::text("[data-test-id='shipping-label-cost']"),
            ],
            item_rows: vec![
                FieldRule::text(".line-item"),
                FieldRule::text("[data-test-id='line-item']"),
            ],
            item_title: vec![FieldRule::text(".item-title"), FieldRule::text("a")],
            item_id: vec![
                FieldRule::text(".item-id .info-value"),
                FieldRule::attr("[data-itemid]", "data-itemid"),
            ],
            tracking_number: vec![
                FieldRule::text(".tracking-info .tracking-number"),
                FieldRule::text("[data-test-id='tracking-number']"),
            ],
            carrier: vec![
                FieldRule::text(".tracking-info .carrier"),
                FieldRule::text("[data-test-id='shipping-carrier']"),
            ],
        }
    }

    pub fn compile(&self) -> Result<CompiledOrderCatalog, CatalogError> {
        Ok(CompiledOrderCatalog {
            order_id: RuleSet::compile("order_id", &self.order_id)?,
            order_date: RuleSet::compile("order_date", &self.order_date)?,
            status: RuleSet::compile("status", &self.status)?,
            buyer_username: RuleSet::compile("buyer_username", &self.buyer_username)?,
            buyer_name: RuleSet::compile("buyer_name", &self.buyer_name)?,
            shipping_name: RuleSet::compile("shipping_name", &self.shipping_name)?,
            shipping_address: RuleSet::compile("shipping_address", &self.shipping_address)?,
            total_sale: RuleSet::compile("total_sale", &self.total_sale)?,
            ebay_fees: RuleSet::compile("ebay_fees", &self.ebay_fees)?,
            earnings: RuleSet::compile("earnings", &self.earnings)?,
            shipping_cost: RuleSet::compile("shipping_cost", &self.shipping_cost)?,
            item_rows: RuleSet::compile("item_rows", &self.item_rows)?,
            item_title: RuleSet::compile("item_title", &self.item_title)?,
            item_id: RuleSet::compile("item_id", &self.item_id)?,
            tracking_number: RuleSet::compile("tracking_number", &self.tracking_number)?,
            carrier: RuleSet::compile("carrier", &self.carrier)?,
        })
    }
}

/// An order catalog with all selectors parsed.
#[derive(Debug, Clone)]
pub struct CompiledOrderCatalog {
    pub order_id: RuleSet,
    pub order_date: RuleSet,
    pub status: RuleSet,
    pub buyer_username: RuleSet,
    pub buyer_name: RuleSet,
    pub shipping_name: RuleSet,
    pub shipping_address: RuleSet,
    pub total_sale: RuleSet,
    pub ebay_fees: RuleSet,
    pub earnings: RuleSet,
    pub shipping_cost: RuleSet,
    pub item_rows: RuleSet,
    pub item_title: RuleSet,
    pub item_id: RuleSet,
    pub tracking_number: RuleSet,
    pub carrier: RuleSet,
}
