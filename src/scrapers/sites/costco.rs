//! Costco product and category pages.

use std::sync::LazyLock;

use regex::Regex;

use super::{PageKind, SiteAdapter};
use crate::models::Site;
use crate::scrapers::catalog::{FieldRule, ListingCatalog, SelectorCatalog};

static ITEM_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\.product\.|/p/-/[^/]+/)(\d+)(?:\.html)?").unwrap());

static RECIPE_SIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"recipeName=\d+").unwrap());

pub struct Costco;

impl SiteAdapter for Costco {
    fn site(&self) -> Site {
        Site::Costco
    }

    fn owns_domain(&self, domain: &str) -> bool {
        domain == "costco.com" || domain == "costco.ca" || domain.ends_with(".costco.com")
    }

    fn catalog(&self) -> SelectorCatalog {
        SelectorCatalog {
            id: vec![
                FieldRule::attr("[data-sku]", "data-sku"),
                FieldRule::text("[itemprop='sku']"),
                FieldRule::attr("input[name='productId']", "value"),
            ],
            title: vec![
                FieldRule::text("h1[itemprop='name']"),
                FieldRule::text("h1[automation-id='productName']"),
                FieldRule::text("h1.product-title"),
                FieldRule::text("h1"),
            ],
            price: vec![
                FieldRule::text("[automation-id='productPriceOutput']"),
                FieldRule::text("#pull-right-price span.value"),
                FieldRule::text(".your-price .value"),
                FieldRule::attr("meta[property='product:price:amount']", "content"),
            ],
            images: vec![
                FieldRule::attr("#productImageContainer img", "src"),
                FieldRule::attr("img[itemprop='image']", "src"),
                FieldRule::attr(".thumbnail-image img", "src"),
                FieldRule::attr("meta[property='og:image']", "content"),
            ],
            description: vec![
                FieldRule::text("#product-tab1-espotdetails"),
                FieldRule::text(".product-info-description"),
            ],
            bullets: vec![
                FieldRule::text("ul.pdp-features li"),
                FieldRule::text(".product-info-description ul li"),
            ],
            spec_rows: vec![
                FieldRule::text(".product-info-specs .row"),
                FieldRule::text("#product-tab2-espotdetails .row"),
            ],
            spec_key: vec![FieldRule::text(".spec-name")],
            spec_value: vec![FieldRule::text("div:not(.spec-name)")],
            listing: ListingCatalog {
                card: vec![
                    FieldRule::text("div.product-tile-set"),
                    FieldRule::text("[data-testid^='ProductTile']"),
                    FieldRule::text("div.product"),
                ],
                id_attr: Some("data-pdp-id".to_string()),
                link: vec![
                    FieldRule::attr("a[href*='.product.']", "href"),
                    FieldRule::attr("a[href*='/p/-/']", "href"),
                    FieldRule::attr("a", "href"),
                ],
                id: vec![],
                price: vec![FieldRule::text(".price"), FieldRule::text("[data-testid$='price']")],
                title: vec![FieldRule::text(".description a"), FieldRule::text(".description")],
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
        if self.id_from_url(url).is_some() {
            PageKind::Product
        } else if url.contains("CatalogSearch") || url.ends_with(".html") || url.contains("/s?") {
            PageKind::Listing
        } else {
            PageKind::Other
        }
    }

    fn upscale_image(&self, url: &str) -> String {
        RECIPE_SIZE.replace(url, "recipeName=1500").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_url() {
        let c = Costco;
        assert_eq!(
            c.id_from_url("https://www.costco.com/kirkland-signature-coffee.product.100391591.html")
                .as_deref(),
            Some("100391591")
        );
        assert_eq!(
            c.id_from_url("https://www.costco.com/p/-/some-tv/4000239874").as_deref(),
            Some("4000239874")
        );
        assert_eq!(c.id_from_url("https://www.costco.com/televisions.html"), None);
    }

    #[test]
    fn test_classify() {
        let c = Costco;
        assert_eq!(c.classify("https://www.costco.com/x.product.1.html"), PageKind::Product);
        assert_eq!(c.classify("https://www.costco.com/televisions.html"), PageKind::Listing);
        assert_eq!(
            c.classify("https://www.costco.com/CatalogSearch?keyword=tv"),
            PageKind::Listing
        );
    }

    #[test]
    fn test_upscale_image() {
        assert_eq!(
            Costco.upscale_image(
                "https://images.costco-static.com/ImageDelivery/imageService?profileId=1&itemId=2&recipeName=350"
            ),
            "https://images.costco-static.com/ImageDelivery/imageService?profileId=1&itemId=2&recipeName=1500"
        );
    }
}
