//! Yami product and category pages.

use std::sync::LazyLock;

use regex::Regex;

use super::{PageKind, SiteAdapter};
use crate::models::Site;
use crate::scrapers::catalog::{FieldRule, ListingCatalog, SelectorCatalog};

static ITEM_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:p/[^/?#]+|item)/(\d+)").unwrap());

static THUMB_SIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_\d{2,4}x\d{2,4}").unwrap());

pub struct Yami;

impl SiteAdapter for Yami {
    fn site(&self) -> Site {
        Site::Yami
    }

    fn owns_domain(&self, domain: &str) -> bool {
        domain == "yami.com" || domain.ends_with(".yami.com")
    }

    fn catalog(&self) -> SelectorCatalog {
        SelectorCatalog {
            id: vec![FieldRule::attr("[data-item-number]", "data-item-number")],
            title: vec![
                FieldRule::text("h1.item-title"),
                FieldRule::text(".item-detail h1"),
                FieldRule::text("h1"),
            ],
            price: vec![
                FieldRule::text(".item-price .price-now"),
                FieldRule::text(".item-price .price"),
                FieldRule::text(".price-now"),
                FieldRule::attr("meta[property='product:price:amount']", "content"),
            ],
            images: vec![
                FieldRule::attr(".item-images img", "src"),
                FieldRule::attr(".swiper-slide img", "data-src"),
                FieldRule::attr(".swiper-slide img", "src"),
                FieldRule::attr("meta[property='og:image']", "content"),
            ],
            description: vec![
                FieldRule::text(".item-description"),
                FieldRule::text(".product-desc"),
            ],
            bullets: vec![FieldRule::text(".item-highlights li")],
            spec_rows: vec![
                FieldRule::text(".item-params tr"),
                FieldRule::text(".item-params li"),
            ],
            spec_key: vec![FieldRule::text("th"), FieldRule::text(".label")],
            spec_value: vec![FieldRule::text("td"), FieldRule::text(".value")],
            listing: ListingCatalog {
                card: vec![
                    FieldRule::text(".item-card"),
                    FieldRule::text(".product-item"),
                ],
                id_attr: None,
                link: vec![
                    FieldRule::attr("a[href*='/p/']", "href"),
                    FieldRule::attr("a", "href"),
                ],
                id: vec![],
                price: vec![FieldRule::text(".item-price"), FieldRule::text(".price")],
                title: vec![FieldRule::text(".item-title"), FieldRule::text(".title")],
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
        } else if url.contains("/c/") || url.contains("/search") || url.contains("/brand/") {
            PageKind::Listing
        } else {
            PageKind::Other
        }
    }

    fn upscale_image(&self, url: &str) -> String {
        THUMB_SIZE.replace(url, "_800x800").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_url() {
        assert_eq!(
            Yami.id_from_url("https://www.yami.com/en/p/shrimp-chips-70g/1018062201").as_deref(),
            Some("1018062201")
        );
        assert_eq!(Yami.id_from_url("https://www.yami.com/en/c/snacks/123"), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(Yami.classify("https://www.yami.com/en/p/x/1"), PageKind::Product);
        assert_eq!(Yami.classify("https://www.yami.com/en/c/snacks/123"), PageKind::Listing);
        assert_eq!(Yami.classify("https://www.yami.com/en/account"), PageKind::Other);
    }

    #[test]
    fn test_upscale_image() {
        assert_eq!(
            Yami.upscale_image("https://img.yamibuy.net/item/abc_200x200.webp"),
            "https://img.yamibuy.net/item/abc_800x800.webp"
        );
    }
}
