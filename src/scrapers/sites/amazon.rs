//! Amazon product and search pages.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{PageKind, SiteAdapter};
use crate::models::Site;
use crate::scrapers::catalog::{FieldRule, ListingCatalog, SelectorCatalog};
use crate::scrapers::price::join_price_parts;

static ASIN_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:dp|gp/product|gp/aw/d|product-reviews)/([A-Z0-9]{10})(?:[/?]|$)").unwrap()
});

/// Size/crop modifiers in media URLs, e.g. `._AC_US40_.` or `._SX38_SY50_CR,0,0,38,50_.`
static IMAGE_MODIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\._[A-Za-z0-9_,]+_\.").unwrap());

static PRICE_WHOLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".a-price .a-price-whole, .a-price-whole").unwrap());
static PRICE_FRACTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".a-price .a-price-fraction, .a-price-fraction").unwrap());

pub struct Amazon;

impl SiteAdapter for Amazon {
    fn site(&self) -> Site {
        Site::Amazon
    }

    fn owns_domain(&self, domain: &str) -> bool {
        domain.starts_with("amazon.") || domain.starts_with("smile.amazon.")
    }

    fn catalog(&self) -> SelectorCatalog {
        SelectorCatalog {
            id: vec![
                FieldRule::attr("input#ASIN", "value"),
                FieldRule::attr("input[name='ASIN']", "value"),
                FieldRule::attr("#dp[data-asin], div[data-asin]", "data-asin"),
            ],
            title: vec![
                FieldRule::text("#productTitle"),
                FieldRule::text("#title"),
                FieldRule::attr("meta[name='title']", "content"),
            ],
            price: vec![
                FieldRule::text("#corePrice_feature_div .a-price .a-offscreen"),
                FieldRule::text("#corePriceDisplay_desktop_feature_div .a-price .a-offscreen"),
                FieldRule::text("#priceblock_ourprice"),
                FieldRule::text("#priceblock_dealprice"),
                FieldRule::text("#price_inside_buybox"),
                FieldRule::text(".a-price .a-offscreen"),
            ],
            images: vec![
                FieldRule::attr("#landingImage", "data-old-hires"),
                FieldRule::attr("#landingImage", "src"),
                FieldRule::attr("#imgTagWrapperId img", "src"),
                FieldRule::attr("#altImages img", "src"),
            ],
            description: vec![
                FieldRule::text("#productDescription"),
                FieldRule::text("#bookDescription_feature_div"),
            ],
            bullets: vec![
                FieldRule::text("#feature-bullets li span.a-list-item"),
                FieldRule::text("#feature-bullets li"),
            ],
            spec_rows: vec![
                FieldRule::text("#productDetails_techSpec_section_1 tr"),
                FieldRule::text("#productDetails_detailBullets_sections1 tr"),
                FieldRule::text("#technicalSpecifications_section_1 tr"),
            ],
            spec_key: vec![FieldRule::text("th")],
            spec_value: vec![FieldRule::text("td")],
            listing: ListingCatalog {
                card: vec![
                    FieldRule::text("div[data-component-type='s-search-result']"),
                    FieldRule::text("div.s-result-item[data-asin]"),
                ],
                id_attr: Some("data-asin".to_string()),
                link: vec![
                    FieldRule::attr("h2 a", "href"),
                    FieldRule::attr("a.a-link-normal[href*='/dp/']", "href"),
                ],
                id: vec![],
                price: vec![FieldRule::text(".a-price .a-offscreen")],
                title: vec![FieldRule::text("h2 span"), FieldRule::text("h2")],
            },
        }
    }

    fn id_from_url(&self, url: &str) -> Option<String> {
        ASIN_IN_URL
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn classify(&self, url: &str) -> PageKind {
        if self.id_from_url(url).is_some() {
            return PageKind::Product;
        }
        let path = ::url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        if path == "/s"
            || path.starts_with("/s/")
            || path == "/b"
            || path.starts_with("/b/")
            || path.contains("/gp/browse")
        {
            PageKind::Listing
        } else {
            PageKind::Other
        }
    }

    fn upscale_image(&self, url: &str) -> String {
        IMAGE_MODIFIER.replace(url, "._AC_SL1500_.").into_owned()
    }

    fn price_fallback(&self, root: ElementRef<'_>) -> Option<f64> {
        let whole = root.select(&PRICE_WHOLE).next()?.text().collect::<String>();
        let fraction = root
            .select(&PRICE_FRACTION)
            .next()
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default();
        join_price_parts(&whole, &fraction)
    }
}
