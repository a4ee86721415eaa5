//! Enumerate product links on listing pages.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use super::price::parse_price;
use super::sites::{PageKind, SiteProfile};
use crate::models::WorkItem;
use crate::utils::resolve_url;

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Collect work items from a listing page.
///
/// Each product card yields one item carrying what the card shows (id,
/// price, title); cards without a resolvable link are dropped. Items are
/// deduplicated by URL, first occurrence wins. When no card rule matches at
/// all, every anchor the site classifies as a product page is used instead,
/// with no card metadata.
pub fn discover(document: &Html, base_url: &str, profile: &SiteProfile) -> Vec<WorkItem> {
    let root = document.root_element();
    let catalog = &profile.catalog;
    let adapter = &profile.adapter;
    let mut seen = HashSet::new();

    let cards = catalog.listing_card.first_elements(root);
    if cards.is_empty() {
        debug!("No listing cards matched on {}, scanning anchors", base_url);
        return document
            .select(&ANCHORS)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_url(base_url, href))
            .filter(|url| adapter.classify(url) == PageKind::Product)
            .filter(|url| seen.insert(url.clone()))
            .map(|url| {
                let id = adapter.id_from_url(&url);
                WorkItem {
                    id,
                    url,
                    listed_price: None,
                    listed_title: None,
                }
            })
            .collect();
    }

    let mut items = Vec::new();
    for card in cards {
        let Some(url) = catalog
            .listing_link
            .first(card)
            .and_then(|href| resolve_url(base_url, &href))
        else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let id = catalog
            .listing_id_attr
            .as_deref()
            .and_then(|attr| card.value().attr(attr))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| catalog.listing_id.first(card))
            .or_else(|| adapter.id_from_url(&url));

        items.push(WorkItem {
            id,
            listed_price: catalog
                .listing_price
                .first(card)
                .and_then(|t| parse_price(&t)),
            listed_title: catalog.listing_title.first(card),
            url,
        });
    }

    debug!("Discovered {} items on {}", items.len(), base_url);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;
    use crate::scrapers::sites::SiteRegistry;

    fn profile(site: Site) -> SiteProfile {
        SiteRegistry::builtin().unwrap().get(site).unwrap().clone()
    }

    #[test]
    fn test_discover_amazon_search_cards() {
        let html = Html::parse_document(
            r#"<html><body>
              <div data-component-type="s-search-result" data-asin="B000000001">
                <h2><a href="/Kettle/dp/B000000001/ref=sr_1_1"><span>Kettle</span></a></h2>
                <span class="a-price"><span class="a-offscreen">$24.99</span></span>
              </div>
              <div data-component-type="s-search-result" data-asin="B000000002">
                <h2><a href="/Toaster/dp/B000000002"><span>Toaster</span></a></h2>
              </div>
              <div data-component-type="s-search-result" data-asin="">
                <h2><span>Sponsored, no link</span></h2>
              </div>
              <div data-component-type="s-search-result" data-asin="B000000001">
                <h2><a href="/Kettle/dp/B000000001/ref=sr_1_1"><span>Kettle again</span></a></h2>
              </div>
            </body></html>"#,
        );
        let items = discover(&html, "https://www.amazon.com/s?k=kitchen", &profile(Site::Amazon));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.as_deref(), Some("B000000001"));
        assert_eq!(
            items[0].url,
            "https://www.amazon.com/Kettle/dp/B000000001/ref=sr_1_1"
        );
        assert_eq!(items[0].listed_price, Some(24.99));
        assert_eq!(items[0].listed_title.as_deref(), Some("Kettle"));
        assert_eq!(items[1].id.as_deref(), Some("B000000002"));
        assert_eq!(items[1].listed_price, None);
    }

    #[test]
    fn test_discover_falls_back_to_product_anchors() {
        let html = Html::parse_document(
            r#"<html><body>
              <a href="/en/p/shrimp-chips/1018062201">Chips</a>
              <a href="/en/p/shrimp-chips/1018062201">Chips (dup)</a>
              <a href="/en/c/snacks/12">Snacks</a>
              <a href="javascript:void(0)">Nope</a>
            </body></html>"#,
        );
        let items = discover(&html, "https://www.yami.com/en/c/snacks/12", &profile(Site::Yami));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("1018062201"));
        assert_eq!(items[0].url, "https://www.yami.com/en/p/shrimp-chips/1018062201");
    }

    #[test]
    fn test_discover_empty_page() {
        let html = Html::parse_document("<html><body></body></html>");
        assert!(discover(&html, "https://www.costco.com/tv.html", &profile(Site::Costco)).is_empty());
    }
}
