//! Page scraping: fetch a page, pick its site, extract a record.

pub mod catalog;
pub mod discovery;
pub mod http_client;
pub mod parser;
pub mod price;
pub mod sites;

use std::sync::Arc;

use tracing::debug;

pub use catalog::{CatalogError, CatalogOverrides, FieldRule, SelectorCatalog};
pub use http_client::{FetchError, FetchedPage, FileFetcher, Fetcher, HttpFetcher, PageFetcher};
pub use parser::ParseError;
pub use sites::{CompiledOrderCatalog, OrderCatalog, PageKind, SiteProfile, SiteRegistry};

use crate::models::{OrderRecord, ProductRecord, Site, WorkItem};

/// Errors from scraping a single page.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no supported site for {0}")]
    UnsupportedSite(String),
}

/// Shared scraping entry point for single pages, listings and orders.
///
/// `scraper::Html` is not `Send`, so every document is parsed and dropped
/// inside a synchronous helper once the fetch has completed.
#[derive(Clone)]
pub struct Scraper {
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<SiteRegistry>,
    orders: Arc<CompiledOrderCatalog>,
}

impl Scraper {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        registry: Arc<SiteRegistry>,
        orders: Arc<CompiledOrderCatalog>,
    ) -> Self {
        Self {
            fetcher,
            registry,
            orders,
        }
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Resolve a site profile, preferring an explicit choice.
    pub fn profile(&self, forced: Option<Site>, url: &str) -> Result<SiteProfile, ScrapeError> {
        forced
            .and_then(|s| self.registry.get(s))
            .or_else(|| self.registry.for_url(url))
            .cloned()
            .ok_or_else(|| ScrapeError::UnsupportedSite(url.to_string()))
    }

    /// Fetch and extract one product page. The site comes from `forced`,
    /// else the page URL, else the page's canonical link (saved files).
    pub async fn scrape_product(
        &self,
        target: &str,
        forced: Option<Site>,
    ) -> Result<ProductRecord, ScrapeError> {
        let page = self.fetcher.fetch(target).await?;
        self.product_from_page(&page, None, forced)
    }

    /// Fetch and extract one work item with a known site.
    pub async fn scrape_item(
        &self,
        item: &WorkItem,
        profile: &SiteProfile,
    ) -> Result<ProductRecord, ScrapeError> {
        let page = self.fetcher.fetch(&item.url).await?;
        item_from_page(&page, item, profile)
    }

    /// Fetch a listing page and enumerate its product links.
    pub async fn discover(
        &self,
        target: &str,
        forced: Option<Site>,
    ) -> Result<(SiteProfile, Vec<WorkItem>), ScrapeError> {
        let page = self.fetcher.fetch(target).await?;
        self.listing_from_page(&page, forced)
    }

    /// Fetch and extract one seller order page.
    pub async fn scrape_order(&self, target: &str) -> Result<OrderRecord, ScrapeError> {
        let page = self.fetcher.fetch(target).await?;
        order_from_page(&page, &self.orders)
    }

    fn listing_from_page(
        &self,
        page: &FetchedPage,
        forced: Option<Site>,
    ) -> Result<(SiteProfile, Vec<WorkItem>), ScrapeError> {
        let document = parser::parse_document(&page.body)?;
        let base = page_base(page, &document);
        let profile = self.profile(forced, &base)?;
        let items = discovery::discover(&document, &base, &profile);
        Ok((profile, items))
    }

    /// Extract a product from an already fetched page.
    pub fn product_from_page(
        &self,
        page: &FetchedPage,
        known_id: Option<&str>,
        forced: Option<Site>,
    ) -> Result<ProductRecord, ScrapeError> {
        let document = parser::parse_document(&page.body)?;
        let base = page_base(page, &document);
        let profile = self.profile(forced, &base)?;
        debug!("Extracting {} page {}", profile.site(), base);
        Ok(parser::extract(&document, known_id, &base, &profile))
    }
}

fn item_from_page(
    page: &FetchedPage,
    item: &WorkItem,
    profile: &SiteProfile,
) -> Result<ProductRecord, ScrapeError> {
    let document = parser::parse_document(&page.body)?;
    Ok(parser::extract(&document, item.id.as_deref(), &item.url, profile))
}

fn order_from_page(
    page: &FetchedPage,
    catalog: &CompiledOrderCatalog,
) -> Result<OrderRecord, ScrapeError> {
    let document = parser::parse_document(&page.body)?;
    let base = page_base(page, &document);
    Ok(parser::extract_order(&document, &base, catalog))
}

/// URL to resolve links against: the fetched URL for remote pages, the
/// canonical link for saved ones.
fn page_base(page: &FetchedPage, document: &scraper::Html) -> String {
    if http_client::is_remote(&page.url) {
        return page.url.clone();
    }
    parser::canonical_url(document).unwrap_or_else(|| page.url.clone())
}
