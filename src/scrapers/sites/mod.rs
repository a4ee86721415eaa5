//! Per-site adapters.
//!
//! One pipeline serves every retailer; what differs per site lives here:
//! which URLs belong to it, how identifiers appear in URLs, the built-in
//! selector catalog, and how thumbnail URLs map to full-size images.

mod amazon;
mod costco;
mod ebay;
mod yami;

use std::collections::HashMap;
use std::sync::Arc;

use scraper::ElementRef;

pub use amazon::Amazon;
pub use costco::Costco;
pub use ebay::{CompiledOrderCatalog, Ebay, OrderCatalog};
pub use yami::Yami;

use super::catalog::{CatalogError, CatalogOverrides, CompiledCatalog, SelectorCatalog};
use crate::models::Site;
use crate::utils::extract_domain;

/// What kind of page a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// A single product's detail page.
    Product,
    /// Search results or a category listing many products.
    Listing,
    /// A seller order details page.
    Order,
    Other,
}

/// Site-specific behavior plugged into the shared parser and pipeline.
pub trait SiteAdapter: Send + Sync {
    fn site(&self) -> Site;

    /// Whether `domain` (without `www.`) belongs to this site.
    fn owns_domain(&self, domain: &str) -> bool;

    /// Built-in selector catalog.
    fn catalog(&self) -> SelectorCatalog;

    /// Identifier embedded in a product URL.
    fn id_from_url(&self, url: &str) -> Option<String>;

    fn classify(&self, url: &str) -> PageKind;

    /// Best-effort rewrite of a thumbnail URL to its full-size variant.
    /// The result is not checked.
    fn upscale_image(&self, url: &str) -> String {
        url.to_string()
    }

    /// Price read some other way when every catalog rule came up empty.
    fn price_fallback(&self, _root: ElementRef<'_>) -> Option<f64> {
        None
    }
}

/// An adapter with its catalog compiled (built-ins plus config overrides).
#[derive(Clone)]
pub struct SiteProfile {
    pub adapter: Arc<dyn SiteAdapter>,
    pub catalog: Arc<CompiledCatalog>,
}

impl SiteProfile {
    pub fn new(
        adapter: Arc<dyn SiteAdapter>,
        overrides: Option<&CatalogOverrides>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = adapter.catalog();
        if let Some(o) = overrides {
            catalog = catalog.with_overrides(o);
        }
        Ok(Self {
            catalog: Arc::new(catalog.compile()?),
            adapter,
        })
    }

    pub fn site(&self) -> Site {
        self.adapter.site()
    }
}

impl std::fmt::Debug for SiteProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteProfile")
            .field("site", &self.site())
            .finish_non_exhaustive()
    }
}

/// Every supported site, resolved by URL or by tag.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl SiteRegistry {
    /// Built-in adapters with no overrides.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::with_overrides(&HashMap::new())
    }

    /// Built-in adapters with per-site catalog overrides from config.
    pub fn with_overrides(overrides: &HashMap<Site, CatalogOverrides>) -> Result<Self, CatalogError> {
        let adapters: Vec<Arc<dyn SiteAdapter>> = vec![
            Arc::new(Amazon),
            Arc::new(Costco),
            Arc::new(Yami),
            Arc::new(Ebay),
        ];
        let profiles = adapters
            .into_iter()
            .map(|a| {
                let o = overrides.get(&a.site());
                SiteProfile::new(a, o)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { profiles })
    }

    pub fn get(&self, site: Site) -> Option<&SiteProfile> {
        self.profiles.iter().find(|p| p.site() == site)
    }

    /// Profile owning the URL's domain.
    pub fn for_url(&self, url: &str) -> Option<&SiteProfile> {
        let domain = extract_domain(url)?;
        self.profiles
            .iter()
            .find(|p| p.adapter.owns_domain(&domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_by_url() {
        let registry = SiteRegistry::builtin().unwrap();
        let cases = [
            ("https://www.amazon.com/dp/B08N5WRWNW", Site::Amazon),
            ("https://www.amazon.co.uk/dp/B08N5WRWNW", Site::Amazon),
            ("https://www.costco.com/tv.product.100391591.html", Site::Costco),
            ("https://www.yami.com/en/p/some-snack/1018062201", Site::Yami),
            ("https://www.ebay.com/mesh/ord/details?orderid=12-34", Site::Ebay),
        ];
        for (url, site) in cases {
            assert_eq!(registry.for_url(url).map(|p| p.site()), Some(site), "{}", url);
        }
        assert!(registry.for_url("https://www.walmart.com/ip/1").is_none());
        assert!(registry.for_url("not a url").is_none());
    }

    #[test]
    fn test_builtin_catalogs_compile() {
        let registry = SiteRegistry::builtin().unwrap();
        for site in [Site::Amazon, Site::Costco, Site::Yami, Site::Ebay] {
            assert!(registry.get(site).is_some());
        }
    }

    #[test]
    fn test_overrides_are_applied() {
        use crate::scrapers::catalog::FieldRule;

        let mut overrides = HashMap::new();
        overrides.insert(
            Site::Yami,
            CatalogOverrides {
                title: Some(vec![FieldRule::text("div.custom-title")]),
                ..Default::default()
            },
        );
        let registry = SiteRegistry::with_overrides(&overrides).unwrap();
        let html = scraper::Html::parse_document(
            r#"<html><body><h1>Built-in</h1><div class="custom-title">Custom</div></body></html>"#,
        );
        let profile = registry.get(Site::Yami).unwrap();
        assert_eq!(
            profile.catalog.title.first(html.root_element()).as_deref(),
            Some("Custom")
        );
    }
}
