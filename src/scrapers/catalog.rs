//! Selector catalogs: ordered extraction rules per field.
//!
//! A catalog is plain data. Each field holds a list of rules tried in
//! priority order; a rule pairs a CSS selector with what to read from the
//! matched element (its text or one attribute). The first rule producing a
//! non-empty value wins. Catalogs can be overridden per site from the config
//! file without touching parser or pipeline code.

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::utils::clean_text;

/// Errors raised while compiling a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid selector for {field}: {selector:?} ({message})")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        message: String,
    },
}

/// A single extraction rule as written in configuration.
///
/// In TOML either a bare selector string (reads text) or a table:
/// `{ selector = "img#landingImage", attr = "src" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRule {
    Text(String),
    Attr { selector: String, attr: String },
}

impl FieldRule {
    pub fn text(selector: &str) -> Self {
        Self::Text(selector.to_string())
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self::Attr {
            selector: selector.to_string(),
            attr: attr.to_string(),
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Attr { selector, .. } => selector,
        }
    }
}

/// Rules for finding product links on a listing (search/category) page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingCatalog {
    /// Product card containers. The first rule matching any card wins.
    #[serde(default)]
    pub card: Vec<FieldRule>,
    /// Link to the product page, relative to a card.
    #[serde(default)]
    pub link: Vec<FieldRule>,
    /// Attribute on the card element itself holding the identifier.
    #[serde(default)]
    pub id_attr: Option<String>,
    /// Identifier, relative to a card.
    #[serde(default)]
    pub id: Vec<FieldRule>,
    /// Visible price, relative to a card.
    #[serde(default)]
    pub price: Vec<FieldRule>,
    /// Visible title, relative to a card.
    #[serde(default)]
    pub title: Vec<FieldRule>,
}

/// Rules for every field of a product page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorCatalog {
    #[serde(default)]
    pub id: Vec<FieldRule>,
    #[serde(default)]
    pub title: Vec<FieldRule>,
    #[serde(default)]
    pub price: Vec<FieldRule>,
    #[serde(default)]
    pub images: Vec<FieldRule>,
    #[serde(default)]
    pub description: Vec<FieldRule>,
    #[serde(default)]
    pub bullets: Vec<FieldRule>,
    /// Specification table rows.
    #[serde(default)]
    pub spec_rows: Vec<FieldRule>,
    /// Key cell, relative to a spec row.
    #[serde(default)]
    pub spec_key: Vec<FieldRule>,
    /// Value cell, relative to a spec row.
    #[serde(default)]
    pub spec_value: Vec<FieldRule>,
    #[serde(default)]
    pub listing: ListingCatalog,
}

/// Partial catalog from config; every present field replaces the built-in list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOverrides {
    pub id: Option<Vec<FieldRule>>,
    pub title: Option<Vec<FieldRule>>,
    pub price: Option<Vec<FieldRule>>,
    pub images: Option<Vec<FieldRule>>,
    pub description: Option<Vec<FieldRule>>,
    pub bullets: Option<Vec<FieldRule>>,
    pub spec_rows: Option<Vec<FieldRule>>,
    pub spec_key: Option<Vec<FieldRule>>,
    pub spec_value: Option<Vec<FieldRule>>,
    pub listing_card: Option<Vec<FieldRule>>,
    pub listing_link: Option<Vec<FieldRule>>,
    pub listing_id_attr: Option<String>,
    pub listing_id: Option<Vec<FieldRule>>,
    pub listing_price: Option<Vec<FieldRule>>,
    pub listing_title: Option<Vec<FieldRule>>,
}

impl CatalogOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl SelectorCatalog {
    /// Apply config overrides on top of this catalog.
    pub fn with_overrides(mut self, o: &CatalogOverrides) -> Self {
        fn set(slot: &mut Vec<FieldRule>, value: &Option<Vec<FieldRule>>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        set(&mut self.id, &o.id);
        set(&mut self.title, &o.title);
        set(&mut self.price, &o.price);
        set(&mut self.images, &o.images);
        set(&mut self.description, &o.description);
        set(&mut self.bullets, &o.bullets);
        set(&mut self.spec_rows, &o.spec_rows);
        set(&mut self.spec_key, &o.spec_key);
        set(&mut self.spec_value, &o.spec_value);
        set(&mut self.listing.card, &o.listing_card);
        set(&mut self.listing.link, &o.listing_link);
        if o.listing_id_attr.is_some() {
            self.listing.id_attr = o.listing_id_attr.clone();
        }
        set(&mut self.listing.id, &o.listing_id);
        set(&mut self.listing.price, &o.listing_price);
        set(&mut self.listing.title, &o.listing_title);
        self
    }

    /// Parse every selector once, up front.
    pub fn compile(&self) -> Result<CompiledCatalog, CatalogError> {
        Ok(CompiledCatalog {
            id: RuleSet::compile("id", &self.id)?,
            title: RuleSet::compile("title", &self.title)?,
            price: RuleSet::compile("price", &self.price)?,
            images: RuleSet::compile("images", &self.images)?,
            description: RuleSet::compile("description", &self.description)?,
            bullets: RuleSet::compile("bullets", &self.bullets)?,
            spec_rows: RuleSet::compile("spec_rows", &self.spec_rows)?,
            spec_key: RuleSet::compile("spec_key", &self.spec_key)?,
            spec_value: RuleSet::compile("spec_value", &self.spec_value)?,
            listing_card: RuleSet::compile("listing.card", &self.listing.card)?,
            listing_link: RuleSet::compile("listing.link", &self.listing.link)?,
            listing_id_attr: self.listing.id_attr.clone(),
            listing_id: RuleSet::compile("listing.id", &self.listing.id)?,
            listing_price: RuleSet::compile("listing.price", &self.listing.price)?,
            listing_title: RuleSet::compile("listing.title", &self.listing.title)?,
        })
    }
}

/// What a rule reads from a matched element.
#[derive(Debug, Clone)]
enum Extract {
    Text,
    Attr(String),
}

#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    extract: Extract,
}

impl Rule {
    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        let value = match &self.extract {
            Extract::Text => clean_text(&el.text().collect::<String>()),
            Extract::Attr(name) => el.value().attr(name)?.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// An ordered, compiled list of rules for one field.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub(crate) fn compile(field: &'static str, rules: &[FieldRule]) -> Result<Self, CatalogError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let selector =
                    Selector::parse(rule.selector()).map_err(|e| CatalogError::InvalidSelector {
                        field,
                        selector: rule.selector().to_string(),
                        message: e.to_string(),
                    })?;
                let extract = match rule {
                    FieldRule::Text(_) => Extract::Text,
                    FieldRule::Attr { attr, .. } => Extract::Attr(attr.clone()),
                };
                Ok(Rule { selector, extract })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First non-empty value, trying rules in order and elements in document order.
    pub fn first(&self, scope: ElementRef<'_>) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            scope
                .select(&rule.selector)
                .find_map(|el| rule.read(el))
        })
    }

    /// All non-empty values of the first rule that yields any.
    pub fn first_list(&self, scope: ElementRef<'_>) -> Vec<String> {
        for rule in &self.rules {
            let values: Vec<String> = scope
                .select(&rule.selector)
                .filter_map(|el| rule.read(el))
                .collect();
            if !values.is_empty() {
                return values;
            }
        }
        Vec::new()
    }

    /// Non-empty values of every rule, in rule order.
    pub fn all_values(&self, scope: ElementRef<'_>) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| {
                scope
                    .select(&rule.selector)
                    .filter_map(|el| rule.read(el))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Elements matched by the first rule that matches anything.
    pub fn first_elements<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        for rule in &self.rules {
            let found: Vec<ElementRef<'a>> = scope.select(&rule.selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

/// A catalog with all selectors parsed.
#[derive(Debug, Clone)]
pub struct CompiledCatalog {
    pub id: RuleSet,
    pub title: RuleSet,
    pub price: RuleSet,
    pub images: RuleSet,
    pub description: RuleSet,
    pub bullets: RuleSet,
    pub spec_rows: RuleSet,
    pub spec_key: RuleSet,
    pub spec_value: RuleSet,
    pub listing_card: RuleSet,
    pub listing_link: RuleSet,
    pub listing_id_attr: Option<String>,
    pub listing_id: RuleSet,
    pub listing_price: RuleSet,
    pub listing_title: RuleSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn catalog(title: Vec<FieldRule>) -> CompiledCatalog {
        SelectorCatalog {
            title,
            ..Default::default()
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn test_first_match_wins_in_rule_order() {
        let html = Html::parse_document(
            r#"<html><body><h1 id="a">First</h1><span class="b">Second</span></body></html>"#,
        );
        let c = catalog(vec![FieldRule::text("span.b"), FieldRule::text("h1#a")]);
        assert_eq!(c.title.first(html.root_element()).as_deref(), Some("Second"));
    }

    #[test]
    fn test_empty_match_falls_through() {
        let html = Html::parse_document(
            r#"<html><body><h1 id="a">   </h1><h2>Fallback</h2></body></html>"#,
        );
        let c = catalog(vec![FieldRule::text("h1#a"), FieldRule::text("h2")]);
        assert_eq!(c.title.first(html.root_element()).as_deref(), Some("Fallback"));
    }

    #[test]
    fn test_attribute_rule() {
        let html = Html::parse_document(
            r#"<html><head><meta property="og:title" content=" Tea Pot "></head></html>"#,
        );
        let c = catalog(vec![FieldRule::attr("meta[property='og:title']", "content")]);
        assert_eq!(c.title.first(html.root_element()).as_deref(), Some("Tea Pot"));
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let err = SelectorCatalog {
            price: vec![FieldRule::text("span[[")],
            ..Default::default()
        }
        .compile()
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSelector { field: "price", .. }));
    }

    #[test]
    fn test_overrides_replace_only_present_fields() {
        let base = SelectorCatalog {
            title: vec![FieldRule::text("h1")],
            price: vec![FieldRule::text(".price")],
            ..Default::default()
        };
        let overrides = CatalogOverrides {
            price: Some(vec![FieldRule::text(".new-price")]),
            ..Default::default()
        };
        let merged = base.with_overrides(&overrides);
        assert_eq!(merged.title, vec![FieldRule::text("h1")]);
        assert_eq!(merged.price, vec![FieldRule::text(".new-price")]);
    }

    #[test]
    fn test_field_rule_deserializes_both_forms() {
        #[derive(Deserialize)]
        struct Wrapper {
            rules: Vec<FieldRule>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"rules = ["h1.title", { selector = "img.main", attr = "src" }]"#,
        )
        .unwrap();
        assert_eq!(
            parsed.rules,
            vec![FieldRule::text("h1.title"), FieldRule::attr("img.main", "src")]
        );
    }
}
