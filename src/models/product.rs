//! Product records captured from retailer product pages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of image URLs kept per product.
pub const MAX_IMAGES: usize = 10;

/// Retailer a record was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Amazon,
    Costco,
    Yami,
    Ebay,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amazon => "amazon",
            Self::Costco => "costco",
            Self::Yami => "yami",
            Self::Ebay => "ebay",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "amazon" => Some(Self::Amazon),
            "costco" => Some(Self::Costco),
            "yami" => Some(Self::Yami),
            "ebay" => Some(Self::Ebay),
            _ => None,
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product captured from a single product detail page.
///
/// Every field except `url`, `source` and `scraped_at` may be missing on a
/// page; absence is represented as `None` or an empty collection, never as a
/// zero or placeholder value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Site-scoped identifier (ASIN, Costco item number, Yami item id).
    #[serde(default)]
    pub id: Option<String>,
    /// Canonical product URL.
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Current price. `None` means unavailable, not free.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bullet_points: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    pub source: Site,
    pub scraped_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Create an empty record for a page; fields are filled in by the parser.
    pub fn new(url: impl Into<String>, source: Site) -> Self {
        Self {
            id: None,
            url: url.into(),
            title: None,
            price: None,
            images: Vec::new(),
            description: None,
            bullet_points: Vec::new(),
            specifications: BTreeMap::new(),
            source,
            scraped_at: Utc::now(),
        }
    }

    /// Storage identity: two records with the same key are the same product.
    pub fn key(&self) -> Option<(&str, Site)> {
        self.id.as_deref().map(|id| (id, self.source))
    }

    /// Short label for logs and progress output.
    pub fn label(&self) -> String {
        match (&self.title, &self.id) {
            (Some(title), _) => truncate_label(title),
            (None, Some(id)) => id.clone(),
            (None, None) => self.url.clone(),
        }
    }
}

fn truncate_label(s: &str) -> String {
    const MAX: usize = 60;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let cut: String = s.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}
