//! Transient unit of work for bulk scraping.

/// A product link found on a listing page.
///
/// Carries only the values read from the listing card at discovery time;
/// nothing here is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    /// Identifier read from the card or the link, if any.
    pub id: Option<String>,
    /// Absolute URL of the product page.
    pub url: String,
    /// Price shown on the listing card, used for pre-fetch filtering.
    pub listed_price: Option<f64>,
    /// Title shown on the listing card.
    pub listed_title: Option<String>,
}

impl WorkItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            listed_price: None,
            listed_title: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_listed_price(mut self, price: f64) -> Self {
        self.listed_price = Some(price);
        self
    }

    /// Label for progress output: id, then listed title, then URL.
    pub fn label(&self) -> &str {
        self.id
            .as_deref()
            .or(self.listed_title.as_deref())
            .unwrap_or(&self.url)
    }
}
