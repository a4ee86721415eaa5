//! Fetched page wrapper.

use std::collections::HashMap;

/// A page body together with where it came from.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects, or the `file://` URL of a saved page.
    pub url: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl FetchedPage {
    /// Page read from local disk; no transport metadata.
    pub fn local(url: impl Into<String>, body: String) -> Self {
        Self {
            url: url.into(),
            status: 200,
            headers: HashMap::new(),
            body,
        }
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Whether the body looks like markup. Pages without a Content-Type
    /// (saved files) are assumed to be HTML.
    pub fn is_html(&self) -> bool {
        match self.content_type() {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("html") || ct.contains("xml")
            }
            None => true,
        }
    }
}
