//! User agent selection for page requests.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};

/// Identifies cartscrape honestly when no other agent is configured.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "cartscrape/",
    env!("CARGO_PKG_VERSION"),
    " (personal product archiving)"
);

/// Config value that selects a desktop browser agent.
pub const IMPERSONATE: &str = "impersonate";

/// Desktop browser agents used when impersonating.
const BROWSER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// Which agent a fetcher presents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAgent {
    Default,
    /// A browser agent, fixed for the lifetime of the fetcher.
    Browser(&'static str),
    Custom(String),
}

impl UserAgent {
    /// `None` is the default agent, `"impersonate"` picks a browser agent,
    /// anything else is sent as written.
    pub fn from_config(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Default,
            Some(v) if v.eq_ignore_ascii_case(IMPERSONATE) => Self::Browser(pick_browser_agent()),
            Some(custom) => Self::Custom(custom.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => DEFAULT_USER_AGENT,
            Self::Browser(ua) => ua,
            Self::Custom(ua) => ua,
        }
    }

    /// Extra headers sent with every request. Browsers always send a
    /// language preference; retail sites localize without one.
    pub fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if matches!(self, Self::Browser(_)) {
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        }
        headers
    }
}

fn pick_browser_agent() -> &'static str {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as usize)
        .unwrap_or(0);
    BROWSER_AGENTS[nanos % BROWSER_AGENTS.len()]
}
