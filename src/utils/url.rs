//! URL helpers.

/// Resolve a possibly relative link against the page it was found on.
///
/// Protocol-relative links (`//host/path`) take the page's scheme.
pub fn resolve_url(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = ::url::Url::parse(base_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Host of a URL, without a leading `www.`.
pub fn extract_domain(url: &str) -> Option<String> {
    ::url::Url::parse(url).ok().and_then(|u| {
        u.host_str()
            .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
    })
}
