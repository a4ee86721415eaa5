//! Text normalization helpers.

/// Collapse runs of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Zero-width characters that retailer markup sprinkles into titles.
fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{200E}' | '\u{200F}' | '\u{2060}' | '\u{FEFF}'
    )
}

/// Decode the handful of entities that survive into text nodes, drop control
/// and zero-width characters, then normalize whitespace.
pub fn clean_text(s: &str) -> String {
    let decoded = s
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let filtered: String = decoded
        .chars()
        .filter(|&ch| !is_invisible(ch))
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    normalize_ws(&filtered)
}

/// Truncate to at most `max` characters, never splitting a char.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}
