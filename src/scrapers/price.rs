//! Price text parsing.

/// Parse a displayed price into a number.
///
/// Every character outside `[0-9.]` is dropped before parsing, so currency
/// symbols and thousands separators disappear while the decimal point stays.
/// Text with no digits ("Free", "See price in cart") or anything that does
/// not parse yields `None`, never zero.
pub fn parse_price(text: &str) -> Option<f64> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Combine whole and fractional price parts shown in separate elements
/// (e.g. `<span>12.</span><span>99</span>`).
pub fn join_price_parts(whole: &str, fraction: &str) -> Option<f64> {
    let whole: String = whole.chars().filter(|c| c.is_ascii_digit()).collect();
    let fraction: String = fraction.chars().filter(|c| c.is_ascii_digit()).collect();
    if whole.is_empty() {
        return None;
    }
    let fraction = if fraction.is_empty() { "0".to_string() } else { fraction };
    parse_price(&format!("{}.{}", whole, fraction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_currency() {
        assert_eq!(parse_price("$35.99"), Some(35.99));
        assert_eq!(parse_price("US $ 4.50 "), Some(4.5));
    }

    #[test]
    fn test_parse_price_thousands_separator() {
        assert_eq!(parse_price("1,234.50"), Some(1234.50));
        assert_eq!(parse_price("$1,000"), Some(1000.0));
    }

    #[test]
    fn test_parse_price_absent_not_zero() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("Free"), None);
        assert_eq!(parse_price("See price in cart"), None);
        assert_eq!(parse_price("."), None);
        assert_eq!(parse_price("1.2.3"), None);
    }

    #[test]
    fn test_parse_price_zero_is_a_number() {
        // Zero parses; rejecting it is the validator's job.
        assert_eq!(parse_price("$0.00"), Some(0.0));
    }

    #[test]
    fn test_join_price_parts() {
        assert_eq!(join_price_parts("12.", "99"), Some(12.99));
        assert_eq!(join_price_parts("1,299", ""), Some(1299.0));
        assert_eq!(join_price_parts("", "99"), None);
    }
}
