//! Price text parsing

use once_cell::sync::Lazy;
use regex::Regex;

/// Currency-prefixed amount anywhere in a block of text
static CURRENCY_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:₹|Rs\.?|INR|\$|€|£|USD|EUR|GBP)\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
        .expect("Invalid currency amount regex")
});

/// Numeric value of a displayed price
///
/// Everything except digits and `.` is discarded, so thousands separators and
/// currency symbols are ignored. Text that still does not parse yields `0.0`.
///
/// ```
/// use ratescrape::strategy::parse_price;
///
/// assert_eq!(parse_price("₹ 12,345"), 12345.0);
/// assert_eq!(parse_price("Rs. 4,500.50"), 4500.5);
/// assert_eq!(parse_price("Sold out"), 0.0);
/// ```
#[must_use]
pub fn parse_price(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    // "Rs." leaves a leading dot behind
    let cleaned = cleaned.trim_start_matches('.').trim_end_matches('.');
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// First positive currency-prefixed amount found in `text`
#[must_use]
pub fn scan_currency_amount(text: &str) -> Option<f64> {
    CURRENCY_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| parse_price(m.as_str()))
        .find(|value| *value > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_strips_formatting() {
        assert_eq!(parse_price("₹ 12,345"), 12345.0);
        assert_eq!(parse_price("INR 3,200"), 3200.0);
        assert_eq!(parse_price("$199.99 per night"), 199.99);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("1.2.3"), 0.0);
    }

    #[test]
    fn test_scan_picks_first_positive_amount() {
        let text = "Taxes ₹ 0 included. Total ₹ 8,450 for 1 night, was ₹ 9,000";
        assert_eq!(scan_currency_amount(text), Some(8450.0));
        assert_eq!(scan_currency_amount("No prices here"), None);
    }
}
