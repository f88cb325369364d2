//! Amount extraction for receipts.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::TOTAL_AMOUNT;
use super::{ExtractionMatch, FieldExtractor};

/// Extractor for the `Total Amount:` line.
pub struct TotalExtractor;

impl TotalExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TotalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TotalExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TOTAL_AMOUNT
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let amount = parse_amount(&caps[1])?;
                Some(
                    ExtractionMatch::new(amount, full.as_str())
                        .with_position(full.start(), full.end()),
                )
            })
            .collect()
    }
}

/// First `Total Amount:` value in the text.
pub fn extract_total(text: &str) -> Option<Decimal> {
    TotalExtractor::new().extract(text).map(|m| m.value)
}

/// Parse a US-formatted amount ("1,234.50", "$99", "12.").
///
/// Thousands separators and a leading `$` are dropped; anything that is not
/// a plain decimal afterwards is rejected.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let cleaned = cleaned.trim_end_matches('.');

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(cleaned).ok()
}

/// Format an amount as dollars with two decimals ("$1234.50").
pub fn format_dollars(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.50"), Some(dec("1234.50")));
        assert_eq!(parse_amount("$99"), Some(dec("99")));
        assert_eq!(parse_amount("12."), Some(dec("12")));
        assert_eq!(parse_amount(","), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_extract_total() {
        assert_eq!(extract_total("Total Amount: $1,250.00"), Some(dec("1250.00")));
        assert_eq!(extract_total("TOTAL AMOUNT:450.5"), Some(dec("450.5")));
        assert_eq!(extract_total("Subtotal: $10.00"), None);
    }

    #[test]
    fn test_first_total_wins() {
        let extractor = TotalExtractor::new();
        let text = "Total Amount: $10.00\nTotal Amount: $20.00";

        let all = extractor.extract_all(text);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].position, Some((0, 20)));
        assert_eq!(extract_total(text), Some(dec("10.00")));
    }

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(dec("1234.5")), "$1234.50");
    }
}
