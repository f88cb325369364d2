//! Cross-checks on an extracted receipt.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::receipt::Receipt;

use super::rules::amounts::format_dollars;
use super::rules::dates::year_of;

/// Check the receipt for internal inconsistencies.
///
/// Returns human-readable warnings; an empty list means every check passed.
pub fn validate_extraction(receipt: &Receipt, config: &ExtractionConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(total) = receipt.total_amount.filter(|t| !t.is_zero()) {
        if !receipt.items.is_empty() {
            match receipt.items_sum() {
                Some(items_sum) => {
                    let difference = items_sum.checked_sub(total).map(|d| d.abs());
                    if difference.is_none_or(|d| d > Decimal::new(1, 2)) {
                        debug!("Items sum {} differs from total {}", items_sum, total);
                        warnings.push(format!(
                            "Line items sum ({}) doesn't match total ({})",
                            format_dollars(items_sum),
                            format_dollars(total)
                        ));
                    }
                }
                None => warnings.push(format!(
                    "Line items sum is too large to check against total ({})",
                    format_dollars(total)
                )),
            }
        }
    }

    if let Some(email) = receipt.bill_to.email.as_deref().filter(|e| !e.is_empty()) {
        if !(email.contains('@') && email.contains('.')) {
            warnings.push(format!("Email might be invalid: {}", email));
        }
    }

    if let Some(year) = receipt.date.as_deref().and_then(year_of) {
        if !(config.min_year..=config.max_year).contains(&year) {
            warnings.push(format!("Unusual year in date: {}", year));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::LineItem;
    use pretty_assertions::assert_eq;

    fn item(total: i64) -> LineItem {
        LineItem {
            description: "Widget".to_string(),
            quantity: 1,
            unit_price: Decimal::new(total, 2),
            total: Decimal::new(total, 2),
        }
    }

    #[test]
    fn test_clean_receipt_has_no_warnings() {
        let mut receipt = Receipt {
            items: vec![item(10000), item(5000)],
            total_amount: Some(Decimal::new(15000, 2)),
            date: Some("March 5, 2024".to_string()),
            ..Default::default()
        };
        receipt.bill_to.email = Some("john@mail.com".to_string());

        assert!(validate_extraction(&receipt, &ExtractionConfig::default()).is_empty());
    }

    #[test]
    fn test_items_sum_mismatch() {
        let receipt = Receipt {
            items: vec![item(10000)],
            total_amount: Some(Decimal::new(15000, 2)),
            ..Default::default()
        };

        assert_eq!(
            validate_extraction(&receipt, &ExtractionConfig::default()),
            vec!["Line items sum ($100.00) doesn't match total ($150.00)".to_string()]
        );
    }

    #[test]
    fn test_zero_total_skips_sum_check() {
        let receipt = Receipt {
            items: vec![item(10000)],
            total_amount: Some(Decimal::ZERO),
            ..Default::default()
        };

        assert!(validate_extraction(&receipt, &ExtractionConfig::default()).is_empty());
    }

    #[test]
    fn test_items_sum_overflow_is_a_warning() {
        let huge = LineItem {
            description: "Gold".to_string(),
            quantity: 1,
            unit_price: Decimal::MAX,
            total: Decimal::MAX,
        };
        let receipt = Receipt {
            items: vec![huge.clone(), huge],
            total_amount: Some(Decimal::new(100, 2)),
            ..Default::default()
        };

        assert_eq!(
            validate_extraction(&receipt, &ExtractionConfig::default()),
            vec!["Line items sum is too large to check against total ($1.00)".to_string()]
        );
    }

    #[test]
    fn test_invalid_email_and_year() {
        let mut receipt = Receipt {
            date: Some("March 5, 1999".to_string()),
            ..Default::default()
        };
        receipt.bill_to.email = Some("john@mailcom".to_string());

        assert_eq!(
            validate_extraction(&receipt, &ExtractionConfig::default()),
            vec![
                "Email might be invalid: john@mailcom".to_string(),
                "Unusual year in date: 1999".to_string(),
            ]
        );
    }

    #[test]
    fn test_year_range_from_config() {
        let receipt = Receipt {
            date: Some("March 5, 2019".to_string()),
            ..Default::default()
        };
        let config = ExtractionConfig {
            min_year: 2010,
            ..Default::default()
        };

        assert!(validate_extraction(&receipt, &config).is_empty());
    }
}
