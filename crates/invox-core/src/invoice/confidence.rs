//! Heuristic extraction confidence.

use crate::models::receipt::Receipt;

const RECEIPT_NUMBER_WEIGHT: f64 = 20.0;
const DATE_WEIGHT: f64 = 20.0;
const NAME_WEIGHT: f64 = 15.0;
const EMAIL_WEIGHT: f64 = 15.0;
const TOTAL_WEIGHT: f64 = 20.0;
const PAYMENT_WEIGHT: f64 = 10.0;
const PER_ITEM_WEIGHT: f64 = 2.5;
const MAX_ITEMS_WEIGHT: f64 = 10.0;

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Score (0 - 100) based on which fields were found.
pub fn calculate_confidence_score(receipt: &Receipt) -> f64 {
    let fields = [
        (present(&receipt.receipt_number), RECEIPT_NUMBER_WEIGHT),
        (present(&receipt.date), DATE_WEIGHT),
        (present(&receipt.bill_to.name), NAME_WEIGHT),
        (present(&receipt.bill_to.email), EMAIL_WEIGHT),
        (receipt.total_amount.is_some_and(|t| !t.is_zero()), TOTAL_WEIGHT),
        (present(&receipt.payment_method), PAYMENT_WEIGHT),
    ];

    let mut score: f64 = fields
        .iter()
        .filter(|(found, _)| *found)
        .map(|(_, weight)| weight)
        .sum();

    score += (receipt.items.len() as f64 * PER_ITEM_WEIGHT).min(MAX_ITEMS_WEIGHT);

    score.min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::LineItem;
    use rust_decimal::Decimal;

    fn widget() -> LineItem {
        LineItem {
            description: "Widget".to_string(),
            quantity: 1,
            unit_price: Decimal::ONE,
            total: Decimal::ONE,
        }
    }

    #[test]
    fn test_empty_receipt_scores_zero() {
        assert_eq!(calculate_confidence_score(&Receipt::default()), 0.0);
    }

    #[test]
    fn test_partial_fields() {
        let receipt = Receipt {
            receipt_number: Some("1042".to_string()),
            total_amount: Some(Decimal::ZERO),
            payment_method: Some(String::new()),
            items: vec![widget()],
            ..Default::default()
        };

        assert_eq!(calculate_confidence_score(&receipt), 22.5);
    }

    #[test]
    fn test_full_receipt_capped() {
        let mut receipt = Receipt {
            receipt_number: Some("1042".to_string()),
            date: Some("March 5, 2024".to_string()),
            total_amount: Some(Decimal::new(500, 2)),
            payment_method: Some("Cash".to_string()),
            items: vec![widget(); 6],
            ..Default::default()
        };
        receipt.bill_to.name = Some("John Smith".to_string());
        receipt.bill_to.email = Some("john@mail.com".to_string());

        assert_eq!(calculate_confidence_score(&receipt), 100.0);
    }
}
