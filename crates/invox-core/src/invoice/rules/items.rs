//! Line item extraction from the item table.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::models::receipt::LineItem;

use super::patterns::ITEM_ROW;
use super::FieldExtractor;

/// Table header marker columns.
const HEADER_DESCRIPTION: &str = "Item Description";
const HEADER_QUANTITY: &str = "Quantity";
/// Line that closes the item table.
const TABLE_END: &str = "Total Amount:";

/// Extracts rows between the item table header and the total line.
pub struct LineItemExtractor;

impl LineItemExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Lines that form the table body, or `None` without a header.
    fn table_body<'a>(&self, text: &'a str) -> Option<Vec<&'a str>> {
        let lines: Vec<&str> = text.split('\n').collect();

        let mut start = None;
        let mut end = lines.len();
        for (i, line) in lines.iter().enumerate() {
            if line.contains(HEADER_DESCRIPTION) && line.contains(HEADER_QUANTITY) {
                start = Some(i + 1);
            }
            if line.contains(TABLE_END) {
                end = i;
                break;
            }
        }

        let start = start?;
        debug!("Found item table between lines {} and {}", start, end);

        Some(lines.get(start..end).map(|s| s.to_vec()).unwrap_or_default())
    }

    /// Parse one table row. Rows whose arithmetic does not add up are rejected.
    pub fn parse_row(&self, line: &str) -> Option<LineItem> {
        let Some(caps) = ITEM_ROW.captures(line) else {
            debug!("No item match: {}", line.chars().take(60).collect::<String>());
            return None;
        };

        let Ok(quantity) = caps[2].parse() else {
            debug!("Quantity out of range: {} ({})", &caps[2], line);
            return None;
        };

        let item = LineItem {
            description: caps[1].trim().to_string(),
            quantity,
            unit_price: Decimal::from_str(&caps[3]).ok()?,
            total: Decimal::from_str(&caps[4]).ok()?,
        };

        if item.is_consistent() {
            Some(item)
        } else {
            debug!(
                "Item arithmetic mismatch: {} x {} != {} ({})",
                item.quantity, item.unit_price, item.total, line
            );
            None
        }
    }
}

impl Default for LineItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for LineItemExtractor {
    type Output = LineItem;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let Some(body) = self.table_body(text) else {
            debug!("Could not find item table header");
            return Vec::new();
        };

        let items: Vec<LineItem> = body
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .filter_map(|l| self.parse_row(l))
            .collect();

        debug!("Extracted {} line items", items.len());
        items
    }
}

/// Extract all valid line items.
pub fn extract_line_items(text: &str) -> Vec<LineItem> {
    LineItemExtractor::new().extract_all(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_extract_table() {
        let text = "\
Receipt #1
Item Description Quantity Unit Price Total
Premium Software Subscription 1 $150.00 $150.00

USB-C Cable 3 $12.50 $37.50
Total Amount: $187.50
Ignored Row 1 $1.00 $1.00";

        let items = extract_line_items(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Premium Software Subscription");
        assert_eq!(items[0].quantity, 1);
        assert_eq!(items[1].unit_price, dec("12.50"));
        assert_eq!(items[1].total, dec("37.50"));
    }

    #[test]
    fn test_no_header_no_items() {
        assert!(extract_line_items("Widget 1 $1.00 $1.00\nTotal Amount: $1.00").is_empty());
    }

    #[test]
    fn test_table_without_total_runs_to_end() {
        let text = "Item Description Quantity Price Total\nWidget 2 $1.50 $3.00";
        assert_eq!(extract_line_items(text).len(), 1);
    }

    #[test]
    fn test_math_error_rejected() {
        let extractor = LineItemExtractor::new();
        assert!(extractor.parse_row("Widget 2 $1.50 $4.00").is_none());
        assert!(extractor.parse_row("Subtotal $3.00").is_none());
        assert!(extractor.parse_row("Widget 2 1.50 3.00").is_some());
    }

    #[test]
    fn test_overflowing_row_is_inconsistent() {
        let extractor = LineItemExtractor::new();
        assert!(extractor
            .parse_row("Widget 9 $9999999999999999999999999999.00 $1.00")
            .is_none());
    }

    #[test]
    fn test_large_quantity_accepted() {
        let item = LineItemExtractor::new()
            .parse_row("Screws 5000000000 $0.01 $50000000.00")
            .unwrap();
        assert_eq!(item.quantity, 5_000_000_000);

        assert!(LineItemExtractor::new()
            .parse_row("Screws 99999999999999999999 $0.01 $1.00")
            .is_none());
    }
}
