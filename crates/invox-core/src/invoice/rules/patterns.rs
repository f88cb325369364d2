//! Common regex patterns for receipt extraction and layout detection.

use lazy_static::lazy_static;
use regex::Regex;

/// Month alternation shared by the written-date patterns.
const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

lazy_static! {
    // Receipt number ("Receipt #1042", "RECEIPT#7")
    pub static ref RECEIPT_NUMBER: Regex = Regex::new(
        r"(?i)Receipt\s*#(\d+)"
    ).unwrap();

    // Written-month date ("March 5, 2024"); month names are case-sensitive
    pub static ref DATE_WRITTEN: Regex = Regex::new(
        &format!(r"({})\s+(\d{{1,2}}),?\s+(\d{{4}})", MONTHS)
    ).unwrap();

    pub static ref YEAR: Regex = Regex::new(
        r"(\d{4})"
    ).unwrap();

    // Customer name on the line after (or on) "Bill To:"
    pub static ref BILL_TO_NAME: Regex = Regex::new(
        r"Bill\s+To:\s*\n?\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();

    // Total ("Total Amount: $1,234.50")
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i)Total\s+Amount:\s*\$?([\d,]+\.?\d*)"
    ).unwrap();

    pub static ref PAYMENT_METHOD: Regex = Regex::new(
        r"(?i)Payment\s+Method:\s*([^\n]+)"
    ).unwrap();

    // Item row: description, quantity, unit price, line total
    pub static ref ITEM_ROW: Regex = Regex::new(
        r"^(.+?)\s+(\d+)\s+\$?(\d+\.\d{2})\s+\$?(\d+\.\d{2})$"
    ).unwrap();

    // A lone J/l/I that OCR produced in place of a quantity of 1
    pub static ref MISREAD_ONE: Regex = Regex::new(
        r"\s+([JlI])\s+\$"
    ).unwrap();

    // Template A indicators
    pub static ref TEMPLATE_A_INDICATORS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)Receipt\s*#\d+").unwrap(), "Receipt # format"),
        (
            Regex::new(&format!(r"(?i)({})\s+\d{{1,2}},?\s+\d{{4}}", MONTHS)).unwrap(),
            "Written month format",
        ),
        (Regex::new(r"(?i)Total\s+Amount:").unwrap(), "Total Amount: label"),
        (Regex::new(r"(?i)Payment\s+Method:").unwrap(), "Payment Method: label"),
        (Regex::new(r"(?i)Item\s+Description\s+Quantity").unwrap(), "Standard table header"),
    ];

    // Template B indicators
    pub static ref TEMPLATE_B_INDICATORS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)RECEIPT\s*#").unwrap(), "RECEIPT # (uppercase)"),
        (Regex::new(r"(?i)RECEIPT\s+DATE").unwrap(), "RECEIPT DATE label"),
        (Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap(), "Date format DD/MM/YYYY"),
        (Regex::new(r"(?i)BILL\s*TO").unwrap(), "BILL TO (uppercase)"),
        (Regex::new(r"(?i)SHIP\s*TO").unwrap(), "SHIP TO label"),
        (Regex::new(r"(?i)QTY\s+DESCRIPTION").unwrap(), "QTY DESCRIPTION header"),
        (Regex::new(r"(?i)UNIT\s+PRICE").unwrap(), "UNIT PRICE column"),
        (Regex::new(r"(?i)East\s+Repair").unwrap(), "East Repair Inc."),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_written_is_case_sensitive() {
        assert!(DATE_WRITTEN.is_match("Date: March 5, 2024"));
        assert!(DATE_WRITTEN.is_match("December 31 2023"));
        assert!(!DATE_WRITTEN.is_match("MARCH 5, 2024"));
    }

    #[test]
    fn test_item_row_requires_two_prices() {
        assert!(ITEM_ROW.is_match("Widget 2 $10.00 $20.00"));
        assert!(ITEM_ROW.is_match("Widget 2 10.00 20.00"));
        assert!(!ITEM_ROW.is_match("Widget 2 $10.00"));
    }
}
