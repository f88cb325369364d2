//! Rule-based receipt parser.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::receipt::Receipt;

use super::rules::{
    contact::extract_bill_to,
    correction::normalize_ocr_errors,
    dates::extract_date,
    items::LineItemExtractor,
    patterns::{PAYMENT_METHOD, RECEIPT_NUMBER},
    EmailExtractor, FieldExtractor, TotalExtractor,
};
use super::Result;

/// Result of receipt parsing.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Extracted receipt fields.
    pub receipt: Receipt,
    /// Text the rules actually ran on (after OCR error correction).
    pub corrected_text: String,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for receipt parsing.
pub trait ReceiptParser {
    /// Parse a receipt from OCR text.
    fn parse(&self, text: &str) -> Result<ParseOutcome>;
}

/// Regex parser for the retail receipt layout.
pub struct TemplateParser {
    /// Whether to correct OCR misreads before extraction.
    auto_correct: bool,
    emails: EmailExtractor,
    totals: TotalExtractor,
    items: LineItemExtractor,
}

impl TemplateParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            auto_correct: config.auto_correct,
            emails: EmailExtractor::new()
                .with_ignored_prefixes(config.ignored_email_prefixes.iter().cloned()),
            totals: TotalExtractor::new(),
            items: LineItemExtractor::new(),
        }
    }

    /// Set OCR error correction.
    pub fn with_auto_correct(mut self, enabled: bool) -> Self {
        self.auto_correct = enabled;
        self
    }

    /// Set the vendor email prefixes to skip.
    pub fn with_ignored_email_prefixes(mut self, prefixes: impl IntoIterator<Item = String>) -> Self {
        self.emails = EmailExtractor::new().with_ignored_prefixes(prefixes);
        self
    }

    fn extract_receipt_number(&self, text: &str) -> Option<String> {
        RECEIPT_NUMBER.captures(text).map(|caps| caps[1].to_string())
    }

    fn extract_payment_method(&self, text: &str) -> Option<String> {
        PAYMENT_METHOD
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser for TemplateParser {
    fn parse(&self, text: &str) -> Result<ParseOutcome> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }

        info!("Parsing receipt from {} characters of text", text.len());

        let corrected_text = if self.auto_correct {
            normalize_ocr_errors(text)
        } else {
            text.to_string()
        };
        let text = corrected_text.as_str();

        let receipt = Receipt {
            receipt_number: self.extract_receipt_number(text),
            date: extract_date(text),
            bill_to: extract_bill_to(text, &self.emails),
            items: self.items.extract_all(text),
            total_amount: self.totals.extract(text).map(|m| m.value),
            payment_method: self.extract_payment_method(text),
            ocr_corrections_applied: self.auto_correct,
        };

        debug!(
            "Extracted receipt {:?} with {} items, total {:?}",
            receipt.receipt_number,
            receipt.items.len(),
            receipt.total_amount
        );

        Ok(ParseOutcome {
            receipt,
            corrected_text,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const SAMPLE: &str = "\
Sunrise Goods Co.
inquire@sunrisegoods.com
Receipt #20931
Date: January 09, 2025

Bill To:
Jane Doe
jane.doe@example.com

Item Description Quantity Unit Price Total
Premium Software Subscription J $15O.00 $15O.00
USB-C Cable 3 $12.50 $37.50
Broken Row 2 $5.00 $11.00

Total Amount: $187.50
Payment Method: Credit Card
";

    #[test]
    fn test_parse_sample_receipt() {
        let outcome = TemplateParser::new().parse(SAMPLE).unwrap();
        let receipt = outcome.receipt;

        assert_eq!(receipt.receipt_number.as_deref(), Some("20931"));
        assert_eq!(receipt.date.as_deref(), Some("January 09, 2025"));
        assert_eq!(receipt.bill_to.name.as_deref(), Some("Jane Doe"));
        assert_eq!(receipt.bill_to.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(receipt.total_amount, Some(Decimal::from_str("187.50").unwrap()));
        assert_eq!(receipt.payment_method.as_deref(), Some("Credit Card"));
        assert!(receipt.ocr_corrections_applied);

        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[0].quantity, 1);
        assert_eq!(receipt.items[0].total, Decimal::from_str("150.00").unwrap());
        assert!(outcome.corrected_text.contains("Subscription 1 $150.00 $150.00"));
    }

    #[test]
    fn test_without_correction_misread_rows_are_lost() {
        let outcome = TemplateParser::new()
            .with_auto_correct(false)
            .parse(SAMPLE)
            .unwrap();

        assert_eq!(outcome.receipt.items.len(), 1);
        assert!(!outcome.receipt.ocr_corrections_applied);
        assert_eq!(outcome.corrected_text, SAMPLE);
    }

    #[test]
    fn test_ignored_prefixes_configurable() {
        let outcome = TemplateParser::new()
            .with_ignored_email_prefixes(Vec::new())
            .parse(SAMPLE)
            .unwrap();

        assert_eq!(
            outcome.receipt.bill_to.email.as_deref(),
            Some("inquire@sunrisegoods.com")
        );
    }

    #[test]
    fn test_blank_text_is_no_text() {
        let err = TemplateParser::new().parse("  \n\t").unwrap_err();
        assert!(matches!(err, ExtractionError::NoText));
    }

    #[test]
    fn test_unrelated_text_yields_empty_receipt() {
        let outcome = TemplateParser::new().parse("hello world").unwrap();
        assert_eq!(outcome.receipt, Receipt {
            ocr_corrections_applied: true,
            ..Default::default()
        });
    }

    #[test]
    fn test_huge_amounts_do_not_abort_parsing() {
        let outcome = TemplateParser::new()
            .parse(
                "Item Description Quantity Unit Price Total\n\
                 Widget 9 $9999999999999999999999999999.00 $1.00\n\
                 Total Amount: $1.00",
            )
            .unwrap();
        assert!(outcome.receipt.items.is_empty());
        assert_eq!(outcome.receipt.total_amount, Some(Decimal::new(100, 2)));
    }
}
