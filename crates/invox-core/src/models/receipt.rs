//! Receipt data models produced by the extraction pipeline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fields extracted from a single receipt or invoice.
///
/// Every field is either what a rule matched in the OCR text or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt/invoice number (digits after `Receipt #`).
    pub receipt_number: Option<String>,

    /// Issue date, normalised to `"Month D, YYYY"`.
    pub date: Option<String>,

    /// Customer the receipt is billed to.
    pub bill_to: BillTo,

    /// Line items that passed the quantity × price check.
    pub items: Vec<LineItem>,

    /// Total amount as printed on the receipt.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,

    /// Payment method label, verbatim.
    pub payment_method: Option<String>,

    /// Whether OCR error correction ran before extraction.
    #[serde(default)]
    pub ocr_corrections_applied: bool,
}

/// Billing party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTo {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A single line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity.
    pub quantity: u64,

    /// Price per unit.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,

    /// Line total.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl LineItem {
    /// Whether `quantity × unit_price` agrees with `total` within one cent.
    ///
    /// A product that overflows `Decimal` never agrees.
    pub fn is_consistent(&self) -> bool {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .and_then(|expected| expected.checked_sub(self.total))
            .is_some_and(|difference| difference.abs() < Decimal::new(1, 2))
    }
}

impl Receipt {
    /// Sum of all line item totals, or `None` if it overflows.
    pub fn items_sum(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.total))
    }
}

/// Known receipt layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Retail receipt: `Receipt #`, written-month dates, `Total Amount:`.
    TemplateA,
    /// Professional invoice: uppercase labels, numeric dates, ship-to block.
    TemplateB,
    /// Nothing recognisable.
    Unknown,
}

impl TemplateKind {
    /// Human-readable layout name.
    pub fn display_name(&self) -> &'static str {
        match self {
            TemplateKind::TemplateA => "Retail Receipt (Template A)",
            TemplateKind::TemplateB => "Professional Invoice (Template B)",
            TemplateKind::Unknown => "Unknown Format",
        }
    }

    /// Whether the extraction rules target this layout.
    pub fn is_supported(&self) -> bool {
        matches!(self, TemplateKind::TemplateA)
    }
}

/// Result of layout detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub kind: TemplateKind,
    pub name: String,
    /// Detection score (0 - 100).
    pub confidence: f64,
    /// Labels of the indicators that matched.
    pub indicators: Vec<String>,
    pub supported: bool,
}

impl FormatInfo {
    /// Detection result for text that matched no layout.
    pub fn unknown() -> Self {
        Self::new(TemplateKind::Unknown)
    }

    pub fn new(kind: TemplateKind) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            confidence: 0.0,
            indicators: Vec::new(),
            supported: kind.is_supported(),
        }
    }
}

/// Confidence band used for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceBand::High
        } else if score >= 50.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "Data extraction looks good!",
            ConfidenceBand::Medium => "Some fields may be missing or incorrect.",
            ConfidenceBand::Low => "This invoice format may not be supported yet.",
        }
    }
}

/// Full output of one pipeline run: the receipt plus how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    #[serde(flatten)]
    pub receipt: Receipt,

    /// Heuristic score (0 - 100) from which fields were found.
    pub extraction_confidence: f64,

    /// Cross-check warnings; never fatal.
    pub validation_warnings: Vec<String>,

    /// Detected layout.
    pub format: FormatInfo,

    /// Input file name (batch mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// When the report was produced (batch mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl ExtractionReport {
    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.extraction_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_line_item_consistency() {
        let item = LineItem {
            description: "Widget".to_string(),
            quantity: 3,
            unit_price: dec("19.99"),
            total: dec("59.97"),
        };
        assert!(item.is_consistent());

        let wrong = LineItem {
            total: dec("60.00"),
            ..item
        };
        assert!(!wrong.is_consistent());
    }

    #[test]
    fn test_overflow_is_inconsistent_and_unsummable() {
        let huge = LineItem {
            description: "Gold".to_string(),
            quantity: 9,
            unit_price: Decimal::MAX,
            total: dec("1.00"),
        };
        assert!(!huge.is_consistent());

        let receipt = Receipt {
            items: vec![
                LineItem { quantity: 1, total: Decimal::MAX, ..huge.clone() },
                LineItem { quantity: 1, total: Decimal::MAX, ..huge },
            ],
            ..Default::default()
        };
        assert_eq!(receipt.items_sum(), None);
    }

    #[test]
    fn test_report_serializes_flat_with_numbers() {
        let report = ExtractionReport {
            receipt: Receipt {
                receipt_number: Some("1042".to_string()),
                total_amount: Some(dec("150.00")),
                items: vec![LineItem {
                    description: "Subscription".to_string(),
                    quantity: 1,
                    unit_price: dec("150.00"),
                    total: dec("150.00"),
                }],
                ..Default::default()
            },
            extraction_confidence: 42.5,
            validation_warnings: vec![],
            format: FormatInfo::unknown(),
            source_file: None,
            processed_at: None,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["receipt_number"], "1042");
        assert_eq!(json["total_amount"], 150.0);
        assert_eq!(json["items"][0]["unit_price"], 150.0);
        assert_eq!(json["bill_to"]["name"], serde_json::Value::Null);
        assert_eq!(json["extraction_confidence"], 42.5);
        assert!(json.get("source_file").is_none());
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_score(100.0), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(80.0), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(79.9), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(50.0), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(10.0), ConfidenceBand::Low);
    }
}
