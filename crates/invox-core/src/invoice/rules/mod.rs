//! Rule-based field extractors for retail receipts.

pub mod amounts;
pub mod contact;
pub mod correction;
pub mod dates;
pub mod items;
pub mod patterns;

pub use amounts::{extract_total, parse_amount, TotalExtractor};
pub use contact::{extract_bill_to, EmailExtractor};
pub use correction::normalize_ocr_errors;
pub use dates::{extract_date, DateExtractor, WrittenDate};
pub use items::{extract_line_items, LineItemExtractor};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// An extracted value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
