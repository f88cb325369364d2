//! Date extraction for receipts.

use std::fmt;

use super::patterns::{DATE_WRITTEN, YEAR};
use super::{ExtractionMatch, FieldExtractor};

/// A date written as "March 5, 2024".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDate {
    pub month: String,
    /// Day as printed, leading zero included.
    pub day: String,
    pub year: i32,
}

impl fmt::Display for WrittenDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {}", self.month, self.day, self.year)
    }
}

/// Written-month date extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<WrittenDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DATE_WRITTEN
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let date = WrittenDate {
                    month: caps[1].to_string(),
                    day: caps[2].to_string(),
                    year: caps[3].parse().ok()?,
                };
                Some(
                    ExtractionMatch::new(date, full.as_str())
                        .with_position(full.start(), full.end()),
                )
            })
            .collect()
    }
}

/// First written-month date, normalised to `"Month D, YYYY"`.
///
/// The day is kept as printed; an impossible calendar day is still reported.
pub fn extract_date(text: &str) -> Option<String> {
    DateExtractor::new()
        .extract(text)
        .map(|m| m.value.to_string())
}

/// The first four-digit number in a date string.
pub fn year_of(date: &str) -> Option<i32> {
    YEAR.captures(date).and_then(|c| c[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_date_normalises() {
        assert_eq!(extract_date("Date: March 5 2024"), Some("March 5, 2024".to_string()));
        assert_eq!(
            extract_date("Issued January 09, 2025 by us"),
            Some("January 09, 2025".to_string())
        );
        assert_eq!(extract_date("03/05/2024"), None);
    }

    #[test]
    fn test_impossible_day_kept_as_printed() {
        let m = DateExtractor::new().extract("Paid February 31, 2024").unwrap();
        assert_eq!(m.value.to_string(), "February 31, 2024");
        assert_eq!(m.source, "February 31, 2024");
        assert_eq!(m.position, Some((5, 22)));
    }

    #[test]
    fn test_year_of() {
        assert_eq!(year_of("March 5, 2024"), Some(2024));
        assert_eq!(year_of("no year"), None);
    }
}
