//! Bill-to party extraction.

use tracing::debug;

use crate::models::receipt::BillTo;

use super::patterns::{BILL_TO_NAME, EMAIL};
use super::{ExtractionMatch, FieldExtractor};

/// Email extractor that skips the vendor's own addresses.
pub struct EmailExtractor {
    ignored_prefixes: Vec<String>,
}

impl EmailExtractor {
    pub fn new() -> Self {
        Self {
            ignored_prefixes: Vec::new(),
        }
    }

    /// Skip emails whose local part starts with any of these prefixes.
    pub fn with_ignored_prefixes(mut self, prefixes: impl IntoIterator<Item = String>) -> Self {
        self.ignored_prefixes = prefixes.into_iter().collect();
        self
    }

    fn is_ignored(&self, email: &str) -> bool {
        self.ignored_prefixes
            .iter()
            .any(|p| !p.is_empty() && email.starts_with(p.as_str()))
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for EmailExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        EMAIL
            .find_iter(text)
            .filter(|m| {
                let ignored = self.is_ignored(m.as_str());
                if ignored {
                    debug!("Skipping vendor email {}", m.as_str());
                }
                !ignored
            })
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), m.as_str())
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}

/// Extract the customer name after `Bill To:`.
pub fn extract_bill_to_name(text: &str) -> Option<String> {
    BILL_TO_NAME
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Extract the billed-to name and email.
pub fn extract_bill_to(text: &str, emails: &EmailExtractor) -> BillTo {
    BillTo {
        name: extract_bill_to_name(text),
        email: emails.extract(text).map(|m| m.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EmailExtractor {
        EmailExtractor::new().with_ignored_prefixes(["inquire".to_string()])
    }

    #[test]
    fn test_name_on_next_line() {
        let text = "Bill To:\nJohn Smith\n123 Main St";
        assert_eq!(extract_bill_to_name(text), Some("John Smith".to_string()));
    }

    #[test]
    fn test_name_on_same_line() {
        let text = "Bill To: Mary Ann Jones";
        assert_eq!(extract_bill_to_name(text), Some("Mary Ann Jones".to_string()));
    }

    #[test]
    fn test_single_word_name_is_rejected() {
        assert_eq!(extract_bill_to_name("Bill To: Madonna\n"), None);
    }

    #[test]
    fn test_vendor_email_skipped() {
        let text = "Contact inquire@shop.com\nBill To: John Smith john.smith@mail.com";
        let bill_to = extract_bill_to(text, &extractor());

        assert_eq!(bill_to.name.as_deref(), Some("John Smith"));
        assert_eq!(bill_to.email.as_deref(), Some("john.smith@mail.com"));
    }

    #[test]
    fn test_only_vendor_email() {
        let bill_to = extract_bill_to("inquire@shop.com", &extractor());
        assert_eq!(bill_to.email, None);
    }
}
