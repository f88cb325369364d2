//! Receipt field extraction module.

mod confidence;
mod format;
mod parser;
pub mod rules;
mod validate;

pub use confidence::calculate_confidence_score;
pub use format::{detect_format, recommendations};
pub use parser::{ParseOutcome, ReceiptParser, TemplateParser};
pub use validate::validate_extraction;

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
