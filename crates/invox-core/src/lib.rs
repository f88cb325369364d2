//! Core library for receipt OCR and structured data extraction.
//!
//! This crate provides:
//! - Image preprocessing driven by measured image quality
//! - OCR through the Tesseract command-line engine
//! - Receipt layout detection and rule-based field extraction
//! - Validation warnings and an extraction confidence score
//! - Batch summary models

pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pipeline;

pub use error::{ExtractionError, InvoxError, OcrError, Result};
pub use invoice::{
    calculate_confidence_score, detect_format, recommendations, validate_extraction, ParseOutcome,
    ReceiptParser, TemplateParser,
};
pub use models::batch::{BatchStatus, BatchSummary, FileResult};
pub use models::config::{InvoxConfig, PreprocessMode};
pub use models::receipt::{
    BillTo, ConfidenceBand, ExtractionReport, FormatInfo, LineItem, Receipt, TemplateKind,
};
pub use ocr::{ImagePreprocessor, OcrEngine, OcrOutput, OcrWord, TesseractEngine};
pub use pipeline::{decode_image, is_supported_image, OcrSummary, ProcessOutcome, Processor};
