//! Error types for the invox-core library.

use thiserror::Error;

/// Main error type for the invox library.
#[derive(Error, Debug)]
pub enum InvoxError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Receipt extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input file type is not an image we can decode.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The Tesseract executable could not be started.
    #[error("OCR engine unavailable ({command}): {reason}")]
    EngineUnavailable { command: String, reason: String },

    /// Tesseract ran but reported a failure.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Tesseract TSV output could not be parsed.
    #[error("malformed TSV output at line {line}: {reason}")]
    MalformedTsv { line: usize, reason: String },
}

/// Errors related to receipt field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// OCR produced no usable text.
    #[error("no text detected in image")]
    NoText,
}

/// Result type for the invox library.
pub type Result<T> = std::result::Result<T, InvoxError>;
