//! OCR pipeline backed by the Tesseract command-line engine.

mod preprocessing;
mod tesseract;

pub use preprocessing::{
    equalize_histogram, flatten_alpha, median_filter_3x3, ImagePreprocessor, PreprocessPlan,
    Preprocessed, QualityMetrics,
};
pub use tesseract::{parse_tsv, TesseractEngine};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Anything that turns an image into text.
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs and reports.
    fn name(&self) -> &str;

    /// Recognize the text in an (already preprocessed) image.
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput, OcrError>;
}

/// A recognized word with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,

    /// Recognition confidence (0 - 100).
    pub confidence: f32,

    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Full text in reading order.
    pub text: String,

    /// Per-word results, when the engine reports them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<OcrWord>,

    /// Mean word confidence (0 - 100).
    pub mean_confidence: Option<f32>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrOutput {
    /// Output with text only.
    pub fn from_text(text: impl Into<String>, image_size: (u32, u32)) -> Self {
        Self {
            text: text.into(),
            words: Vec::new(),
            mean_confidence: None,
            processing_time_ms: 0,
            image_size,
        }
    }

    /// Attach per-word results and recompute the mean confidence.
    pub fn with_words(mut self, words: Vec<OcrWord>) -> Self {
        self.mean_confidence = mean_confidence(&words);
        self.words = words;
        self
    }

    /// Whether the engine found anything worth parsing.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Mean confidence of a set of words, `None` when there are none.
pub fn mean_confidence(words: &[OcrWord]) -> Option<f32> {
    if words.is_empty() {
        return None;
    }
    Some(words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, confidence: f32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            confidence,
            left: 0,
            top: 0,
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn test_mean_confidence() {
        assert_eq!(mean_confidence(&[]), None);
        assert_eq!(mean_confidence(&[word("a", 90.0), word("b", 70.0)]), Some(80.0));
    }

    #[test]
    fn test_output_blank() {
        assert!(OcrOutput::from_text(" \n ", (1, 1)).is_blank());

        let output = OcrOutput::from_text("Receipt", (1, 1)).with_words(vec![word("Receipt", 95.0)]);
        assert!(!output.is_blank());
        assert_eq!(output.mean_confidence, Some(95.0));
    }
}
