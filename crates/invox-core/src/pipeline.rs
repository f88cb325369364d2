//! End-to-end processing: image → OCR → structured receipt report.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExtractionError, InvoxError, Result};
use crate::invoice::{
    calculate_confidence_score, detect_format, validate_extraction, ReceiptParser, TemplateParser,
};
use crate::models::config::InvoxConfig;
use crate::models::receipt::ExtractionReport;
use crate::ocr::{ImagePreprocessor, OcrEngine, QualityMetrics};

/// File extensions accepted as input images.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Whether a path has an image extension we decode.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an uploaded or in-memory image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(InvoxError::UnsupportedFormat("empty file".to_string()));
    }
    image::guess_format(bytes)
        .map_err(|_| InvoxError::UnsupportedFormat("not a recognised image".to_string()))?;
    Ok(image::load_from_memory(bytes)?)
}

/// OCR details reported next to the extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSummary {
    pub engine: String,
    pub mean_confidence: Option<f32>,
    pub processing_time_ms: u64,
    pub image_size: (u32, u32),
    pub preprocessing_steps: Vec<String>,
    pub quality: Option<QualityMetrics>,
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub report: ExtractionReport,
    /// Text as returned by OCR, before correction.
    pub ocr_text: String,
    /// Absent when processing started from text.
    pub ocr: Option<OcrSummary>,
    /// Time spent in correction and field extraction.
    pub parse_time_ms: u64,
}

/// Runs preprocessing, OCR, and receipt extraction with one configuration.
pub struct Processor<E: OcrEngine> {
    config: InvoxConfig,
    preprocessor: ImagePreprocessor,
    engine: E,
    parser: TemplateParser,
}

impl<E: OcrEngine> Processor<E> {
    pub fn new(config: InvoxConfig, engine: E) -> Self {
        Self {
            preprocessor: ImagePreprocessor::new(config.preprocess.clone()),
            parser: TemplateParser::from_config(&config.extraction),
            config,
            engine,
        }
    }

    pub fn config(&self) -> &InvoxConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Process an image file from disk.
    pub fn process_path(&self, path: &Path) -> Result<ProcessOutcome> {
        if !is_supported_image(path) {
            return Err(InvoxError::UnsupportedFormat(path.display().to_string()));
        }
        info!("Processing {}", path.display());
        let image = image::open(path)?;
        self.process_image(&image)
    }

    /// Process a decoded image.
    pub fn process_image(&self, image: &DynamicImage) -> Result<ProcessOutcome> {
        let start = Instant::now();

        let prepared = self.preprocessor.preprocess(image)?;
        debug!("Preprocessing steps: {:?}", prepared.steps);

        let ocr = self.engine.recognize(&prepared.image)?;
        if ocr.is_blank() {
            return Err(ExtractionError::NoText.into());
        }

        let mut outcome = self.process_text(&ocr.text)?;
        outcome.ocr = Some(OcrSummary {
            engine: self.engine.name().to_string(),
            mean_confidence: ocr.mean_confidence,
            processing_time_ms: ocr.processing_time_ms,
            image_size: ocr.image_size,
            preprocessing_steps: prepared.steps,
            quality: prepared.metrics,
        });

        info!(
            "Processed image in {}ms (confidence {:.0}%)",
            start.elapsed().as_millis(),
            outcome.report.extraction_confidence
        );

        Ok(outcome)
    }

    /// Run everything after OCR on already-recognized text.
    pub fn process_text(&self, text: &str) -> Result<ProcessOutcome> {
        let format = detect_format(text);
        debug!("Detected format: {} ({:.1})", format.name, format.confidence);

        let parsed = self.parser.parse(text)?;
        let parse_time_ms = parsed.processing_time_ms;
        let receipt = parsed.receipt;

        let validation_warnings = validate_extraction(&receipt, &self.config.extraction);
        let extraction_confidence = calculate_confidence_score(&receipt);

        Ok(ProcessOutcome {
            report: ExtractionReport {
                receipt,
                extraction_confidence,
                validation_warnings,
                format,
                source_file: None,
                processed_at: None,
            },
            ocr_text: text.to_string(),
            ocr: None,
            parse_time_ms,
        })
    }
}
