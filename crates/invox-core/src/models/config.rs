//! Configuration structures for the OCR pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::InvoxError;

/// Environment variable overriding the Tesseract executable.
pub const TESSERACT_ENV: &str = "INVOX_TESSERACT";

/// Main configuration for the invox pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoxConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Image preprocessing configuration.
    pub preprocess: PreprocessConfig,

    /// Receipt extraction configuration.
    pub extraction: ExtractionConfig,

    /// Web UI configuration.
    pub web: WebConfig,
}

/// Tesseract invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable (name on PATH or absolute path).
    pub tesseract_cmd: String,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu".
    pub language: String,

    /// Page segmentation mode passed as `--psm`.
    pub page_segmentation_mode: u8,

    /// Optional `--tessdata-dir`.
    pub tessdata_dir: Option<PathBuf>,

    /// Source resolution hint passed as `--dpi`.
    pub dpi: Option<u32>,

    /// Run a second TSV pass for per-word confidences.
    pub word_confidences: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 3,
            tessdata_dir: None,
            dpi: None,
            word_confidences: true,
        }
    }
}

/// How much work to do on an image before OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessMode {
    /// Send the decoded image as-is.
    None,
    /// Grayscale conversion only. Clean photos OCR best like this.
    #[default]
    Grayscale,
    /// Grayscale plus whatever the quality analysis asks for.
    Adaptive,
    /// Grayscale, contrast enhancement and denoising, always.
    Full,
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Processing mode.
    pub mode: PreprocessMode,

    /// Maximum image dimension (longer side); larger images are downscaled.
    pub max_image_size: u32,

    /// Contrast (pixel std-dev) below which enhancement is applied.
    pub min_contrast: f64,

    /// Acceptable mean brightness range.
    pub min_brightness: f64,
    pub max_brightness: f64,

    /// Laplacian variance below which an image is considered blurry.
    pub blur_threshold: f64,

    /// Laplacian variance below which (but above blur) denoising helps.
    pub noise_threshold: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            mode: PreprocessMode::Grayscale,
            max_image_size: 4096,
            min_contrast: 40.0,
            min_brightness: 80.0,
            max_brightness: 200.0,
            blur_threshold: 100.0,
            noise_threshold: 500.0,
        }
    }
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Try to correct common OCR errors in item lines.
    pub auto_correct: bool,

    /// Email local-part prefixes that belong to the vendor, not the customer.
    pub ignored_email_prefixes: Vec<String>,

    /// Plausible year range for the receipt date.
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            auto_correct: true,
            ignored_email_prefixes: vec!["inquire".to_string()],
            min_year: 2020,
            max_year: 2100,
        }
    }
}

/// Web UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Address the server binds to.
    pub bind: String,

    /// Directory with sample invoice images shown in the gallery.
    pub sample_dir: PathBuf,

    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            sample_dir: PathBuf::from("data/raw"),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl InvoxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InvoxError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Apply environment overrides on top of file/default values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(cmd) = std::env::var(TESSERACT_ENV) {
            if !cmd.trim().is_empty() {
                self.ocr.tesseract_cmd = cmd;
            }
        }
        self
    }
}
