//! Image preprocessing for OCR.
//!
//! Tesseract does best on clean grayscale input. Heavier processing only pays
//! off on poor images, so `Adaptive` mode measures the image first and applies
//! just the steps its metrics call for.

use std::fmt;

use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{PreprocessConfig, PreprocessMode};

const STEP_DOWNSCALE: &str = "Downscaling";
const STEP_GRAYSCALE: &str = "Grayscale conversion";
const STEP_CONTRAST: &str = "Contrast enhancement";
const STEP_DENOISE: &str = "Denoising";

/// Measured image quality, computed on the grayscale image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean pixel value (0 - 255).
    pub mean_brightness: f64,
    /// Standard deviation of pixel values.
    pub contrast: f64,
    /// Variance of the 3x3 Laplacian; low values mean blur.
    pub sharpness: f64,
    pub width: u32,
    pub height: u32,
}

impl QualityMetrics {
    pub fn analyze(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let (mean_brightness, contrast) = mean_and_std(gray);
        Self {
            mean_brightness,
            contrast,
            sharpness: laplacian_variance(gray),
            width,
            height,
        }
    }
}

impl fmt::Display for QualityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Brightness: {:.1} (good: 80-200)", self.mean_brightness)?;
        writeln!(f, "Contrast:   {:.1} (good: >40)", self.contrast)?;
        writeln!(f, "Sharpness:  {:.1} (good: >100)", self.sharpness)?;
        write!(f, "Size:       {}x{} pixels", self.width, self.height)
    }
}

/// Steps the quality analysis asks for, and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessPlan {
    pub enhance_contrast: bool,
    pub denoise: bool,
    pub blurry: bool,
    pub reasons: Vec<String>,
}

impl PreprocessPlan {
    pub fn from_metrics(metrics: &QualityMetrics, config: &PreprocessConfig) -> Self {
        let mut plan = Self::default();

        if metrics.contrast < config.min_contrast {
            plan.enhance_contrast = true;
            plan.reasons.push(format!("Low contrast ({:.1})", metrics.contrast));
        }

        if metrics.mean_brightness < config.min_brightness
            || metrics.mean_brightness > config.max_brightness
        {
            plan.enhance_contrast = true;
            plan.reasons
                .push(format!("Poor brightness ({:.1})", metrics.mean_brightness));
        }

        // Denoising a blurry image makes it worse.
        if metrics.sharpness < config.blur_threshold {
            plan.blurry = true;
            plan.reasons
                .push(format!("Image is blurry ({:.1})", metrics.sharpness));
        } else if metrics.sharpness < config.noise_threshold {
            plan.denoise = true;
            plan.reasons
                .push(format!("Some noise detected ({:.1})", metrics.sharpness));
        }

        plan
    }

    /// Whether the image is good enough for grayscale-only processing.
    pub fn is_minimal(&self) -> bool {
        !self.enhance_contrast && !self.denoise
    }
}

/// Preprocessed image plus what was done to it.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub image: DynamicImage,
    /// Metrics of the grayscale input (not computed in `None` mode).
    pub metrics: Option<QualityMetrics>,
    /// Plan derived from the metrics (`Adaptive` mode only).
    pub plan: Option<PreprocessPlan>,
    /// Human-readable steps that were applied.
    pub steps: Vec<String>,
    /// Relative contrast change in percent.
    pub contrast_change: Option<f64>,
}

/// Image preprocessor for the OCR pipeline.
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.config.max_image_size = size;
        self
    }

    /// Set processing mode.
    pub fn with_mode(mut self, mode: PreprocessMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn mode(&self) -> PreprocessMode {
        self.config.mode
    }

    /// Prepare an image for OCR according to the configured mode.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Preprocessed, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("empty image {}x{}", width, height)));
        }
        debug!("Original image size: {}x{}", width, height);

        let mut steps = Vec::new();
        let image = flatten_alpha(image);
        let image = self.downscale(image, &mut steps);

        if self.config.mode == PreprocessMode::None {
            return Ok(Preprocessed {
                image,
                metrics: None,
                plan: None,
                steps,
                contrast_change: None,
            });
        }

        let gray = image.to_luma8();
        let metrics = QualityMetrics::analyze(&gray);
        debug!(
            "Quality: brightness {:.1}, contrast {:.1}, sharpness {:.1}",
            metrics.mean_brightness, metrics.contrast, metrics.sharpness
        );

        let (processed, plan) = match self.config.mode {
            PreprocessMode::Grayscale | PreprocessMode::None => (gray.clone(), None),
            PreprocessMode::Full => {
                steps.push(STEP_CONTRAST.to_string());
                steps.push(STEP_DENOISE.to_string());
                (median_filter_3x3(&equalize_histogram(&gray)), None)
            }
            PreprocessMode::Adaptive => {
                let plan = PreprocessPlan::from_metrics(&metrics, &self.config);
                let mut processed = gray.clone();
                if plan.enhance_contrast {
                    processed = equalize_histogram(&processed);
                    steps.push(STEP_CONTRAST.to_string());
                }
                if plan.denoise {
                    processed = median_filter_3x3(&processed);
                    steps.push(STEP_DENOISE.to_string());
                }
                (processed, Some(plan))
            }
        };

        let (_, new_contrast) = mean_and_std(&processed);
        let contrast_change = (metrics.contrast > 0.0)
            .then(|| (new_contrast - metrics.contrast) / metrics.contrast * 100.0);

        let processed = if self.config.mode == PreprocessMode::Adaptive
            && contrast_change.is_some_and(|c| c < 0.0)
        {
            info!("Preprocessing reduced contrast, falling back to grayscale");
            steps.retain(|s| s == STEP_DOWNSCALE);
            gray
        } else {
            processed
        };

        if steps.iter().all(|s| s == STEP_DOWNSCALE) {
            steps.push(STEP_GRAYSCALE.to_string());
        }

        Ok(Preprocessed {
            image: DynamicImage::ImageLuma8(processed),
            metrics: Some(metrics),
            plan,
            steps,
            contrast_change,
        })
    }

    fn downscale(&self, image: DynamicImage, steps: &mut Vec<String>) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) =
            calculate_resize_dimensions(width, height, self.config.max_image_size);
        if (new_width, new_height) == (width, height) {
            return image;
        }

        debug!("Downscaling {}x{} to {}x{}", width, height, new_width, new_height);
        steps.push(STEP_DOWNSCALE.to_string());
        image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}

/// Composite transparent pixels onto white; opaque images pass through.
pub fn flatten_alpha(image: &DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image.clone();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    DynamicImage::ImageRgb8(rgb)
}

fn calculate_resize_dimensions(width: u32, height: u32, target_size: u32) -> (u32, u32) {
    let max_dim = width.max(height);

    if target_size == 0 || max_dim <= target_size {
        return (width, height);
    }

    let scale = target_size as f32 / max_dim as f32;
    let new_width = (width as f32 * scale) as u32;
    let new_height = (height as f32 * scale) as u32;

    (new_width.max(1), new_height.max(1))
}

fn mean_and_std(image: &GrayImage) -> (f64, f64) {
    let count = (image.width() as f64) * (image.height() as f64);
    if count == 0.0 {
        return (0.0, 0.0);
    }

    let (sum, sum_sq) = image.pixels().fold((0.0f64, 0.0f64), |(s, sq), p| {
        let v = p[0] as f64;
        (s + v, sq + v * v)
    });
    let mean = sum / count;
    let variance = (sum_sq / count - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

/// Variance of the 4-neighbour Laplacian over interior pixels.
fn laplacian_variance(image: &GrayImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let px = |x: u32, y: u32| image.get_pixel(x, y)[0] as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0.0;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let lap = px(x - 1, y) + px(x + 1, y) + px(x, y - 1) + px(x, y + 1) - 4.0 * px(x, y);
            sum += lap;
            sum_sq += lap * lap;
            count += 1.0;
        }
    }

    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Global histogram equalization.
pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let mut histogram = [0u64; 256];
    for p in image.pixels() {
        histogram[p[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    let mut cdf = [0u64; 256];
    let mut running = 0;
    for (i, count) in histogram.iter().enumerate() {
        running += count;
        cdf[i] = running;
    }

    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total == cdf_min {
        // Single-valued image; nothing to spread.
        return image.clone();
    }

    let mut lut = [0u8; 256];
    for (i, value) in lut.iter_mut().enumerate() {
        let scaled = (cdf[i].saturating_sub(cdf_min)) as f64 / (total - cdf_min) as f64 * 255.0;
        *value = scaled.round().clamp(0.0, 255.0) as u8;
    }

    let mut result = image.clone();
    for p in result.pixels_mut() {
        p[0] = lut[p[0] as usize];
    }
    result
}

/// 3x3 median filter; border pixels use the clamped neighbourhood.
pub fn median_filter_3x3(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut window = Vec::with_capacity(9);
            for ly in y.saturating_sub(1)..(y + 2).min(height) {
                for lx in x.saturating_sub(1)..(x + 2).min(width) {
                    window.push(image.get_pixel(lx, ly)[0]);
                }
            }
            window.sort_unstable();
            result.put_pixel(x, y, Luma([window[window.len() / 2]]));
        }
    }

    result
}
