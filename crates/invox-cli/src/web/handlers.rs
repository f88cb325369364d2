//! Request handlers for the web UI.

use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;

use axum::{
    extract::{Multipart, Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use invox_core::invoice::recommendations;
use invox_core::models::receipt::{ConfidenceBand, ExtractionReport, FormatInfo};
use invox_core::pipeline::OcrSummary;
use invox_core::{decode_image, is_supported_image, OcrEngine};

use super::error::ApiError;
use super::AppState;

/// Gallery size on the index page.
pub const MAX_SAMPLES: usize = 6;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub report: ExtractionReport,
    pub ocr_text: String,
    pub format: FormatInfo,
    pub recommendations: Vec<String>,
    pub confidence_band: ConfidenceBand,
    pub ocr: Option<OcrSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SampleList {
    pub samples: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Stats {
    pub processed_count: u64,
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
pub async fn health<E: OcrEngine + 'static>(
    State(state): State<AppState<E>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "engine": state.processor.engine().name(),
    }))
}

/// GET /api/stats
pub async fn stats<E: OcrEngine + 'static>(State(state): State<AppState<E>>) -> Json<Stats> {
    Json(Stats {
        processed_count: state.processed.load(Ordering::Relaxed),
    })
}

/// POST /api/extract - run the full pipeline on an uploaded image.
///
/// Expects a multipart form with the image in the `file` field.
pub async fn extract<E: OcrEngine + 'static>(
    State(state): State<AppState<E>>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, ApiError> {
    let mut upload = None;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                too_large(state.max_upload_bytes)
            } else {
                ApiError::BadRequest(e.body_text())
            }
        })?;
        let Some(field) = field else { break };

        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                too_large(state.max_upload_bytes)
            } else {
                ApiError::BadRequest(e.body_text())
            }
        })?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("missing `file` field".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
    }
    if bytes.len() > state.max_upload_bytes {
        return Err(too_large(state.max_upload_bytes));
    }

    debug!(
        "Upload {} ({} bytes)",
        file_name.as_deref().unwrap_or("<unnamed>"),
        bytes.len()
    );

    // Decoding and OCR are both CPU-bound.
    let processor = state.processor.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let image = decode_image(&bytes)?;
        processor.process_image(&image)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(|e| {
        warn!("Extraction failed: {}", e);
        ApiError::from(e)
    })?;

    let count = state.processed.fetch_add(1, Ordering::Relaxed) + 1;
    info!(
        "Extracted {} (confidence {:.0}%, {} processed)",
        file_name.as_deref().unwrap_or("upload"),
        outcome.report.extraction_confidence,
        count
    );

    let mut report = outcome.report;
    report.source_file = file_name;

    Ok(Json(ExtractResponse {
        format: report.format.clone(),
        recommendations: recommendations(&report.format),
        confidence_band: report.confidence_band(),
        report,
        ocr_text: outcome.ocr_text,
        ocr: outcome.ocr,
    }))
}

/// GET /api/samples
pub async fn samples<E: OcrEngine + 'static>(
    State(state): State<AppState<E>>,
) -> Json<SampleList> {
    Json(SampleList {
        samples: list_samples(&state.sample_dir),
    })
}

/// GET /samples/:name
pub async fn sample_image<E: OcrEngine + 'static>(
    State(state): State<AppState<E>>,
    UrlPath(name): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_plain_file_name(&name) || !is_supported_image(Path::new(&name)) {
        return Err(ApiError::BadRequest(format!("invalid sample name: {}", name)));
    }

    let path = state.sample_dir.join(&name);
    let bytes =
        fs::read(&path).map_err(|_| ApiError::NotFound(format!("sample not found: {}", name)))?;

    Ok(([(header::CONTENT_TYPE, content_type(&path))], bytes))
}

/// Supported images in the sample directory, sorted, at most [`MAX_SAMPLES`].
pub fn list_samples(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!("Sample directory {} not readable", dir.display());
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_supported_image(p))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names.truncate(MAX_SAMPLES);
    names
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn too_large(limit: usize) -> ApiError {
    ApiError::PayloadTooLarge(format!("file exceeds the {} byte upload limit", limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file_name() {
        assert!(is_plain_file_name("receipt1.png"));
        assert!(!is_plain_file_name("../secret.png"));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(!is_plain_file_name(".hidden.png"));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn test_list_samples_caps_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..8 {
            fs::write(dir.path().join(format!("s{}.png", i)), b"x").unwrap();
        }
        fs::write(dir.path().join("readme.md"), b"x").unwrap();

        let names = list_samples(dir.path());
        assert_eq!(names.len(), MAX_SAMPLES);
        assert_eq!(names[0], "s0.png");
        assert!(names.iter().all(|n| n.ends_with(".png")));
    }

    #[test]
    fn test_list_samples_missing_dir() {
        assert!(list_samples(Path::new("/nonexistent/invox-samples")).is_empty());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
    }
}
