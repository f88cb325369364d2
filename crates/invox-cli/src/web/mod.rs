//! Web UI: a single HTML page plus a small JSON API over the pipeline.

mod error;
mod handlers;

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use invox_core::{OcrEngine, Processor};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared state for all handlers.
pub struct AppState<E: OcrEngine> {
    pub processor: Arc<Processor<E>>,
    /// Successful extractions since the server started.
    pub processed: Arc<AtomicU64>,
    pub sample_dir: Arc<PathBuf>,
    pub max_upload_bytes: usize,
}

impl<E: OcrEngine> AppState<E> {
    pub fn new(processor: Processor<E>) -> Self {
        let web = processor.config().web.clone();
        Self {
            processor: Arc::new(processor),
            processed: Arc::new(AtomicU64::new(0)),
            sample_dir: Arc::new(web.sample_dir),
            max_upload_bytes: web.max_upload_bytes,
        }
    }

    pub fn with_sample_dir(mut self, dir: PathBuf) -> Self {
        self.sample_dir = Arc::new(dir);
        self
    }
}

impl<E: OcrEngine> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            processed: Arc::clone(&self.processed),
            sample_dir: Arc::clone(&self.sample_dir),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Build the application router.
pub fn router<E: OcrEngine + 'static>(state: AppState<E>) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health::<E>))
        .route("/api/extract", post(handlers::extract::<E>))
        .route("/api/samples", get(handlers::samples::<E>))
        .route("/api/stats", get(handlers::stats::<E>))
        .route("/samples/:name", get(handlers::sample_image::<E>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
