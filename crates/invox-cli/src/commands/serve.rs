//! Serve command - run the web UI.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{info, warn};

use invox_core::{Processor, TesseractEngine};

use super::load_config;
use crate::web::{router, AppState};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (default: from config, 127.0.0.1:8501)
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory with sample invoices for the gallery
    #[arg(short, long)]
    samples: Option<PathBuf>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = args.bind {
        config.web.bind = bind;
    }

    let engine = TesseractEngine::new(config.ocr.clone());
    match engine.version() {
        Ok(version) => info!("Using {}", version),
        Err(e) => warn!("{}; uploads will fail until Tesseract is installed", e),
    }

    let bind = config.web.bind.clone();
    let mut state = AppState::new(Processor::new(config, engine));
    if let Some(samples) = args.samples {
        state = state.with_sample_dir(samples);
    }
    info!("Serving samples from {}", state.sample_dir.display());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    println!(
        "{} invox web UI listening on http://{}",
        style("✓").green(),
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;

    Ok(())
}
