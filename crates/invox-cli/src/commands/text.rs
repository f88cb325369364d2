//! Text command - run extraction on a saved OCR text file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use invox_core::{Processor, TesseractEngine};

use super::load_config;
use super::process::{format_report, print_confidence, write_output, OutputFormat};

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// OCR text file (e.g. a `_ocr.txt` written by `batch`)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show extraction confidence and format detection
    #[arg(long)]
    show_confidence: bool,
}

pub async fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let bytes = fs::read(&args.input)?;
    let text = String::from_utf8_lossy(&bytes);
    info!("Extracting from {} ({} characters)", args.input.display(), text.len());

    // The engine is never invoked on this path.
    let processor = Processor::new(config.clone(), TesseractEngine::new(config.ocr.clone()));
    let outcome = processor.process_text(&text)?;

    let output = format_report(&outcome.report, args.format)?;
    write_output(&output, args.output.as_ref())?;

    if args.show_confidence {
        print_confidence(&outcome);
    }

    Ok(())
}
