//! Preprocess command - analyze image quality and write the OCR-ready image.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use invox_core::models::config::PreprocessMode;
use invox_core::ImagePreprocessor;

use super::load_config;

/// Arguments for the preprocess command.
#[derive(Args)]
pub struct PreprocessArgs {
    /// Input image
    #[arg(required = true)]
    input: PathBuf,

    /// Where to write the processed image (format from extension)
    #[arg(short, long, required = true)]
    output: PathBuf,

    /// Processing mode (default: from config)
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    /// Image as decoded
    None,
    /// Grayscale only
    Grayscale,
    /// Grayscale plus steps chosen from the quality analysis
    Adaptive,
    /// Grayscale, contrast enhancement and denoising
    Full,
}

impl From<ModeArg> for PreprocessMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::None => PreprocessMode::None,
            ModeArg::Grayscale => PreprocessMode::Grayscale,
            ModeArg::Adaptive => PreprocessMode::Adaptive,
            ModeArg::Full => PreprocessMode::Full,
        }
    }
}

pub async fn run(args: PreprocessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut preprocessor = ImagePreprocessor::new(config.preprocess.clone());
    if let Some(mode) = args.mode {
        preprocessor = preprocessor.with_mode(mode.into());
    }

    let image = image::open(&args.input)?;
    info!("Preprocessing {} in {:?} mode", args.input.display(), preprocessor.mode());
    let result = preprocessor.preprocess(&image)?;

    if let Some(metrics) = &result.metrics {
        println!("{}", style("Image quality analysis:").bold());
        for line in metrics.to_string().lines() {
            println!("  {}", line);
        }
        println!();
    }

    if let Some(plan) = &result.plan {
        if plan.is_minimal() && !plan.blurry {
            println!("{} Image quality is good, minimal processing", style("✓").green());
        } else {
            println!("{}", style("Image needs improvement:").yellow());
            for reason in &plan.reasons {
                println!("  - {}", reason);
            }
        }
        println!();
    }

    println!("Steps applied: {}", result.steps.join(", "));
    if let Some(change) = result.contrast_change {
        println!("Contrast change: {:+.2}%", change);
    }

    result.image.save(&args.output)?;
    println!(
        "{} Processed image written to {}",
        style("✓").green(),
        args.output.display()
    );

    Ok(())
}
