//! Batch processing command for a directory or glob of receipt images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invox_core::invoice::rules::amounts::format_dollars;
use invox_core::models::batch::{BatchStatus, BatchSummary, FileResult};
use invox_core::models::config::InvoxConfig;
use invox_core::{is_supported_image, OcrEngine, Processor, TesseractEngine};

use super::load_config;

/// Default output directory.
const DEFAULT_OUTPUT_DIR: &str = "data/processed/batch_results";
const SUMMARY_JSON: &str = "_batch_summary.json";
const SUMMARY_CSV: &str = "summary.csv";

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input directory or glob pattern (e.g. "data/raw/*.png")
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Also write summary.csv
    #[arg(long)]
    summary_csv: bool,

    /// Stop at the first failed file
    #[arg(long)]
    fail_fast: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No images found for: {}", args.input);
    }

    println!(
        "{} Found {} image(s) to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let output_dir = args.output_dir.clone();
    let fail_fast = args.fail_fast;
    let engine = TesseractEngine::new(config.ocr.clone());
    let results = tokio::task::spawn_blocking(move || {
        process_files(&files, &output_dir, config, engine, fail_fast)
    })
    .await??;

    let summary = BatchSummary::from_results(&results);
    let summary_path = args.output_dir.join(SUMMARY_JSON);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    if args.summary_csv {
        let csv_path = args.output_dir.join(SUMMARY_CSV);
        write_summary_csv(&csv_path, &results)?;
        println!(
            "{} Summary CSV written to {}",
            style("✓").green(),
            csv_path.display()
        );
    }

    print_table(&results, &summary);

    println!();
    println!(
        "{} Processed {} files in {:.2?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "{} Summary report saved to {}",
        style("✓").green(),
        summary_path.display()
    );

    Ok(())
}

/// Expand a directory (its supported images) or a glob pattern, sorted.
fn collect_files(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);
    let mut files: Vec<PathBuf> = if path.is_dir() {
        fs::read_dir(path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect()
    } else {
        glob(input)?.filter_map(|r| r.ok()).collect()
    };

    files.retain(|p| is_supported_image(p));
    files.sort();
    Ok(files)
}

/// Process files one after another, writing per-file outputs as they finish.
fn process_files<E: OcrEngine>(
    files: &[PathBuf],
    output_dir: &Path,
    config: InvoxConfig,
    engine: E,
    fail_fast: bool,
) -> anyhow::Result<Vec<FileResult>> {
    let processor = Processor::new(config, engine);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(filename.clone());

        let file_start = Instant::now();
        let outcome = process_single_file(&processor, path, output_dir);
        let processing_time = file_start.elapsed().as_secs_f64();

        match outcome {
            Ok(report) => results.push(FileResult {
                filename,
                report: Some(report),
                error: None,
                processing_time,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if fail_fast {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push(FileResult {
                    filename,
                    report: None,
                    error: Some(error_msg),
                    processing_time,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(results)
}

fn process_single_file<E: OcrEngine>(
    processor: &Processor<E>,
    path: &Path,
    output_dir: &Path,
) -> anyhow::Result<invox_core::ExtractionReport> {
    let outcome = processor.process_path(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "receipt".to_string());

    let ocr_path = output_dir.join(format!("{}_ocr.txt", stem));
    fs::write(&ocr_path, &outcome.ocr_text)?;
    debug!("Wrote OCR text to {}", ocr_path.display());

    let mut report = outcome.report;
    report.source_file = path.file_name().map(|s| s.to_string_lossy().into_owned());
    report.processed_at = Some(Utc::now());

    let json_path = output_dir.join(format!("{}_structured.json", stem));
    fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;
    debug!("Wrote report to {}", json_path.display());

    Ok(report)
}

fn print_table(results: &[FileResult], summary: &BatchSummary) {
    println!();
    println!("{}", style("Batch processing summary").bold());
    println!("  Successful:    {}", style(summary.successful).green());
    println!("  With warnings: {}", style(summary.with_warnings).yellow());
    println!("  Failed:        {}", style(summary.failed).red());
    println!("  Total:         {}", summary.total_invoices);
    println!();

    println!(
        "{:<25} {:<22} {:>10} {:>8}",
        "Filename", "Status", "Confidence", "Time"
    );
    println!("{}", "-".repeat(70));

    for result in results {
        let status = result.status();
        let label = match status {
            BatchStatus::Success => style(status.as_str()).green(),
            BatchStatus::SuccessWithWarnings => style(status.as_str()).yellow(),
            BatchStatus::Failed => style(status.as_str()).red(),
        };
        println!(
            "{:<25} {:<22} {:>9.0}% {:>7.2}s",
            result.filename,
            label,
            result.confidence(),
            result.processing_time
        );
    }

    println!("{}", "-".repeat(70));
    println!("Average processing time: {:.2}s", summary.average_processing_time);
    println!(
        "Total amount across all invoices: {}",
        summary
            .total_amount_sum
            .map(format_dollars)
            .unwrap_or_else(|| "too large to sum".to_string())
    );
}

fn write_summary_csv(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "receipt_number",
        "date",
        "bill_to_name",
        "total_amount",
        "confidence",
        "processing_time",
        "warnings",
        "error",
    ])?;

    for result in results {
        let status = result.status().as_str();
        let time = format!("{:.2}", result.processing_time);

        if let Some(report) = &result.report {
            let receipt = &report.receipt;
            wtr.write_record([
                result.filename.as_str(),
                status,
                receipt.receipt_number.as_deref().unwrap_or(""),
                receipt.date.as_deref().unwrap_or(""),
                receipt.bill_to.name.as_deref().unwrap_or(""),
                &receipt
                    .total_amount
                    .map(|t| format!("{:.2}", t))
                    .unwrap_or_default(),
                &format!("{:.1}", report.extraction_confidence),
                &time,
                &report.validation_warnings.join("; "),
                "",
            ])?;
        } else {
            wtr.write_record([
                result.filename.as_str(),
                status,
                "",
                "",
                "",
                "",
                "",
                &time,
                "",
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
