//! Process command - extract data from a single receipt image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invox_core::invoice::recommendations;
use invox_core::invoice::rules::amounts::format_dollars;
use invox_core::models::receipt::ExtractionReport;
use invox_core::{ProcessOutcome, Processor, TesseractEngine};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image (PNG, JPEG, TIFF, BMP, WebP)
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

    /// Also print the raw OCR text
    #[arg(long)]
    raw_text: bool,

    /// Tesseract language(s), e.g. "eng+deu" (default: from config)
    #[arg(short, long)]
    lang: Option<String>,

    /// Skip the per-word confidence pass
    #[arg(long)]
    no_word_confidences: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Running OCR...");

    let mut engine = TesseractEngine::new(config.ocr.clone());
    if let Some(lang) = args.lang {
        engine = engine.with_language(lang);
    }
    if args.no_word_confidences {
        engine = engine.with_word_confidences(false);
    }

    let processor = Processor::new(config, engine);
    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || processor.process_path(&input)).await?;

    pb.finish_and_clear();
    let outcome = result?;

    let output = format_report(&outcome.report, args.format)?;
    write_output(&output, args.output.as_ref())?;

    if args.show_confidence {
        print_confidence(&outcome);
    }

    if args.raw_text {
        eprintln!();
        eprintln!("{}", style("Raw OCR text:").bold());
        eprintln!("{}", outcome.ocr_text);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Write to a file, or stdout when no path is given.
pub fn write_output(output: &str, path: Option<&PathBuf>) -> anyhow::Result<()> {
    if let Some(output_path) = path {
        fs::write(output_path, output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }
    Ok(())
}

/// Confidence, warnings, and layout detection on stderr.
pub fn print_confidence(outcome: &ProcessOutcome) {
    let report = &outcome.report;
    let band = report.confidence_band();

    eprintln!();
    eprintln!(
        "{} Extraction confidence: {:.0}% - {}",
        style("ℹ").blue(),
        report.extraction_confidence,
        band.message()
    );
    eprintln!(
        "{} Detected format: {} ({:.0}%)",
        style("ℹ").blue(),
        report.format.name,
        report.format.confidence
    );
    for indicator in &report.format.indicators {
        eprintln!("    - {}", indicator);
    }
    for line in recommendations(&report.format) {
        eprintln!("  {}", line);
    }

    if let Some(ocr) = &outcome.ocr {
        if let Some(mean) = ocr.mean_confidence {
            eprintln!("{} OCR word confidence: {:.1}%", style("ℹ").blue(), mean);
        }
        eprintln!(
            "{} OCR time: {}ms ({})",
            style("ℹ").blue(),
            ocr.processing_time_ms,
            ocr.preprocessing_steps.join(", ")
        );
    }

    eprintln!(
        "{} Extraction time: {}ms",
        style("ℹ").blue(),
        outcome.parse_time_ms
    );

    if !report.validation_warnings.is_empty() {
        eprintln!("{}", style("Validation warnings:").yellow());
        for warning in &report.validation_warnings {
            eprintln!("  - {}", warning);
        }
    }
}

pub fn format_report(report: &ExtractionReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(report: &ExtractionReport) -> anyhow::Result<String> {
    let receipt = &report.receipt;
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "receipt_number",
        "date",
        "bill_to_name",
        "bill_to_email",
        "total_amount",
        "payment_method",
        "item_count",
        "confidence",
        "format",
        "warnings",
    ])?;

    wtr.write_record([
        receipt.receipt_number.clone().unwrap_or_default(),
        receipt.date.clone().unwrap_or_default(),
        receipt.bill_to.name.clone().unwrap_or_default(),
        receipt.bill_to.email.clone().unwrap_or_default(),
        receipt
            .total_amount
            .map(|t| format!("{:.2}", t))
            .unwrap_or_default(),
        receipt.payment_method.clone().unwrap_or_default(),
        receipt.items.len().to_string(),
        format!("{:.1}", report.extraction_confidence),
        report.format.name.clone(),
        report.validation_warnings.join("; "),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ExtractionReport) -> String {
    let receipt = &report.receipt;
    let missing = "-";
    let mut output = String::new();

    output.push_str(&format!(
        "Receipt: {}\n",
        receipt.receipt_number.as_deref().unwrap_or(missing)
    ));
    output.push_str(&format!("Date: {}\n", receipt.date.as_deref().unwrap_or(missing)));
    output.push('\n');

    output.push_str("Bill To:\n");
    output.push_str(&format!(
        "  {}\n",
        receipt.bill_to.name.as_deref().unwrap_or(missing)
    ));
    output.push_str(&format!(
        "  {}\n",
        receipt.bill_to.email.as_deref().unwrap_or(missing)
    ));
    output.push('\n');

    if !receipt.items.is_empty() {
        output.push_str("Items:\n");
        for item in &receipt.items {
            output.push_str(&format!(
                "  {:<40} {:>4} x {:>10} = {:>10}\n",
                item.description,
                item.quantity,
                format_dollars(item.unit_price),
                format_dollars(item.total)
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "Total: {}\n",
        receipt
            .total_amount
            .map(format_dollars)
            .unwrap_or_else(|| missing.to_string())
    ));
    output.push_str(&format!(
        "Payment: {}\n",
        receipt.payment_method.as_deref().unwrap_or(missing)
    ));
    output.push_str(&format!(
        "\nConfidence: {:.0}% ({:?})\n",
        report.extraction_confidence,
        report.confidence_band()
    ));

    for warning in &report.validation_warnings {
        output.push_str(&format!("Warning: {}\n", warning));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use invox_core::models::receipt::{FormatInfo, LineItem, Receipt};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn report() -> ExtractionReport {
        ExtractionReport {
            receipt: Receipt {
                receipt_number: Some("1042".to_string()),
                total_amount: Some(Decimal::new(2000, 2)),
                items: vec![LineItem {
                    description: "Widget".to_string(),
                    quantity: 2,
                    unit_price: Decimal::new(1000, 2),
                    total: Decimal::new(2000, 2),
                }],
                ..Default::default()
            },
            extraction_confidence: 42.0,
            validation_warnings: vec!["Email might be invalid: x".to_string()],
            format: FormatInfo::unknown(),
            source_file: None,
            processed_at: None,
        }
    }

    #[test]
    fn test_csv_has_header_and_row() {
        let csv = format_report(&report(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("receipt_number,date"));
        assert_eq!(
            lines[1],
            "1042,,,,20.00,,1,42.0,Unknown Format,Email might be invalid: x"
        );
    }

    #[test]
    fn test_text_summary() {
        let text = format_report(&report(), OutputFormat::Text).unwrap();

        assert!(text.contains("Receipt: 1042"));
        assert!(text.contains("Total: $20.00"));
        assert!(text.contains("Confidence: 42% (Low)"));
        assert!(text.contains("Warning: Email might be invalid: x"));
    }

    #[test]
    fn test_json_is_flat() {
        let json = format_report(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["receipt_number"], "1042");
        assert_eq!(value["total_amount"], 20.0);
    }
}
