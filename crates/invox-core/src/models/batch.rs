//! Batch run bookkeeping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::receipt::ExtractionReport;

/// Outcome of processing one file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    SuccessWithWarnings,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Success => "success",
            BatchStatus::SuccessWithWarnings => "success_with_warnings",
            BatchStatus::Failed => "failed",
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub filename: String,
    pub report: Option<ExtractionReport>,
    pub error: Option<String>,
    /// Wall-clock time in seconds.
    pub processing_time: f64,
}

impl FileResult {
    pub fn status(&self) -> BatchStatus {
        match &self.report {
            None => BatchStatus::Failed,
            Some(r) if r.validation_warnings.is_empty() => BatchStatus::Success,
            Some(_) => BatchStatus::SuccessWithWarnings,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.report
            .as_ref()
            .map(|r| r.extraction_confidence)
            .unwrap_or(0.0)
    }

    pub fn total_amount(&self) -> Option<Decimal> {
        self.report.as_ref().and_then(|r| r.receipt.total_amount)
    }
}

/// Per-file line of the batch summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDetail {
    pub filename: String,
    pub status: BatchStatus,
    pub confidence: f64,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    pub processing_time: f64,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

/// Aggregate report written as `_batch_summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed_at: DateTime<Utc>,
    pub total_invoices: usize,
    pub successful: usize,
    pub with_warnings: usize,
    pub failed: usize,
    /// Mean seconds per file.
    pub average_processing_time: f64,
    /// Sum of all extracted totals; `None` when it overflows.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount_sum: Option<Decimal>,
    pub details: Vec<BatchDetail>,
}

impl BatchSummary {
    /// Summarise a finished batch.
    pub fn from_results(results: &[FileResult]) -> Self {
        let count = |status: BatchStatus| results.iter().filter(|r| r.status() == status).count();

        let average_processing_time = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.processing_time).sum::<f64>() / results.len() as f64
        };

        let details = results
            .iter()
            .map(|r| BatchDetail {
                filename: r.filename.clone(),
                status: r.status(),
                confidence: r.confidence(),
                total_amount: r.total_amount(),
                processing_time: r.processing_time,
                warnings: r
                    .report
                    .as_ref()
                    .map(|rep| rep.validation_warnings.clone())
                    .unwrap_or_default(),
                error: r.error.clone(),
            })
            .collect();

        Self {
            processed_at: Utc::now(),
            total_invoices: results.len(),
            successful: count(BatchStatus::Success),
            with_warnings: count(BatchStatus::SuccessWithWarnings),
            failed: count(BatchStatus::Failed),
            average_processing_time,
            total_amount_sum: sum_totals(results),
            details,
        }
    }
}

fn sum_totals(results: &[FileResult]) -> Option<Decimal> {
    let sum = results
        .iter()
        .filter_map(|r| r.total_amount())
        .try_fold(Decimal::ZERO, |acc, total| acc.checked_add(total));
    if sum.is_none() {
        warn!("Batch total amount overflowed; leaving it out of the summary");
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::{FormatInfo, Receipt};

    fn report(total: Option<i64>, warnings: &[&str]) -> ExtractionReport {
        ExtractionReport {
            receipt: Receipt {
                total_amount: total.map(|t| Decimal::new(t, 2)),
                ..Default::default()
            },
            extraction_confidence: 60.0,
            validation_warnings: warnings.iter().map(|w| w.to_string()).collect(),
            format: FormatInfo::unknown(),
            source_file: None,
            processed_at: None,
        }
    }

    #[test]
    fn test_summary_counts_and_totals() {
        let results = vec![
            FileResult {
                filename: "a.png".to_string(),
                report: Some(report(Some(10050), &[])),
                error: None,
                processing_time: 1.0,
            },
            FileResult {
                filename: "b.png".to_string(),
                report: Some(report(Some(2000), &["sum mismatch"])),
                error: None,
                processing_time: 2.0,
            },
            FileResult {
                filename: "c.png".to_string(),
                report: None,
                error: Some("tesseract missing".to_string()),
                processing_time: 3.0,
            },
        ];

        let summary = BatchSummary::from_results(&results);

        assert_eq!(summary.total_invoices, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.with_warnings, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.average_processing_time, 2.0);
        assert_eq!(summary.total_amount_sum, Some(Decimal::new(12050, 2)));
        assert_eq!(summary.details[2].status, BatchStatus::Failed);
        assert_eq!(summary.details[2].confidence, 0.0);
        assert_eq!(summary.details[1].warnings, vec!["sum mismatch"]);
    }

    #[test]
    fn test_empty_batch() {
        let summary = BatchSummary::from_results(&[]);
        assert_eq!(summary.total_invoices, 0);
        assert_eq!(summary.average_processing_time, 0.0);
        assert_eq!(summary.total_amount_sum, Some(Decimal::ZERO));
    }

    #[test]
    fn test_total_sum_overflow_is_reported_not_fatal() {
        let huge = |name: &str| FileResult {
            filename: name.to_string(),
            report: Some(ExtractionReport {
                receipt: Receipt {
                    total_amount: Some(Decimal::MAX),
                    ..Default::default()
                },
                ..report(None, &[])
            }),
            error: None,
            processing_time: 1.0,
        };

        let summary = BatchSummary::from_results(&[huge("a.png"), huge("b.png")]);

        assert_eq!(summary.total_invoices, 2);
        assert_eq!(summary.total_amount_sum, None);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["total_amount_sum"].is_null());
    }
}
