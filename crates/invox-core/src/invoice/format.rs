//! Receipt layout detection.
//!
//! Scores the OCR text against the indicator patterns of each known layout so
//! a low extraction confidence can be explained to the user.

use regex::Regex;
use tracing::debug;

use crate::models::receipt::{FormatInfo, TemplateKind};

use super::rules::patterns::{TEMPLATE_A_INDICATORS, TEMPLATE_B_INDICATORS};

/// Points per matched Template A indicator.
const TEMPLATE_A_WEIGHT: f64 = 20.0;
/// Points per matched Template B indicator.
const TEMPLATE_B_WEIGHT: f64 = 12.5;
/// Best score below this is reported as an unknown layout.
const MIN_DETECTION_SCORE: f64 = 30.0;

fn score(kind: TemplateKind, text: &str, indicators: &[(Regex, &'static str)], weight: f64) -> FormatInfo {
    let mut info = FormatInfo::new(kind);
    for (pattern, label) in indicators {
        if pattern.is_match(text) {
            info.confidence += weight;
            info.indicators.push(label.to_string());
        }
    }
    info
}

/// Detect which layout the OCR text comes from.
pub fn detect_format(text: &str) -> FormatInfo {
    let template_a = score(TemplateKind::TemplateA, text, &TEMPLATE_A_INDICATORS, TEMPLATE_A_WEIGHT);
    let template_b = score(TemplateKind::TemplateB, text, &TEMPLATE_B_INDICATORS, TEMPLATE_B_WEIGHT);

    debug!(
        "Format scores: template A {:.1} ({:?}), template B {:.1} ({:?})",
        template_a.confidence, template_a.indicators, template_b.confidence, template_b.indicators
    );

    // Template A wins ties.
    let best = if template_b.confidence > template_a.confidence {
        template_b
    } else {
        template_a
    };

    if best.confidence < MIN_DETECTION_SCORE {
        FormatInfo::unknown()
    } else {
        best
    }
}

/// Advice shown next to a detection result.
pub fn recommendations(info: &FormatInfo) -> Vec<String> {
    let lines: &[&str] = match info.kind {
        TemplateKind::TemplateA => &[
            "This format is fully supported!",
            "Expected accuracy: 95-100%",
        ],
        TemplateKind::TemplateB => &[
            "This format has limited support",
            "Recommendation: Add Template B patterns or use ML-based extraction",
            "Current accuracy: 10-20% (basic fields only)",
        ],
        TemplateKind::Unknown => &[
            "Format not recognized",
            "Try using a clearer image or different format",
            "Or contact support to add this format",
        ],
    };
    lines.iter().map(|s| s.to_string()).collect()
}
