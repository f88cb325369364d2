//! Correction of common OCR misreads in item lines.
//!
//! Tesseract regularly turns a quantity of `1` into `J`, `l` or `I`, and a
//! zero inside a price into the letter `O`. Both are only fixed on lines that
//! carry a `$`, where a number is expected.

use std::borrow::Cow;

use regex::NoExpand;

use super::patterns::MISREAD_ONE;

/// Correct OCR misreads line by line. Line structure is preserved.
pub fn normalize_ocr_errors(text: &str) -> String {
    text.split('\n')
        .map(correct_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn correct_line(line: &str) -> Cow<'_, str> {
    if !line.contains('$') || line.starts_with("Total") {
        return Cow::Borrowed(line);
    }

    let fixed = MISREAD_ONE.replace_all(line, NoExpand(" 1 $"));

    // The first segment is the description and may legitimately contain 'O'.
    let mut segments = fixed.split('$');
    let mut out = String::with_capacity(fixed.len());
    if let Some(description) = segments.next() {
        out.push_str(description);
    }
    for price in segments {
        out.push('$');
        out.push_str(&price.replace('O', "0"));
    }

    Cow::Owned(out)
}
