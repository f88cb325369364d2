//! Tesseract OCR engine driven through its command-line interface.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};
use std::time::Instant;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrEngine, OcrOutput, OcrWord};

/// Number of columns in a Tesseract TSV row (the last, `text`, may be absent).
const TSV_COLUMNS: usize = 12;

/// OCR engine that shells out to the `tesseract` executable.
pub struct TesseractEngine {
    config: OcrConfig,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Override the executable.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.config.tesseract_cmd = command.into();
        self
    }

    /// Set language(s), e.g. "eng+deu".
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Enable or disable the per-word confidence pass.
    pub fn with_word_confidences(mut self, enabled: bool) -> Self {
        self.config.word_confidences = enabled;
        self
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Run `tesseract --version` and return its first line.
    pub fn version(&self) -> Result<String, OcrError> {
        let output = self.run(Command::new(&self.config.tesseract_cmd).arg("--version"))?;
        // Older releases print the version on stderr.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let version = stdout
            .lines()
            .chain(stderr.lines())
            .find(|l| !l.trim().is_empty())
            .unwrap_or("tesseract")
            .trim()
            .to_string();
        Ok(version)
    }

    fn base_command(&self, image_path: &Path) -> Command {
        let mut cmd = Command::new(&self.config.tesseract_cmd);
        cmd.arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.page_segmentation_mode.to_string());
        if let Some(dir) = &self.config.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        if let Some(dpi) = self.config.dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }
        cmd
    }

    fn run(&self, cmd: &mut Command) -> Result<Output, OcrError> {
        debug!("Running {:?}", cmd);
        let output = cmd.output().map_err(|e| OcrError::EngineUnavailable {
            command: self.config.tesseract_cmd.clone(),
            reason: if e.kind() == ErrorKind::NotFound {
                "executable not found; install Tesseract or set INVOX_TESSERACT".to_string()
            } else {
                e.to_string()
            },
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(OcrError::Recognition(if stderr.is_empty() {
                format!("tesseract exited with {}", output.status)
            } else {
                stderr
            }));
        }

        Ok(output)
    }

    fn recognize_words(&self, image_path: &Path) -> Result<Vec<OcrWord>, OcrError> {
        let output = self.run(self.base_command(image_path).arg("tsv"))?;
        parse_tsv(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(OcrConfig::default())
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("empty image {}x{}", width, height)));
        }

        let file = tempfile::Builder::new()
            .prefix("invox-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Preprocessing(format!("cannot create temp file: {}", e)))?;
        image
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Preprocessing(format!("cannot write temp image: {}", e)))?;

        let output = self.run(&mut self.base_command(file.path()))?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();

        let mut result = OcrOutput::from_text(text, (width, height));

        if self.config.word_confidences {
            match self.recognize_words(file.path()) {
                Ok(words) => result = result.with_words(words),
                Err(e) => warn!("Word confidences unavailable: {}", e),
            }
        }

        result.processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Tesseract recognized {} characters in {}ms",
            result.text.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

/// Parse Tesseract TSV output into words.
///
/// Only word rows with text and a positive confidence are kept; structural
/// rows (page, block, paragraph, line) carry a confidence of -1.
pub fn parse_tsv(tsv: &str) -> Result<Vec<OcrWord>, OcrError> {
    let mut words = Vec::new();

    for (index, line) in tsv.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() || line.starts_with("level") {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_COLUMNS - 1 {
            return Err(OcrError::MalformedTsv {
                line: line_no,
                reason: format!("expected {} columns, found {}", TSV_COLUMNS, fields.len()),
            });
        }

        let number = |i: usize, name: &str| -> Result<u32, OcrError> {
            fields[i].trim().parse().map_err(|_| OcrError::MalformedTsv {
                line: line_no,
                reason: format!("invalid {} '{}'", name, fields[i]),
            })
        };

        let confidence: f32 = fields[10].trim().parse().map_err(|_| OcrError::MalformedTsv {
            line: line_no,
            reason: format!("invalid conf '{}'", fields[10]),
        })?;
        let text = fields.get(11).map(|t| t.trim()).unwrap_or("");

        if text.is_empty() || confidence <= 0.0 {
            continue;
        }

        words.push(OcrWord {
            text: text.to_string(),
            confidence,
            left: number(6, "left")?,
            top: number(7, "top")?,
            width: number(8, "width")?,
            height: number(9, "height")?,
        });
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
4\t1\t1\t1\t1\t0\t40\t30\t300\t20\t-1\t
5\t1\t1\t1\t1\t1\t40\t30\t120\t20\t96.5\tReceipt
5\t1\t1\t1\t1\t2\t170\t30\t80\t20\t91.25\t#1042
5\t1\t1\t1\t1\t3\t260\t30\t10\t20\t0\t~
5\t1\t1\t1\t1\t4\t280\t30\t10\t20\t55\t
";

    #[test]
    fn test_parse_tsv_keeps_confident_words() {
        let words = parse_tsv(TSV).unwrap();

        assert_eq!(words.len(), 2);
        assert_eq!(
            words[0],
            OcrWord {
                text: "Receipt".to_string(),
                confidence: 96.5,
                left: 40,
                top: 30,
                width: 120,
                height: 20,
            }
        );
        assert_eq!(words[1].text, "#1042");
    }

    #[test]
    fn test_parse_tsv_rejects_short_rows() {
        let err = parse_tsv("5\t1\t1\n").unwrap_err();
        assert!(matches!(err, OcrError::MalformedTsv { line: 1, .. }));
    }

    #[test]
    fn test_parse_tsv_rejects_bad_numbers() {
        let err = parse_tsv("5\t1\t1\t1\t1\t1\tx\t30\t120\t20\t96\tword\n").unwrap_err();
        assert!(matches!(err, OcrError::MalformedTsv { .. }));
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let engine = TesseractEngine::default().with_command("invox-no-such-tesseract");
        let image = DynamicImage::new_luma8(4, 4);

        let err = engine.recognize(&image).unwrap_err();
        assert!(matches!(err, OcrError::EngineUnavailable { .. }));
    }

    #[test]
    fn test_empty_image_rejected() {
        let err = TesseractEngine::default()
            .recognize(&DynamicImage::new_luma8(0, 0))
            .unwrap_err();
        assert!(matches!(err, OcrError::InvalidImage(_)));
    }

    #[test]
    fn test_language_override_reaches_command() {
        let engine = TesseractEngine::default()
            .with_language("eng+deu")
            .with_word_confidences(false);
        assert!(!engine.config().word_confidences);

        let cmd = engine.base_command(Path::new("page.png"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[..4], ["page.png", "stdout", "-l", "eng+deu"]);
    }
}
